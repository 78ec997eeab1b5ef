use adorable_application::health::HealthChecker;
use adorable_core::security::{ApiKeyStore, SignatureError};

use super::*;

/// Lifetime of a generated API key in seconds.
const API_KEY_EXPIRES_IN: u64 = 24 * 60 * 60;

#[post("/signed/api-keys", data = "<options>")]
pub fn post_api_key(
    staff: Staff,
    keys: &State<ApiKeyStore>,
    options: Option<Json<json::NewApiKey>>,
) -> Result<json::ApiKeyPair> {
    let json::NewApiKey { allowed_ips } = options.map(Json::into_inner).unwrap_or_default();
    let credentials = keys.generate_api_key(allowed_ips)?;
    info!(
        "{} generated API key {}",
        staff.user().username,
        credentials.api_key
    );
    Ok(Json(to_json::api_key_pair(credentials, API_KEY_EXPIRES_IN)))
}

#[post("/signed/api-keys/<key>/rotate")]
pub fn post_rotate_api_key(
    _staff: Staff,
    keys: &State<ApiKeyStore>,
    key: &str,
) -> Result<json::ApiKeyPair> {
    let credentials = keys.rotate_api_key(key).map_err(|err| match err {
        SignatureError::UnknownKey => ApiError::not_found(err.to_string()),
        SignatureError::Cache(err) => err.into(),
        err => ApiError::invalid(err.to_string()),
    })?;
    Ok(Json(to_json::api_key_pair(credentials, API_KEY_EXPIRES_IN)))
}

#[get("/signed/places?<q>")]
pub fn get_places(
    signed: Signed,
    connections: sqlite::Connections,
    index: &State<SearchIndex>,
    q: Option<String>,
) -> Result<Vec<json::Place>> {
    debug!("Signed place search with API key {}", signed.api_key());
    let query = PlaceQuery {
        text: q.filter(|q| !q.trim().is_empty()),
        ..Default::default()
    };
    let places = usecases::search_places(&connections.shared()?, &*index.0, query)?;
    Ok(Json(places.into_iter().map(Into::into).collect()))
}

#[get("/signed/health")]
pub fn get_health(_signed: Signed, health: &State<HealthChecker>) -> Json<json::HealthReport> {
    Json(to_json::health_report(health.check_all()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::{
        api::tests::prelude::*,
        guards::{HEADER_API_KEY, HEADER_SIGNATURE, HEADER_TIMESTAMP},
        tests::{login, register_staff, register_user},
    };
    use adorable_core::security::sign;
    use rocket::local::blocking::LocalRequest;

    fn new_key_pair(client: &Client, token: &str) -> json::ApiKeyPair {
        let res = client
            .post("/signed/api-keys")
            .header(bearer(token))
            .dispatch();
        assert_eq!(res.status(), Status::Ok);
        res.into_json().unwrap()
    }

    fn signed<'c>(
        req: LocalRequest<'c>,
        pair: &json::ApiKeyPair,
        path: &str,
        params: &[(String, String)],
        timestamp: i64,
    ) -> LocalRequest<'c> {
        let signature = sign(&pair.api_secret, "GET", path, params, timestamp);
        req.header(Header::new(HEADER_API_KEY, pair.api_key.clone()))
            .header(Header::new(HEADER_TIMESTAMP, timestamp.to_string()))
            .header(Header::new(HEADER_SIGNATURE, signature))
    }

    #[test]
    fn only_staff_creates_api_keys() {
        let (client, db) = setup();
        register_user(&db, "alice", "alice@example.com", "secret123");
        let token = login(&client, "alice@example.com", "secret123");
        let res = client
            .post("/signed/api-keys")
            .header(bearer(&token))
            .dispatch();
        assert_eq!(res.status(), Status::Forbidden);
    }

    #[test]
    fn access_with_signed_requests() {
        let (client, db) = setup();
        register_staff(&db, "carol", "carol@example.com", "secret123");
        let token = login(&client, "carol@example.com", "secret123");
        let pair = new_key_pair(&client, &token);
        assert!(pair.api_key.starts_with("ak_"));
        assert!(pair.api_secret.starts_with("as_"));
        assert_eq!(86_400, pair.expires_in);
        let now = Timestamp::now().as_secs();

        let res = signed(client.get("/signed/health"), &pair, "/signed/health", &[], now).dispatch();
        assert_eq!(res.status(), Status::Ok);

        let params = [("q".to_string(), "museum".to_string())];
        let res = signed(
            client.get("/signed/places?q=museum"),
            &pair,
            "/signed/places",
            &params,
            now,
        )
        .dispatch();
        assert_eq!(res.status(), Status::Ok);
        let places: Vec<json::Place> = res.into_json().unwrap();
        assert!(places.is_empty());

        // The parameters are part of the signature
        let res = signed(
            client.get("/signed/places?q=other"),
            &pair,
            "/signed/places",
            &params,
            now,
        )
        .dispatch();
        assert_eq!(res.status(), Status::Unauthorized);

        let res = signed(
            client.get("/signed/health"),
            &pair,
            "/signed/health",
            &[],
            now - 301,
        )
        .dispatch();
        assert_eq!(res.status(), Status::Unauthorized);

        let res = client.get("/signed/health").dispatch();
        assert_eq!(res.status(), Status::Unauthorized);
        let err: json::Error = res.into_json().unwrap();
        assert_eq!(json::ErrorCode::AuthenticationError, err.error.code);
    }

    #[test]
    fn rotated_keys_keep_working_for_a_while() {
        let (client, db) = setup();
        register_staff(&db, "carol", "carol@example.com", "secret123");
        let token = login(&client, "carol@example.com", "secret123");
        let old = new_key_pair(&client, &token);

        let res = client
            .post(format!("/signed/api-keys/{}/rotate", old.api_key))
            .header(bearer(&token))
            .dispatch();
        assert_eq!(res.status(), Status::Ok);
        let new: json::ApiKeyPair = res.into_json().unwrap();
        assert_ne!(old.api_key, new.api_key);

        let now = Timestamp::now().as_secs();
        for pair in [&old, &new] {
            let res =
                signed(client.get("/signed/health"), pair, "/signed/health", &[], now).dispatch();
            assert_eq!(res.status(), Status::Ok);
        }

        let res = client
            .post("/signed/api-keys/ak_unknown/rotate")
            .header(bearer(&token))
            .dispatch();
        assert_eq!(res.status(), Status::NotFound);
    }
}
