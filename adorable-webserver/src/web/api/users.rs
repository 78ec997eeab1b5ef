use std::time::Duration;

use rocket::{
    data::{Data, ToByteUnit},
    http::ContentType,
};

use super::*;
use adorable_core::security::ApiKeyStore;

/// Lifetime of tokens issued for short-lived clients.
const TEMPORARY_TOKEN_TTL: Duration = Duration::from_secs(60 * 60);

#[post("/users/register", format = "application/json", data = "<new_user>")]
pub fn post_register(
    _throttle: AuthThrottle,
    connections: sqlite::Connections,
    notify: &State<Notify>,
    cfg: &State<Cfg>,
    new_user: JsonResult<json::RegisterUser>,
) -> Result<json::CurrentUser> {
    let new_user = from_json::new_user(new_user?.into_inner());
    let user = flows::register_user(
        &connections,
        &*notify.0,
        new_user,
        &cfg.confirm_email_url,
    )?;
    let view = usecases::ProfileView {
        user,
        followers_count: 0,
        following_count: 0,
    };
    Ok(Json(to_json::current_user(view)))
}

#[post("/users/login", format = "application/json", data = "<login>")]
pub fn post_login(
    _throttle: AuthThrottle,
    connections: sqlite::Connections,
    login: JsonResult<json::Credentials>,
    jwt_state: &State<jwt::JwtState>,
) -> Result<json::JwtToken> {
    let login = login?.into_inner();
    let user = {
        let credentials = usecases::Credentials {
            email: &login.email.parse()?,
            password: &login.password,
        };
        usecases::login_with_email(&connections.shared()?, &credentials).inspect_err(|err| {
            debug!("Login with email '{}' failed: {}", login.email, err);
        })?
    };
    let token = jwt_state.generate_token(user.email.as_str())?;
    Ok(Json(json::JwtToken { token }))
}

#[post("/users/logout")]
pub fn post_logout(
    auth: Auth,
    jwt_state: &State<jwt::JwtState>,
    api_keys: &State<ApiKeyStore>,
) -> StatusResult {
    for bearer in auth.bearer_tokens() {
        if bearer.starts_with("tmp_") {
            api_keys.revoke_temporary_token(bearer)?;
        } else {
            jwt_state.blacklist_token(bearer.to_owned());
        }
    }
    Ok(Status::NoContent)
}

#[post("/users/confirm-email", format = "application/json", data = "<token>")]
pub fn post_confirm_email(
    connections: sqlite::Connections,
    token: JsonResult<json::ConfirmEmailAddress>,
) -> StatusResult {
    let token = token?.into_inner().token;
    flows::confirm_email_address(&connections, &token)?;
    Ok(Status::NoContent)
}

#[post(
    "/users/reset-password/request",
    format = "application/json",
    data = "<data>"
)]
pub fn post_request_password_reset(
    _throttle: AuthThrottle,
    connections: sqlite::Connections,
    notify: &State<Notify>,
    data: JsonResult<json::RequestPasswordReset>,
) -> StatusResult {
    let req = data?.into_inner();
    flows::reset_password_request(&connections, &*notify.0, &req.email)?;
    Ok(Status::NoContent)
}

#[post("/users/reset-password", format = "application/json", data = "<data>")]
pub fn post_reset_password(
    _throttle: AuthThrottle,
    connections: sqlite::Connections,
    data: JsonResult<json::ResetPassword>,
) -> StatusResult {
    let req = data?.into_inner();
    flows::reset_password_with_token(&connections, &req.token, &req.new_password)?;
    Ok(Status::NoContent)
}

#[get("/users/me")]
pub fn get_current_user(
    connections: sqlite::Connections,
    account: Account,
) -> Result<json::CurrentUser> {
    let view = usecases::get_own_profile(&connections.shared()?, account.id())?;
    Ok(Json(to_json::current_user(view)))
}

#[put("/users/me", format = "application/json", data = "<update>")]
pub fn put_current_user(
    connections: sqlite::Connections,
    account: Account,
    update: JsonResult<json::UpdateProfile>,
) -> Result<json::CurrentUser> {
    let update = from_json::update_profile(update?.into_inner());
    let view = connections.transaction(|db| {
        usecases::update_profile(db, account.id(), update, Timestamp::now())?;
        usecases::get_own_profile(db, account.id())
    })?;
    Ok(Json(to_json::current_user(view)))
}

#[delete("/users/me")]
pub fn delete_current_user(connections: sqlite::Connections, account: Account) -> StatusResult {
    connections.transaction(|db| usecases::delete_own_account(db, account.id()))?;
    Ok(Status::NoContent)
}

#[put("/users/me/avatar?<name>", data = "<data>")]
pub async fn put_avatar(
    connections: sqlite::Connections,
    account: Account,
    storage: &State<Storage>,
    dispatcher: &State<EventDispatcher>,
    content_type: Option<&ContentType>,
    name: Option<&str>,
    data: Data<'_>,
) -> Result<json::File> {
    let content = data.open(File::MAX_SIZE.bytes()).into_bytes().await?;
    if !content.is_complete() {
        return Err(usecases::Error::FileSize.into());
    }
    let avatar = flows::NewAvatar {
        original_name: name.unwrap_or("avatar").to_owned(),
        mime_type: content_type
            .map(ToString::to_string)
            .unwrap_or_else(|| "application/octet-stream".into()),
        content: &content,
    };
    let file = flows::upload_avatar(&connections, &*storage.0, dispatcher, account.id(), avatar)?;
    Ok(Json(to_json::file(file, &*storage.0)))
}

#[post("/users/me/devices", format = "application/json", data = "<token>")]
pub fn post_device_token(
    connections: sqlite::Connections,
    account: Account,
    token: JsonResult<json::NewDeviceToken>,
) -> StatusResult {
    let token = token?.into_inner().token;
    connections.transaction(|db| {
        usecases::register_device_token(db, account.id(), &token, Timestamp::now())
    })?;
    Ok(Status::Created)
}

#[delete("/users/me/devices/<token>")]
pub fn delete_device_token(
    connections: sqlite::Connections,
    account: Account,
    token: &str,
) -> StatusResult {
    connections.transaction(|db| usecases::remove_device_token(db, account.id(), token))?;
    Ok(Status::NoContent)
}

#[post("/users/me/temporary-token")]
pub fn post_temporary_token(
    account: Account,
    api_keys: &State<ApiKeyStore>,
) -> Result<json::JwtToken> {
    let token =
        api_keys.create_temporary_token(account.user().email.as_str(), TEMPORARY_TOKEN_TTL)?;
    Ok(Json(json::JwtToken { token }))
}

#[get("/users/<id>")]
pub fn get_user(
    connections: sqlite::Connections,
    account: Account,
    id: &str,
) -> Result<json::User> {
    let view = usecases::get_profile(&connections.shared()?, account.user(), &id.into())?;
    Ok(Json(to_json::user(view)))
}

#[get("/users?<q>&<limit>")]
pub fn search_users(
    connections: sqlite::Connections,
    account: Account,
    q: Option<&str>,
    limit: Option<u32>,
) -> Result<Vec<json::User>> {
    let db = connections.shared()?;
    let users = usecases::search_users(&db, account.user(), q.unwrap_or_default(), limit)?;
    let users = users
        .into_iter()
        .map(|user| usecases::profile_view(&db, user).map(to_json::user))
        .collect::<usecases::Result<_>>()?;
    Ok(Json(users))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::{
        api::tests::prelude::*,
        tests::{login, register_user},
    };

    #[test]
    fn register_confirm_and_login() {
        let (client, db, notify) = setup_with_notify();
        let res = client
            .post("/users/register")
            .header(ContentType::JSON)
            .body(r#"{"username":"alice","email":"alice@example.com","password":"secret123"}"#)
            .dispatch();
        assert_eq!(res.status(), Status::Ok);
        test_json(&res);
        let user: json::CurrentUser = res.into_json().unwrap();
        assert!(!user.email_confirmed);
        assert_eq!(json::UserRole::User, user.role);

        // Not confirmed yet
        let res = client
            .post("/users/login")
            .header(ContentType::JSON)
            .body(r#"{"email":"alice@example.com","password":"secret123"}"#)
            .dispatch();
        assert_eq!(res.status(), Status::Forbidden);

        let url = notify.last_confirmation_url().unwrap();
        let token = url.split("?token=").nth(1).unwrap();
        let res = client
            .post("/users/confirm-email")
            .header(ContentType::JSON)
            .body(format!(r#"{{"token":"{token}"}}"#))
            .dispatch();
        assert_eq!(res.status(), Status::NoContent);
        assert!(
            db.shared()
                .unwrap()
                .get_user_by_email(&"alice@example.com".parse().unwrap())
                .unwrap()
                .email_confirmed
        );

        let token = login(&client, "alice@example.com", "secret123");
        let res = client
            .get("/users/me")
            .header(bearer(&token))
            .dispatch();
        assert_eq!(res.status(), Status::Ok);
        let me: json::CurrentUser = res.into_json().unwrap();
        assert_eq!("alice", me.username);
        assert!(me.email_confirmed);
    }

    #[test]
    fn reject_duplicate_registration() {
        let (client, db) = setup();
        register_user(&db, "bob", "bob@example.com", "secret123");
        let res = client
            .post("/users/register")
            .header(ContentType::JSON)
            .body(r#"{"username":"bob2","email":"bob@example.com","password":"secret123"}"#)
            .dispatch();
        assert_eq!(res.status(), Status::BadRequest);
        let err: json::Error = res.into_json().unwrap();
        assert_eq!(json::ErrorCode::ValidationError, err.error.code);
    }

    #[test]
    fn login_with_wrong_password() {
        let (client, db) = setup();
        register_user(&db, "alice", "alice@example.com", "secret123");
        let res = client
            .post("/users/login")
            .header(ContentType::JSON)
            .body(r#"{"email":"alice@example.com","password":"wrong-password"}"#)
            .dispatch();
        assert_eq!(res.status(), Status::Unauthorized);
        let err: json::Error = res.into_json().unwrap();
        assert_eq!(json::ErrorCode::AuthenticationError, err.error.code);
        assert_eq!(401, err.error.status_code);
    }

    #[test]
    fn reset_password() {
        let (client, db, notify) = setup_with_notify();
        register_user(&db, "alice", "alice@example.com", "secret123");

        let res = client
            .post("/users/reset-password/request")
            .header(ContentType::JSON)
            .body(r#"{"email":"alice@example.com"}"#)
            .dispatch();
        assert_eq!(res.status(), Status::NoContent);

        // Unknown addresses are not revealed
        let res = client
            .post("/users/reset-password/request")
            .header(ContentType::JSON)
            .body(r#"{"email":"nobody@example.com"}"#)
            .dispatch();
        assert_eq!(res.status(), Status::NoContent);

        let token = notify.last_reset_nonce().unwrap().encode_to_string();
        let res = client
            .post("/users/reset-password")
            .header(ContentType::JSON)
            .body(format!(
                r#"{{"token":"{token}","new_password":"new-secret"}}"#
            ))
            .dispatch();
        assert_eq!(res.status(), Status::NoContent);

        let res = client
            .post("/users/login")
            .header(ContentType::JSON)
            .body(r#"{"email":"alice@example.com","password":"secret123"}"#)
            .dispatch();
        assert_eq!(res.status(), Status::Unauthorized);
        login(&client, "alice@example.com", "new-secret");
    }

    #[test]
    fn logout_invalidates_the_token() {
        let (client, db) = setup();
        register_user(&db, "alice", "alice@example.com", "secret123");
        let token = login(&client, "alice@example.com", "secret123");
        let res = client
            .post("/users/logout")
            .header(bearer(&token))
            .dispatch();
        assert_eq!(res.status(), Status::NoContent);
        let res = client
            .get("/users/me")
            .header(bearer(&token))
            .dispatch();
        assert_eq!(res.status(), Status::Unauthorized);
        let err: json::Error = res.into_json().unwrap();
        assert_eq!(json::ErrorCode::AuthenticationError, err.error.code);
    }

    #[test]
    fn update_profile() {
        let (client, db) = setup();
        register_user(&db, "alice", "alice@example.com", "secret123");
        let token = login(&client, "alice@example.com", "secret123");
        let res = client
            .put("/users/me")
            .header(ContentType::JSON)
            .header(bearer(&token))
            .body(r#"{"bio":"Coffee lover","profile_public":false,"id":"ignored"}"#)
            .dispatch();
        assert_eq!(res.status(), Status::Ok);
        let me: json::CurrentUser = res.into_json().unwrap();
        assert_eq!(Some("Coffee lover".to_string()), me.bio);
        assert!(!me.profile_public);
        assert_ne!("ignored", me.id);
    }

    #[test]
    fn private_profiles_are_hidden() {
        let (client, db) = setup();
        let alice = register_user(&db, "alice", "alice@example.com", "secret123");
        register_user(&db, "bob", "bob@example.com", "secret123");
        let alice_token = login(&client, "alice@example.com", "secret123");
        let bob_token = login(&client, "bob@example.com", "secret123");

        let res = client
            .get(format!("/users/{}", alice.id))
            .header(bearer(&bob_token))
            .dispatch();
        assert_eq!(res.status(), Status::Ok);

        client
            .put("/users/me")
            .header(ContentType::JSON)
            .header(bearer(&alice_token))
            .body(r#"{"profile_public":false}"#)
            .dispatch();

        let res = client
            .get(format!("/users/{}", alice.id))
            .header(bearer(&bob_token))
            .dispatch();
        assert_eq!(res.status(), Status::Forbidden);

        let res = client
            .get("/users?q=ali")
            .header(bearer(&bob_token))
            .dispatch();
        let users: Vec<json::User> = res.into_json().unwrap();
        assert!(users.is_empty());
    }

    #[test]
    fn temporary_token_authenticates() {
        let (client, db) = setup();
        register_user(&db, "alice", "alice@example.com", "secret123");
        let token = login(&client, "alice@example.com", "secret123");
        let res = client
            .post("/users/me/temporary-token")
            .header(bearer(&token))
            .dispatch();
        assert_eq!(res.status(), Status::Ok);
        let tmp: json::JwtToken = res.into_json().unwrap();
        assert!(tmp.token.starts_with("tmp_"));
        let res = client
            .get("/users/me")
            .header(bearer(&tmp.token))
            .dispatch();
        assert_eq!(res.status(), Status::Ok);
    }

    #[test]
    fn register_and_remove_device_tokens() {
        let (client, db) = setup();
        let alice = register_user(&db, "alice", "alice@example.com", "secret123");
        let token = login(&client, "alice@example.com", "secret123");
        let res = client
            .post("/users/me/devices")
            .header(ContentType::JSON)
            .header(bearer(&token))
            .body(r#"{"token":"device-1"}"#)
            .dispatch();
        assert_eq!(res.status(), Status::Created);
        assert_eq!(
            vec!["device-1".to_string()],
            db.shared()
                .unwrap()
                .load_device_tokens(&[alice.id.clone()])
                .unwrap()
                .into_iter()
                .map(|t| t.token)
                .collect::<Vec<_>>()
        );
        let res = client
            .delete("/users/me/devices/device-1")
            .header(bearer(&token))
            .dispatch();
        assert_eq!(res.status(), Status::NoContent);
    }

    #[test]
    fn upload_avatar_image() {
        let (client, db) = setup();
        register_user(&db, "alice", "alice@example.com", "secret123");
        let token = login(&client, "alice@example.com", "secret123");
        let res = client
            .put("/users/me/avatar?name=me.png")
            .header(ContentType::PNG)
            .header(bearer(&token))
            .body(&[0x89, b'P', b'N', b'G'])
            .dispatch();
        assert_eq!(res.status(), Status::Ok);
        let file: json::File = res.into_json().unwrap();
        assert_eq!(json::FileType::Image, file.file_type);
        assert_eq!("me.png", file.original_name);

        let res = client
            .put("/users/me/avatar")
            .header(ContentType::Plain)
            .header(bearer(&token))
            .body("no image")
            .dispatch();
        assert_eq!(res.status(), Status::BadRequest);
    }

    #[test]
    fn require_authentication() {
        let (client, _) = setup();
        let res = client.get("/users/me").dispatch();
        assert_eq!(res.status(), Status::Unauthorized);
        test_json(&res);
        let err: json::Error = res.into_json().unwrap();
        assert_eq!(json::ErrorCode::AuthenticationError, err.error.code);
    }
}
