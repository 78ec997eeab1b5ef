use std::{sync::Arc, time::Duration};

use rocket::{
    self,
    http::Status,
    outcome::try_outcome,
    request::{FromRequest, Outcome, Request},
    State,
};

use crate::{
    core::{prelude::*, usecases},
    web::{jwt, sqlite},
};
use adorable_application::prelude as flows;
use adorable_core::{
    gateways::{identity::IdentityProvider, notify::NotificationGateway, storage::FileStorage},
    rate_limit::{Decision, RateLimiters},
    security::{ApiKeyStore, SignedRequest},
};

pub const HEADER_API_KEY: &str = "X-Api-Key";
pub const HEADER_TIMESTAMP: &str = "X-Timestamp";
pub const HEADER_SIGNATURE: &str = "X-Signature";

/// Why a guard rejected the request, picked up by the catchers.
#[derive(Debug, Default)]
pub struct GuardFailure {
    pub message: Option<String>,
    pub retry_after: Option<Duration>,
}

fn fail<T>(request: &Request<'_>, status: Status, failure: GuardFailure) -> Outcome<T, ()> {
    request.local_cache(|| failure);
    Outcome::Error((status, ()))
}

fn get_bearer_token(auth_header_val: &str) -> Option<&str> {
    let x: Vec<_> = auth_header_val.split(' ').collect();
    if x.len() == 2 && x[0] == "Bearer" {
        Some(x[1])
    } else {
        None
    }
}

fn client_identifier(request: &Request<'_>) -> String {
    request
        .client_ip()
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| "unknown".to_owned())
}

fn denied<T>(request: &Request<'_>, retry_after: Duration) -> Outcome<T, ()> {
    fail(
        request,
        Status::TooManyRequests,
        GuardFailure {
            message: Some("Rate limit exceeded".into()),
            retry_after: Some(retry_after),
        },
    )
}

/// The per IP limit that applies to every API request.
///
/// The request is only counted once, no matter how
/// many guards ask for it.
pub struct Throttle;

#[derive(Clone, Copy)]
struct IpDecision(Decision);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Throttle {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let limiters = try_outcome!(request.guard::<&State<RateLimiters>>().await);
        let IpDecision(decision) =
            *request.local_cache(|| IpDecision(limiters.ip.check(&client_identifier(request))));
        match decision {
            Decision::Denied { retry_after } => denied(request, retry_after),
            Decision::Allowed { .. } => Outcome::Success(Throttle),
        }
    }
}

/// Stricter limit for login, registration and password resets.
pub struct AuthThrottle;

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthThrottle {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        try_outcome!(request.guard::<Throttle>().await);
        let limiters = try_outcome!(request.guard::<&State<RateLimiters>>().await);
        match limiters.auth.check(&client_identifier(request)) {
            Decision::Denied { retry_after } => denied(request, retry_after),
            Decision::Allowed { .. } => Outcome::Success(AuthThrottle),
        }
    }
}

#[derive(Debug)]
pub struct Auth {
    bearer_tokens: Vec<String>,
    account_email: Option<String>,
}

impl Auth {
    pub fn account_email(&self) -> Option<&str> {
        self.account_email.as_deref()
    }

    pub fn bearer_tokens(&self) -> &[String] {
        &self.bearer_tokens
    }

    fn bearer_tokens_from_header(request: &Request) -> Vec<String> {
        request
            .headers()
            .get("Authorization")
            .filter_map(get_bearer_token)
            .map(ToOwned::to_owned)
            .collect()
    }

    async fn account_email_from_jwt_in_header(
        request: &Request<'_>,
        bearer_tokens: &[String],
    ) -> Option<String> {
        let jwt_state = request.guard::<&State<jwt::JwtState>>().await.succeeded()?;
        bearer_tokens
            .iter()
            .find_map(|token| jwt_state.validate_token_and_get_email(token).ok())
    }

    async fn account_email_from_temporary_token(
        request: &Request<'_>,
        bearer_tokens: &[String],
    ) -> Option<String> {
        let keys = request.guard::<&State<ApiKeyStore>>().await.succeeded()?;
        bearer_tokens.iter().find_map(|token| {
            keys.validate_temporary_token(token)
                .map_err(|err| warn!("Unable to validate temporary token: {err}"))
                .ok()
                .flatten()
        })
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Auth {
    type Error = ();
    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let bearer_tokens = Self::bearer_tokens_from_header(request);
        let mut account_email = Self::account_email_from_jwt_in_header(request, &bearer_tokens).await;
        if account_email.is_none() {
            account_email = Self::account_email_from_temporary_token(request, &bearer_tokens).await;
        }
        Outcome::Success(Self {
            bearer_tokens,
            account_email,
        })
    }
}

/// Verifies the tokens of the external identity provider
/// on a blocking thread, creating the local account on demand.
async fn user_from_identity_provider(
    connections: &sqlite::Connections,
    identity: &Identity,
    bearer_tokens: &[String],
) -> Option<User> {
    let provider = identity.0.clone()?;
    for token in bearer_tokens {
        let provider = Arc::clone(&provider);
        let connections = connections.clone();
        let token = token.clone();
        let result = rocket::tokio::task::spawn_blocking(move || {
            flows::sign_in_with_identity(&connections, &*provider, &token)
        })
        .await;
        match result {
            Ok(Ok(Some(user))) => return Some(user),
            Ok(Ok(None)) => {}
            Ok(Err(err)) => warn!("Unable to sign in with identity provider: {err}"),
            Err(err) => error!("Identity verification aborted: {err}"),
        }
    }
    None
}

/// An authenticated user.
#[derive(Debug)]
pub struct Account(User);

impl Account {
    pub fn user(&self) -> &User {
        &self.0
    }

    pub fn id(&self) -> &Id {
        &self.0.id
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Account {
    type Error = ();
    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        try_outcome!(request.guard::<Throttle>().await);
        let auth = try_outcome!(request.guard::<Auth>().await);
        let connections = try_outcome!(request.guard::<sqlite::Connections>().await);
        let user = match auth.account_email() {
            Some(email) => email.parse::<EmailAddress>().ok().and_then(|email| {
                connections
                    .shared()
                    .and_then(|db| Ok(db.try_get_user_by_email(&email)?))
                    .map_err(|err| error!("Unable to load user: {err}"))
                    .ok()
                    .flatten()
            }),
            None => {
                let identity = try_outcome!(request.guard::<&State<Identity>>().await);
                user_from_identity_provider(&connections, identity, auth.bearer_tokens()).await
            }
        };
        let Some(user) = user else {
            return fail(
                request,
                Status::Unauthorized,
                GuardFailure {
                    message: Some(usecases::Error::Unauthorized.to_string()),
                    retry_after: None,
                },
            );
        };
        let limiters = try_outcome!(request.guard::<&State<RateLimiters>>().await);
        if let Decision::Denied { retry_after } = limiters.api.check(user.id.as_str()) {
            return denied(request, retry_after);
        }
        Outcome::Success(Account(user))
    }
}

/// An authenticated user with at least the staff role.
#[derive(Debug)]
pub struct Staff(User);

impl Staff {
    pub fn user(&self) -> &User {
        &self.0
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Staff {
    type Error = ();
    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let account = try_outcome!(request.guard::<Account>().await);
        if !account.user().is_staff() {
            return fail(
                request,
                Status::Forbidden,
                GuardFailure {
                    message: Some(usecases::Error::Forbidden.to_string()),
                    retry_after: None,
                },
            );
        }
        Outcome::Success(Staff(account.0))
    }
}

/// A request signed with an API key pair.
#[derive(Debug)]
pub struct Signed {
    api_key: String,
}

impl Signed {
    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Signed {
    type Error = ();
    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        try_outcome!(request.guard::<Throttle>().await);
        let keys = try_outcome!(request.guard::<&State<ApiKeyStore>>().await);
        let headers = request.headers();
        let (Some(api_key), Some(timestamp), Some(signature)) = (
            headers.get_one(HEADER_API_KEY),
            headers.get_one(HEADER_TIMESTAMP),
            headers.get_one(HEADER_SIGNATURE),
        ) else {
            return fail(
                request,
                Status::Unauthorized,
                GuardFailure {
                    message: Some("Missing signature headers".into()),
                    retry_after: None,
                },
            );
        };
        let Ok(timestamp) = timestamp.parse::<i64>() else {
            return fail(
                request,
                Status::Unauthorized,
                GuardFailure {
                    message: Some("Invalid timestamp".into()),
                    retry_after: None,
                },
            );
        };
        let params = request
            .uri()
            .query()
            .map(|query| {
                query
                    .segments()
                    .map(|(k, v)| (k.to_owned(), v.to_owned()))
                    .collect()
            })
            .unwrap_or_default();
        let signed_request = SignedRequest {
            method: request.method().as_str(),
            path: request.uri().path().as_str(),
            params,
            api_key,
            timestamp,
            signature,
            client_ip: request.client_ip().map(|ip| ip.to_string()),
        };
        if let Err(err) = keys.verify_request(&signed_request, Timestamp::now().as_secs()) {
            debug!("Rejected signed request: {err}");
            return fail(
                request,
                Status::Unauthorized,
                GuardFailure {
                    message: Some(err.to_string()),
                    retry_after: None,
                },
            );
        }
        Outcome::Success(Signed {
            api_key: api_key.to_owned(),
        })
    }
}

pub struct Notify(pub Arc<dyn NotificationGateway + Send + Sync>);

pub struct Storage(pub Arc<dyn FileStorage + Send + Sync>);

pub struct Identity(pub Option<Arc<dyn IdentityProvider + Send + Sync>>);

pub struct SearchIndex(pub Arc<dyn PlaceIndexer + Send + Sync>);
