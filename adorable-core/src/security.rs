//! API keys and HMAC request signing.
//!
//! A signed request carries an API key, a unix timestamp and a
//! signature. The signature is the lowercase hex HMAC-SHA256 of
//!
//! ```text
//! {METHOD}\n{path}\n{k1=v1&k2=v2...}\n{timestamp}
//! ```
//!
//! with the query parameters sorted by key.

use crate::cache::{self, Cache};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::{sync::Arc, time::Duration};
use thiserror::Error;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Max. accepted clock difference of a signed request in seconds.
pub const MAX_TIMESTAMP_DIFF: i64 = 300;

const API_KEY_PREFIX: &str = "ak_";
const API_SECRET_PREFIX: &str = "as_";
const TEMP_TOKEN_PREFIX: &str = "tmp_";

#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("Unknown or expired API key")]
    UnknownKey,
    #[error("Request timestamp outside of the accepted window")]
    Expired,
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("IP address not allowed for this API key")]
    IpNotAllowed,
    #[error(transparent)]
    Cache(#[from] cache::Error),
}

pub fn signing_string(method: &str, path: &str, params: &[(String, String)], timestamp: i64) -> String {
    let mut sorted: Vec<_> = params.iter().collect();
    sorted.sort();
    let query = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    format!("{}\n{path}\n{query}\n{timestamp}", method.to_uppercase())
}

fn new_mac(secret: &str) -> HmacSha256 {
    // HMAC accepts keys of any length.
    match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC key length is unrestricted"),
    }
}

pub fn sign(secret: &str, method: &str, path: &str, params: &[(String, String)], timestamp: i64) -> String {
    let mut mac = new_mac(secret);
    mac.update(signing_string(method, path, params, timestamp).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time comparison of the expected and the given signature.
pub fn verify_signature(
    secret: &str,
    method: &str,
    path: &str,
    params: &[(String, String)],
    timestamp: i64,
    signature: &str,
) -> bool {
    let Ok(signature) = hex::decode(signature) else {
        return false;
    };
    let mut mac = new_mac(secret);
    mac.update(signing_string(method, path, params, timestamp).as_bytes());
    mac.verify_slice(&signature).is_ok()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiCredentials {
    pub api_key: String,
    pub api_secret: String,
    pub allowed_ips: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SignedRequest<'a> {
    pub method: &'a str,
    pub path: &'a str,
    pub params: Vec<(String, String)>,
    pub api_key: &'a str,
    pub timestamp: i64,
    pub signature: &'a str,
    pub client_ip: Option<String>,
}

/// API key pairs kept in the shared cache.
#[derive(Clone)]
pub struct ApiKeyStore {
    cache: Arc<dyn Cache>,
    key_ttl: Duration,
    rotation_grace: Duration,
}

impl ApiKeyStore {
    pub fn new(cache: Arc<dyn Cache>) -> Self {
        Self {
            cache,
            key_ttl: Duration::from_secs(24 * 3600),
            rotation_grace: Duration::from_secs(3600),
        }
    }

    fn secret_key(api_key: &str) -> String {
        format!("api_key:{api_key}")
    }

    fn ips_key(api_key: &str) -> String {
        format!("api_key:{api_key}:ips")
    }

    pub fn generate_api_key(&self, allowed_ips: Vec<String>) -> cache::Result<ApiCredentials> {
        let creds = ApiCredentials {
            api_key: format!("{API_KEY_PREFIX}{}", Uuid::new_v4().as_simple()),
            api_secret: format!("{API_SECRET_PREFIX}{}", Uuid::new_v4().as_simple()),
            allowed_ips,
        };
        self.cache.set(
            &Self::secret_key(&creds.api_key),
            &creds.api_secret,
            Some(self.key_ttl),
        )?;
        if !creds.allowed_ips.is_empty() {
            self.cache.set(
                &Self::ips_key(&creds.api_key),
                &creds.allowed_ips.join(","),
                Some(self.key_ttl),
            )?;
        }
        log::info!("Generated API key {}", creds.api_key);
        Ok(creds)
    }

    /// Issues a new pair. The old key keeps working for the grace period.
    pub fn rotate_api_key(&self, old_key: &str) -> Result<ApiCredentials, SignatureError> {
        if self.lookup_secret(old_key)?.is_none() {
            return Err(SignatureError::UnknownKey);
        }
        let allowed_ips = self.allowed_ips(old_key)?;
        let creds = self.generate_api_key(allowed_ips)?;
        self.cache
            .expire(&Self::secret_key(old_key), self.rotation_grace)?;
        self.cache.expire(&Self::ips_key(old_key), self.rotation_grace)?;
        log::info!("Rotated API key {old_key} -> {}", creds.api_key);
        Ok(creds)
    }

    pub fn revoke_api_key(&self, api_key: &str) -> cache::Result<()> {
        self.cache.delete(&Self::secret_key(api_key))?;
        self.cache.delete(&Self::ips_key(api_key))
    }

    pub fn lookup_secret(&self, api_key: &str) -> cache::Result<Option<String>> {
        self.cache.get(&Self::secret_key(api_key))
    }

    fn allowed_ips(&self, api_key: &str) -> cache::Result<Vec<String>> {
        Ok(self
            .cache
            .get(&Self::ips_key(api_key))?
            .map(|ips| {
                ips.split(',')
                    .filter(|ip| !ip.is_empty())
                    .map(ToOwned::to_owned)
                    .collect()
            })
            .unwrap_or_default())
    }

    pub fn verify_request(&self, req: &SignedRequest, now_secs: i64) -> Result<(), SignatureError> {
        if (now_secs - req.timestamp).abs() > MAX_TIMESTAMP_DIFF {
            return Err(SignatureError::Expired);
        }
        let secret = self
            .lookup_secret(req.api_key)?
            .ok_or(SignatureError::UnknownKey)?;
        let allowed_ips = self.allowed_ips(req.api_key)?;
        if !allowed_ips.is_empty() {
            let allowed = req
                .client_ip
                .as_ref()
                .map(|ip| allowed_ips.contains(ip))
                .unwrap_or(false);
            if !allowed {
                return Err(SignatureError::IpNotAllowed);
            }
        }
        if !verify_signature(
            &secret,
            req.method,
            req.path,
            &req.params,
            req.timestamp,
            req.signature,
        ) {
            return Err(SignatureError::InvalidSignature);
        }
        Ok(())
    }

    /// Short-lived opaque token that maps to `subject`.
    pub fn create_temporary_token(&self, subject: &str, ttl: Duration) -> cache::Result<String> {
        let token = format!("{TEMP_TOKEN_PREFIX}{}", Uuid::new_v4().as_simple());
        self.cache
            .set(&format!("temp_token:{token}"), subject, Some(ttl))?;
        Ok(token)
    }

    pub fn validate_temporary_token(&self, token: &str) -> cache::Result<Option<String>> {
        if !token.starts_with(TEMP_TOKEN_PREFIX) {
            return Ok(None);
        }
        self.cache.get(&format!("temp_token:{token}"))
    }

    pub fn revoke_temporary_token(&self, token: &str) -> cache::Result<()> {
        self.cache.delete(&format!("temp_token:{token}"))
    }
}
