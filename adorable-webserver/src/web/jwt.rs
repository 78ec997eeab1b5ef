use anyhow::{anyhow, Result};
use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use time::{Duration, OffsetDateTime};

use self::jwt_service::JwtService;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// The email in our case
    sub: String,
    /// Expiry time as Unix timestamp
    exp: usize,
}

pub struct JwtState {
    jwt_service: JwtService,
    time_valid: Duration,
    blacklist: Mutex<HashSet<String>>,
}

impl JwtState {
    /// Tokens of a random secret do not survive a restart.
    pub fn new(secret: Option<&str>) -> Self {
        let jwt_service = match secret {
            Some(secret) => JwtService::new(secret),
            None => {
                warn!("No JWT secret configured, using a random one");
                JwtService::random()
            }
        };
        Self {
            jwt_service,
            time_valid: Duration::days(1),
            blacklist: Mutex::new(HashSet::new()),
        }
    }

    pub fn generate_token(&self, email: &str) -> Result<String> {
        let exp = usize::try_from((OffsetDateTime::now_utc() + self.time_valid).unix_timestamp())?;
        let claims = Claims {
            sub: email.to_string(),
            exp,
        };
        let token = self.jwt_service.encode(&claims)?;
        Ok(token)
    }

    pub fn validate_token_and_get_email(&self, token: &str) -> Result<String> {
        if self.is_on_blacklist(token) {
            return Err(anyhow!("Token is no longer valid"));
        }
        let claims = self.jwt_service.decode(token)?;
        Ok(claims.sub)
    }

    pub fn blacklist_token(&self, token: String) {
        self.remove_invalid_tokens();
        self.lock().insert(token);
    }

    fn is_on_blacklist(&self, token: &str) -> bool {
        self.lock().contains(token)
    }

    fn remove_invalid_tokens(&self) {
        let mut blacklist = self.lock();
        blacklist.retain(|token| self.jwt_service.decode(token).is_ok());
    }

    fn lock(&self) -> MutexGuard<HashSet<String>> {
        self.blacklist.lock()
    }
}

mod jwt_service {
    use super::{Claims, Result};
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

    /// 256 random bits, base64 encoded.
    fn generate_secret() -> String {
        STANDARD.encode(rand::random::<[u8; 32]>())
    }

    struct Key {
        encoding_key: EncodingKey,
        decoding_key: DecodingKey,
    }

    impl Key {
        fn new(secret: &str) -> Self {
            let encoding_key = EncodingKey::from_secret(secret.as_ref());
            let decoding_key = DecodingKey::from_secret(secret.as_ref());
            Self {
                encoding_key,
                decoding_key,
            }
        }
    }

    pub struct JwtService {
        key: Key,
    }

    impl JwtService {
        pub fn new(secret: &str) -> Self {
            Self {
                key: Key::new(secret),
            }
        }
        pub fn random() -> Self {
            Self::new(&generate_secret())
        }
        pub fn encode(&self, claims: &Claims) -> Result<String> {
            let token = encode(&Header::default(), claims, &self.key.encoding_key)?;
            Ok(token)
        }
        pub fn decode(&self, token: &str) -> Result<Claims> {
            let token_data =
                decode::<Claims>(token, &self.key.decoding_key, &Validation::default())?;
            Ok(token_data.claims)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blacklisting_works() {
        let jwt_state = JwtState::new(None);
        let token = jwt_state.generate_token("foo@bar.org").unwrap();
        jwt_state.blacklist_token(token.clone());
        assert!(jwt_state.is_on_blacklist(&token));
    }

    #[test]
    fn validation_works() {
        let jwt_state = JwtState::new(Some("secret"));
        let token = jwt_state.generate_token("foo@bar.org").unwrap();
        let email = jwt_state.validate_token_and_get_email(&token).unwrap();
        assert_eq!(email, "foo@bar.org");
        jwt_state.blacklist_token(token.clone());
        assert!(jwt_state.validate_token_and_get_email(&token).is_err())
    }

    #[test]
    fn tokens_of_other_secrets_are_rejected() {
        let token = JwtState::new(Some("secret"))
            .generate_token("foo@bar.org")
            .unwrap();
        assert!(JwtState::new(Some("other"))
            .validate_token_and_get_email(&token)
            .is_err());
        assert!(JwtState::new(Some("secret"))
            .validate_token_and_get_email(&token)
            .is_ok());
    }

    #[test]
    fn invalid_tokens_are_removed() {
        let jwt_state = JwtState::new(None);
        let token = jwt_state.generate_token("foo@bar.org").unwrap();
        let invalid_token = "dubidubidu".to_string();
        jwt_state.blacklist_token(token.clone());
        jwt_state.blacklist_token(invalid_token.clone());
        // The housekeeping runs before inserting
        assert!(jwt_state.is_on_blacklist(&token));
        assert!(jwt_state.is_on_blacklist(&invalid_token));
        jwt_state.remove_invalid_tokens();
        assert!(jwt_state.is_on_blacklist(&token));
        assert!(!jwt_state.is_on_blacklist(&invalid_token));
    }
}
