use adorable_core::gateways::identity::{IdentityProvider, VerifiedIdentity};
use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};

const DEFAULT_LOOKUP_URL: &str = "https://identitytoolkit.googleapis.com/v1/accounts:lookup";

/// Verifies ID tokens issued by Firebase Authentication.
#[derive(Debug, Clone)]
pub struct FirebaseIdentity {
    api_key: String,
    lookup_url: String,
}

impl FirebaseIdentity {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            lookup_url: DEFAULT_LOOKUP_URL.to_owned(),
        }
    }

    pub fn with_lookup_url(mut self, lookup_url: impl Into<String>) -> Self {
        self.lookup_url = lookup_url.into();
        self
    }

    fn lookup(&self, id_token: &str) -> Result<VerifiedIdentity> {
        let response = super::blocking_client()?
            .post(&self.lookup_url)
            .query(&[("key", &self.api_key)])
            .json(&LookupRequest { id_token })
            .send()?;
        if !response.status().is_success() {
            bail!("Token lookup failed with status {}", response.status());
        }
        let response: LookupResponse = response.json()?;
        response.try_into()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LookupRequest<'a> {
    id_token: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Account {
    local_id: String,
    email: Option<String>,
    #[serde(default)]
    email_verified: bool,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<Account>,
}

impl TryFrom<LookupResponse> for VerifiedIdentity {
    type Error = anyhow::Error;

    fn try_from(from: LookupResponse) -> Result<Self> {
        let Account {
            local_id,
            email,
            email_verified,
        } = from
            .users
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("No account found"))?;
        let email = email
            .ok_or_else(|| anyhow!("Account has no e-mail address"))?
            .parse()?;
        Ok(Self {
            uid: local_id,
            email,
            email_verified,
        })
    }
}

impl IdentityProvider for FirebaseIdentity {
    fn verify_id_token(&self, id_token: &str) -> Option<VerifiedIdentity> {
        match self.lookup(id_token) {
            Ok(identity) => Some(identity),
            Err(err) => {
                log::info!("Rejected ID token: {err}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_from_lookup_response() {
        let res: LookupResponse = serde_json::from_str(
            r#"{"kind":"identitytoolkit#GetAccountInfoResponse","users":[
                {"localId":"abc","email":"Alice@Example.com","emailVerified":true}]}"#,
        )
        .unwrap();
        let identity = VerifiedIdentity::try_from(res).unwrap();
        assert_eq!("abc", identity.uid);
        assert_eq!("alice@example.com", identity.email.as_str());
        assert!(identity.email_verified);
    }

    #[test]
    fn reject_empty_lookup_response() {
        let res: LookupResponse = serde_json::from_str("{}").unwrap();
        assert!(VerifiedIdentity::try_from(res).is_err());
        let res: LookupResponse =
            serde_json::from_str(r#"{"users":[{"localId":"abc"}]}"#).unwrap();
        assert!(VerifiedIdentity::try_from(res).is_err());
    }

    #[test]
    fn unreachable_provider_rejects_tokens() {
        let idp = FirebaseIdentity::new("key").with_lookup_url("http://127.0.0.1:1/lookup");
        assert!(idp.verify_id_token("token").is_none());
    }
}
