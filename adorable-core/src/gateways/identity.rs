use adorable_entities::email::EmailAddress;

/// An identity confirmed by an external identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub uid: String,
    pub email: EmailAddress,
    pub email_verified: bool,
}

pub trait IdentityProvider {
    /// `None` if the token is invalid or the provider is unreachable.
    fn verify_id_token(&self, id_token: &str) -> Option<VerifiedIdentity>;
}
