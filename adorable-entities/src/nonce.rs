use crate::{email::EmailAddress, time::Timestamp};
use std::{fmt, str::FromStr};
use thiserror::Error;
use uuid::Uuid;

/// A random single-use value.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Nonce(Uuid);

impl Nonce {
    pub const STR_LEN: usize = 32;

    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl From<Uuid> for Nonce {
    fn from(from: Uuid) -> Self {
        Self(from)
    }
}

#[derive(Debug, Error)]
#[error("Invalid nonce")]
pub struct NonceParseError;

impl FromStr for Nonce {
    type Err = NonceParseError;

    fn from_str(nonce_str: &str) -> Result<Self, Self::Err> {
        nonce_str
            .parse::<Uuid>()
            .map(Into::into)
            .map_err(|_| NonceParseError)
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0.as_simple())
    }
}

/// A nonce bound to an e-mail address.
///
/// The encoded form is the base58 representation of the address
/// immediately followed by the nonce, so it can be handed out in
/// links without exposing the address in plain text.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct EmailNonce {
    pub email: EmailAddress,
    pub nonce: Nonce,
}

#[derive(Debug, Error)]
pub enum EmailNonceDecodingError {
    #[error(transparent)]
    Bs58(#[from] bs58::decode::Error),
    #[error(transparent)]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("The token is too short ({0} characters)")]
    TooShort(usize),
    #[error("Invalid nonce '{0}'")]
    Nonce(String),
}

impl EmailNonce {
    pub fn new(email: EmailAddress) -> Self {
        Self {
            email,
            nonce: Nonce::new(),
        }
    }

    pub fn encode_to_string(&self) -> String {
        let nonce = self.nonce.to_string();
        debug_assert_eq!(Nonce::STR_LEN, nonce.len());
        let mut concat = String::with_capacity(self.email.as_str().len() + nonce.len());
        concat += self.email.as_str();
        concat += &nonce;
        bs58::encode(concat).into_string()
    }

    pub fn decode_from_str(encoded: &str) -> Result<EmailNonce, EmailNonceDecodingError> {
        let decoded = bs58::decode(encoded).into_vec()?;
        let mut concat = String::from_utf8(decoded)?;
        if concat.len() < Nonce::STR_LEN {
            return Err(EmailNonceDecodingError::TooShort(concat.len()));
        }
        let email_len = concat.len() - Nonce::STR_LEN;
        let nonce_slice = &concat[email_len..];
        let nonce = nonce_slice
            .parse::<Nonce>()
            .map_err(|_| EmailNonceDecodingError::Nonce(nonce_slice.into()))?;
        concat.truncate(email_len);
        Ok(Self {
            email: EmailAddress::new_unchecked(concat),
            nonce,
        })
    }
}

/// Purpose of an issued [`UserToken`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum TokenPurpose {
    ConfirmEmail,
    ResetPassword,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct UserToken {
    pub email_nonce: EmailNonce,
    pub purpose: TokenPurpose,
    pub expires_at: Timestamp,
}
