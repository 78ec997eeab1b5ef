use crate::{entities::*, repositories};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid email address")]
    Email,
    #[error("Invalid username")]
    Username,
    #[error("Invalid phone nr")]
    Phone,
    #[error("Invalid password")]
    Password,
    #[error("The name must not be empty")]
    EmptyName,
    #[error("The text is too long")]
    TextTooLong,
    #[error("The user already exists")]
    UserExists,
    #[error("The username is already taken")]
    UsernameTaken,
    #[error("Invalid credentials")]
    Credentials,
    #[error("Email not confirmed")]
    EmailNotConfirmed,
    #[error("This is not allowed")]
    Forbidden,
    #[error("This is not allowed without auth")]
    Unauthorized,
    #[error("Token invalid")]
    TokenInvalid,
    #[error("Token expired")]
    TokenExpired,
    #[error("Invalid nonce")]
    InvalidNonce,
    #[error("Invalid position")]
    InvalidPosition,
    #[error("Invalid limit")]
    InvalidLimit,
    #[error("Rating value out of range")]
    RatingValue,
    #[error("You have already reviewed this place")]
    AlreadyReviewed,
    #[error("You cannot follow yourself")]
    FollowSelf,
    #[error("You are already following this user")]
    AlreadyFollowing,
    #[error("You are not following this user")]
    NotFollowing,
    #[error("You cannot block yourself")]
    BlockSelf,
    #[error("The user is already blocked")]
    AlreadyBlocked,
    #[error("You cannot report yourself")]
    ReportSelf,
    #[error("One of the users has blocked the other one")]
    Blocked,
    #[error("A chat needs at least one other participant")]
    ChatParticipants,
    #[error("Empty message")]
    EmptyMessage,
    #[error("The file is empty or too large")]
    FileSize,
    #[error("Wrong or missing file password")]
    FilePassword,
    #[error("You cannot share a file with yourself")]
    ShareSelf,
    #[error("Only images are accepted")]
    NotAnImage,
    #[error(transparent)]
    Repo(#[from] repositories::Error),
}

impl Error {
    /// Errors caused by invalid input as opposed to missing permissions or failures.
    pub fn is_validation(&self) -> bool {
        !matches!(
            self,
            Self::Credentials
                | Self::EmailNotConfirmed
                | Self::Forbidden
                | Self::Unauthorized
                | Self::TokenInvalid
                | Self::TokenExpired
                | Self::Repo(_)
        )
    }
}

impl From<PasswordError> for Error {
    fn from(_: PasswordError) -> Self {
        Self::Password
    }
}

impl From<EmailAddressParseError> for Error {
    fn from(_: EmailAddressParseError) -> Self {
        Self::Email
    }
}

impl From<EmailNonceDecodingError> for Error {
    fn from(_: EmailNonceDecodingError) -> Self {
        Self::InvalidNonce
    }
}

impl From<InvalidRatingValue> for Error {
    fn from(_: InvalidRatingValue) -> Self {
        Self::RatingValue
    }
}

impl From<MapPointError> for Error {
    fn from(_: MapPointError) -> Self {
        Self::InvalidPosition
    }
}
