use super::ErrorResponse;
use adorable_application::error::{AppError, BError};
use adorable_boundary::ErrorCode;
pub use adorable_core::{repositories::Error as RepoError, usecases::Error as ParameterError};
use anyhow::anyhow;
use rocket::{
    self,
    response::{self, Responder},
    serde::json::Error as JsonError,
};
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
#[allow(clippy::large_enum_variant)]
pub enum Error {
    #[error(transparent)]
    App(#[from] AppError),
    #[error("{0}")]
    OtherWithCode(#[source] anyhow::Error, ErrorCode),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::OtherWithCode(anyhow!(message.into()), ErrorCode::NotFound)
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::OtherWithCode(anyhow!(message.into()), ErrorCode::ValidationError)
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::App(AppError::Business(BError::Parameter(err))) => parameter_error_code(err),
            Self::App(AppError::Business(BError::Repo(err))) => repo_error_code(err),
            Self::App(_) | Self::Other(_) => ErrorCode::InternalServerError,
            Self::OtherWithCode(_, code) => *code,
        }
    }
}

fn parameter_error_code(err: &ParameterError) -> ErrorCode {
    match err {
        ParameterError::Credentials
        | ParameterError::Unauthorized
        | ParameterError::TokenInvalid
        | ParameterError::TokenExpired => ErrorCode::AuthenticationError,
        ParameterError::Forbidden
        | ParameterError::EmailNotConfirmed
        | ParameterError::FilePassword
        | ParameterError::Blocked => ErrorCode::PermissionError,
        ParameterError::Repo(err) => repo_error_code(err),
        err if err.is_validation() => ErrorCode::ValidationError,
        _ => ErrorCode::InternalServerError,
    }
}

fn repo_error_code(err: &RepoError) -> ErrorCode {
    match err {
        RepoError::NotFound => ErrorCode::NotFound,
        RepoError::AlreadyExists => ErrorCode::ValidationError,
        RepoError::Io(_) | RepoError::Other(_) => ErrorCode::DatabaseError,
    }
}

fn public_message(code: ErrorCode) -> &'static str {
    match code {
        ErrorCode::DatabaseError => "A database error occurred",
        ErrorCode::ExternalServiceError => "An external service failed",
        ErrorCode::ServiceUnavailable => "The service is temporarily unavailable",
        _ => "An unexpected error occurred",
    }
}

impl From<JsonError<'_>> for Error {
    fn from(err: JsonError) -> Self {
        match err {
            JsonError::Io(err) => Self::OtherWithCode(anyhow!(err), ErrorCode::ValidationError),
            JsonError::Parse(_str, err) => {
                Self::OtherWithCode(anyhow!(err), ErrorCode::ValidationError)
            }
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::Other(anyhow!(err))
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r rocket::Request<'_>) -> response::Result<'o> {
        let code = self.code();
        let message = if code.http_status() >= 500 {
            error!("{} {}: {self:?}", req.uri(), code.as_str());
            public_message(code).to_owned()
        } else {
            warn!("{} {}: {self}", req.uri(), code.as_str());
            self.to_string()
        };
        ErrorResponse::new(code, message).respond_to(req)
    }
}

impl From<RepoError> for Error {
    fn from(err: RepoError) -> Self {
        AppError::from(err).into()
    }
}

impl From<BError> for Error {
    fn from(err: BError) -> Self {
        AppError::from(err).into()
    }
}

impl From<ParameterError> for Error {
    fn from(err: ParameterError) -> Self {
        Self::App(err.into())
    }
}

impl From<adorable_core::entities::EmailAddressParseError> for Error {
    fn from(err: adorable_core::entities::EmailAddressParseError) -> Self {
        Self::App(err.into())
    }
}

impl From<adorable_core::cache::Error> for Error {
    fn from(err: adorable_core::cache::Error) -> Self {
        Self::OtherWithCode(anyhow!(err), ErrorCode::ServiceUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_errors_to_codes() {
        assert_eq!(
            ErrorCode::AuthenticationError,
            Error::from(ParameterError::Credentials).code()
        );
        assert_eq!(
            ErrorCode::PermissionError,
            Error::from(ParameterError::Blocked).code()
        );
        assert_eq!(
            ErrorCode::ValidationError,
            Error::from(ParameterError::RatingValue).code()
        );
        assert_eq!(
            ErrorCode::NotFound,
            Error::from(ParameterError::Repo(RepoError::NotFound)).code()
        );
        assert_eq!(
            ErrorCode::DatabaseError,
            Error::from(RepoError::Other(anyhow!("disk full"))).code()
        );
        assert_eq!(
            ErrorCode::InternalServerError,
            Error::from(anyhow!("boom")).code()
        );
    }
}
