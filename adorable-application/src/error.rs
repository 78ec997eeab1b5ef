use adorable_core::{repositories::Error as RepoError, usecases::Error as ParameterError};
use std::io;
use thiserror::Error;

pub use adorable_core::repositories;

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> AppError {
        AppError::Business(BError::Repo(err))
    }
}

impl From<ParameterError> for AppError {
    fn from(err: ParameterError) -> AppError {
        // Unwrap repository errors that have been
        // passed through a use case.
        match err {
            ParameterError::Repo(err) => AppError::Business(BError::Repo(err)),
            err => AppError::Business(BError::Parameter(err)),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Business(#[from] BError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum BError {
    #[error(transparent)]
    Parameter(#[from] ParameterError),
    #[error(transparent)]
    Repo(#[from] repositories::Error),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<String> for BError {
    fn from(s: String) -> Self {
        Self::Internal(s)
    }
}

impl From<adorable_core::entities::EmailAddressParseError> for AppError {
    fn from(err: adorable_core::entities::EmailAddressParseError) -> Self {
        ParameterError::from(err).into()
    }
}

impl From<adorable_core::entities::PasswordError> for AppError {
    fn from(err: adorable_core::entities::PasswordError) -> Self {
        ParameterError::from(err).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_repository_errors() {
        let err = AppError::from(ParameterError::Repo(RepoError::NotFound));
        assert!(matches!(
            err,
            AppError::Business(BError::Repo(RepoError::NotFound))
        ));
        let err = AppError::from(ParameterError::Forbidden);
        assert!(matches!(
            err,
            AppError::Business(BError::Parameter(ParameterError::Forbidden))
        ));
    }
}
