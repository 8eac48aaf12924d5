use thiserror::Error;

use crate::model::Role;
use crate::store::StoreError;

/// Reason a bearer token was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("no token supplied")]
    Missing,

    #[error("token is malformed")]
    Malformed,

    #[error("token signature does not match")]
    BadSignature,

    #[error("token expired")]
    Expired,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account already exists: {0}")]
    DuplicateAccount(String),

    #[error("Authentication failed: {0}")]
    Unauthenticated(#[from] VerifyError),

    #[error("Role {required} required")]
    Forbidden { required: Role },

    #[error("Principal not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Credential store failure: {0}")]
    Store(String),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(login) => AuthError::DuplicateAccount(login),
            StoreError::NotFound(id) => AuthError::NotFound(id),
            StoreError::Backend(detail) => AuthError::Store(detail),
        }
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
