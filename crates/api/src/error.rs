use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};

use auth::{AuthError, Role, VerifyError};
use storage::StorageError;

/// Body of every error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account already exists")]
    DuplicateAccount,

    #[error("request not authenticated: {0}")]
    Unauthenticated(VerifyError),

    #[error("role {0} required")]
    Forbidden(Role),

    #[error("{0} not found")]
    NotFound(String),

    #[error("request timed out")]
    Timeout,

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::DuplicateAccount => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Unauthenticated(VerifyError::Missing) => StatusCode::UNAUTHORIZED,
            ApiError::Unauthenticated(_) | ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Timeout => StatusCode::REQUEST_TIMEOUT,
            ApiError::Configuration(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message shown to the client; internal detail never leaves the process
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Validation(message) => message.clone(),
            ApiError::InvalidCredentials => "Invalid credentials.".to_string(),
            ApiError::DuplicateAccount => "User already exists.".to_string(),
            ApiError::Unauthenticated(reason) => match reason {
                VerifyError::Missing => "Access denied. No token provided.",
                VerifyError::Malformed => "Invalid token.",
                VerifyError::BadSignature => "Invalid token signature.",
                VerifyError::Expired => "Token expired.",
            }
            .to_string(),
            ApiError::Forbidden(role) => {
                format!("Access denied. {} role required.", capitalize(role.as_str()))
            }
            ApiError::NotFound(what) => format!("{what} not found."),
            ApiError::Timeout => "Request timed out.".to_string(),
            ApiError::Configuration(_) | ApiError::Internal(_) => {
                "An internal server error occurred.".to_string()
            }
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            error!(error = %self, "request failed");
        } else {
            debug!(error = %self, status = status.as_u16(), "request rejected");
        }

        let body = ErrorResponse {
            message: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(message) => ApiError::Validation(message),
            AuthError::InvalidCredentials => ApiError::InvalidCredentials,
            AuthError::DuplicateAccount(_) => ApiError::DuplicateAccount,
            AuthError::Unauthenticated(reason) => ApiError::Unauthenticated(reason),
            AuthError::Forbidden { required } => ApiError::Forbidden(required),
            AuthError::NotFound(_) => ApiError::NotFound("User".to_string()),
            AuthError::Configuration(detail) => ApiError::Configuration(detail),
            AuthError::Hashing(detail) | AuthError::Store(detail) => ApiError::Internal(detail),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(what) => ApiError::NotFound(what),
            StorageError::Validation(message) => ApiError::Validation(message),
            StorageError::Credential(inner) => AuthError::from(inner).into(),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}
