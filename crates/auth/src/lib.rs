// Core modules
mod error;
mod jwt;
mod password;

// Store-backed modules
pub mod model;
pub mod service;
pub mod store;

// Re-export error types
pub use error::{AuthError, Result, VerifyError};

// Re-export crypto primitives
pub use jwt::{
    extract_bearer, Claims, ExtraClaims, SigningSecret, TokenIssuer, TokenVerifier,
    DEFAULT_TOKEN_TTL_SECONDS,
};
pub use password::{hash_password, verify_password, PasswordHasher};

// Re-export store-backed types
pub use model::{Principal, Profile, Registration, Role};
pub use service::{authorize, AuthPolicy, AuthService, MIN_PASSWORD_LENGTH};
pub use store::{CredentialStore, StoreError};

/// Argon2 cost parameters, for callers tuning [`PasswordHasher::with_params`]
pub use argon2::Params as HashParams;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        AuthError, Result,
        AuthService, CredentialStore,
        Principal, Role,
        Claims, VerifyError,
    };
}
