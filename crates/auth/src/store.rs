use async_trait::async_trait;
use thiserror::Error;

use crate::model::{Principal, Role};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("login identifier already taken: {0}")]
    Duplicate(String),

    #[error("principal not found: {0}")]
    NotFound(String),

    #[error("store backend error: {0}")]
    Backend(String),
}

/// Lookup and persistence of principals for the auth flows.
///
/// Implementations must enforce uniqueness of `(role, login_identifier)`
/// themselves: `insert` is the serialization point for concurrent
/// registrations and must fail the second writer with
/// [`StoreError::Duplicate`].
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_login(
        &self,
        role: Role,
        login_identifier: &str,
    ) -> Result<Option<Principal>, StoreError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Principal>, StoreError>;

    async fn insert(&self, principal: Principal) -> Result<Principal, StoreError>;

    /// The only mutation path for a stored hash
    async fn update_password_hash(&self, id: &str, password_hash: String) -> Result<(), StoreError>;
}
