//! Document store for the dinehub services
//!
//! Provides:
//! - Principal records behind the `auth::CredentialStore` contract
//! - Profile lookups and updates
//! - Restaurant, menu, promotion and order collections
//! - Optional JSON snapshot persistence to the local filesystem

pub mod catalog;
pub mod model;
pub mod store;

pub use model::{
    Location, MenuCategory, MenuItem, MenuItemStatus, NewRestaurant, Order, OrderLine,
    OrderStatus, ProfileUpdate, Promotion, Restaurant, RestaurantStatus, RestaurantUpdate,
};
pub use store::MemoryStore;

use auth::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Snapshot format error: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error(transparent)]
    Credential(#[from] StoreError),
}

impl From<StorageError> for StoreError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Credential(inner) => inner,
            StorageError::NotFound(what) => StoreError::NotFound(what),
            other => StoreError::Backend(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;
