//! Process-wide configuration for the dinehub services.

pub mod config;
pub use self::config::{
    AdminConfig, AppConfig, AuthConfig, MAX_TOKEN_EXPIRY_SECONDS, ServerConfig, StorageConfig,
};
pub use ::config::ConfigError;
