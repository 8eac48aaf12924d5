use axum::http::HeaderValue;
use std::sync::Arc;
use std::time::Duration;

use auth::{AuthPolicy, AuthService, SigningSecret};
use dinehub_core::AppConfig;
use storage::MemoryStore;

use crate::error::ApiError;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Application state shared across all handlers
pub struct AppState {
    pub auth_service: AuthService,
    pub store: Arc<MemoryStore>,
    pub request_timeout: Duration,
    pub cors_origin: Option<HeaderValue>,
}

impl AppState {
    pub fn new(auth_service: AuthService, store: Arc<MemoryStore>) -> Self {
        Self {
            auth_service,
            store,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            cors_origin: None,
        }
    }

    /// Build the state from validated configuration
    pub fn from_config(config: &AppConfig, store: Arc<MemoryStore>) -> Result<Self, ApiError> {
        let secret = SigningSecret::new(config.auth.jwt_secret.clone())?;
        let policy = AuthPolicy {
            min_password_length: config.auth.min_password_length,
        };
        let auth_service = AuthService::new(
            store.clone(),
            &secret,
            config.auth.token_expiry_seconds,
            policy,
        )?;

        let mut state = Self::new(auth_service, store)
            .with_request_timeout(Duration::from_secs(config.server.request_timeout_secs));

        if let Some(origin) = &config.server.cors_origin {
            let origin = HeaderValue::from_str(origin).map_err(|e| {
                ApiError::Configuration(format!("invalid server.cors_origin {origin:?}: {e}"))
            })?;
            state = state.with_cors_origin(origin);
        }

        Ok(state)
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_cors_origin(mut self, origin: HeaderValue) -> Self {
        self.cors_origin = Some(origin);
        self
    }
}
