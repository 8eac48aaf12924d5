use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::{AppState, error::ApiError};
use auth::{Claims, Role, VerifyError, authorize};

/// Verify the bearer token and check the role requirement before the handler runs.
///
/// On success the verified claims are stored in the request extensions.
async fn guard(
    state: &AppState,
    mut request: Request,
    next: Next,
    required: Option<Role>,
) -> Result<Response, ApiError> {
    // A header that is present but unreadable is a bad credential, not a missing one
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .map(|v| v.to_str())
        .transpose()
        .map_err(|_| {
            debug!(path = %request.uri().path(), "unreadable authorization header");
            ApiError::Unauthenticated(VerifyError::Malformed)
        })?;

    let claims = state.auth_service.verify_bearer(header).inspect_err(|e| {
        debug!(path = %request.uri().path(), reason = %e, "token rejected");
    })?;

    if let Err(e) = authorize(&claims, required) {
        warn!(
            path = %request.uri().path(),
            principal_id = %claims.sub,
            "role check failed"
        );
        return Err(e.into());
    }

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Middleware to require any authenticated principal
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    guard(&state, request, next, None).await
}

/// Middleware to require the admin role
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    guard(&state, request, next, Some(Role::Admin)).await
}

/// Abort the request with 408 once the configured timeout elapses.
///
/// The inner future is dropped, so a timed-out handler performs no further work.
pub async fn request_timeout(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let path = request.uri().path().to_string();

    tokio::time::timeout(state.request_timeout, next.run(request))
        .await
        .map_err(|_| {
            warn!(%path, timeout_ms = state.request_timeout.as_millis() as u64, "request timed out");
            ApiError::Timeout
        })
}

/// Extractor for the verified principal
/// Use this in handlers that are protected by the auth middleware
#[derive(Debug, Clone)]
pub struct AuthPrincipal(pub Claims);

impl<S> FromRequestParts<S> for AuthPrincipal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(AuthPrincipal)
            .ok_or(ApiError::Unauthenticated(VerifyError::Missing))
    }
}
