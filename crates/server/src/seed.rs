use auth::{AuthService, Principal, Result};
use dinehub_core::AdminConfig;
use tracing::info;

/// Make sure the configured admin account exists.
///
/// Runs on every start; an existing admin keeps its current password.
pub async fn provision_admin(auth_service: &AuthService, admin: &AdminConfig) -> Result<Principal> {
    info!(username = %admin.username, "checking admin account");

    let principal = auth_service
        .provision_admin(&admin.username, &admin.password)
        .await?;

    info!(principal_id = %principal.id, "admin account ready");
    Ok(principal)
}
