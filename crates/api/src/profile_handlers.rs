use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::{AppState, error::ApiError, middleware::AuthPrincipal};
use auth::{Principal, Role};
use storage::ProfileUpdate;

/// Public view of a principal; the password hash never leaves the store
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: String,
    pub role: Role,
    pub user_name: String,
    pub email: String,
    pub mob_num: Option<String>,
    pub address: Option<String>,
    pub dob: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl From<Principal> for ProfileResponse {
    fn from(principal: Principal) -> Self {
        Self {
            id: principal.id,
            role: principal.role,
            user_name: principal.display_name,
            email: principal.login_identifier,
            mob_num: principal.profile.mob_num,
            address: principal.profile.address,
            dob: principal.profile.dob,
            created_at: principal.created_at,
        }
    }
}

fn found(principal: Option<Principal>) -> Result<Json<ProfileResponse>, ApiError> {
    principal
        .map(|p| Json(ProfileResponse::from(p)))
        .ok_or_else(|| ApiError::NotFound("User".to_string()))
}

/// Profile of the caller
pub async fn my_profile(
    State(state): State<Arc<AppState>>,
    AuthPrincipal(claims): AuthPrincipal,
) -> Result<Json<ProfileResponse>, ApiError> {
    found(state.store.principal_by_id(&claims.sub).await)
}

pub async fn profile_by_id(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ProfileResponse>, ApiError> {
    found(state.store.principal_by_id(&id).await)
}

pub async fn profile_by_email(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Result<Json<ProfileResponse>, ApiError> {
    found(state.store.principal_by_login(Role::User, email.trim()).await)
}

pub async fn profile_by_username(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Json<ProfileResponse>, ApiError> {
    found(
        state
            .store
            .principal_by_display_name(Role::User, username.trim())
            .await,
    )
}

pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    AuthPrincipal(claims): AuthPrincipal,
    payload: Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let Json(update) = payload?;

    let principal = state.store.update_profile(&claims.sub, update).await?;
    Ok(Json(principal.into()))
}

/// All customer accounts, oldest first
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Json<Vec<ProfileResponse>> {
    let users = state.store.list_principals(Role::User).await;
    Json(users.into_iter().map(ProfileResponse::from).collect())
}
