use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{AppState, error::ApiError, middleware::AuthPrincipal};
use auth::{Principal, Profile, Registration, Role};

/// Credentials for either login endpoint.
///
/// Customers send `email`, the admin sends `username`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(alias = "email", alias = "username")]
    pub login_identifier: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(alias = "userName")]
    pub display_name: Option<String>,
    #[serde(alias = "email")]
    pub login_identifier: Option<String>,
    pub password: Option<String>,
    pub mob_num: Option<String>,
    pub address: Option<String>,
    pub dob: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub principal: PrincipalResponse,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrincipalResponse {
    pub id: String,
    pub display_name: String,
    pub login_identifier: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl AuthResponse {
    fn new(token: String, principal: &Principal) -> Self {
        Self {
            token,
            principal: PrincipalResponse {
                id: principal.id.clone(),
                display_name: principal.display_name.clone(),
                login_identifier: principal.login_identifier.clone(),
            },
        }
    }
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let Json(payload) = payload?;

    let registration = Registration {
        display_name: payload.display_name.unwrap_or_default(),
        login_identifier: payload.login_identifier.unwrap_or_default(),
        password: payload.password.unwrap_or_default(),
        profile: Profile {
            mob_num: payload.mob_num,
            address: payload.address,
            dob: payload.dob,
        },
    };

    let (token, principal) = state.auth_service.register(registration).await?;
    Ok((StatusCode::CREATED, Json(AuthResponse::new(token, &principal))))
}

pub async fn login_user(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    login(&state, Role::User, payload).await
}

pub async fn login_admin(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    login(&state, Role::Admin, payload).await
}

async fn login(
    state: &AppState,
    role: Role,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(payload) = payload?;

    let login_identifier = payload.login_identifier.unwrap_or_default();
    let password = payload.password.unwrap_or_default();

    let (token, principal) = state
        .auth_service
        .login(role, &login_identifier, &password)
        .await?;

    Ok(Json(AuthResponse::new(token, &principal)))
}

pub async fn change_password(
    State(state): State<Arc<AppState>>,
    AuthPrincipal(claims): AuthPrincipal,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(payload) = payload?;

    state
        .auth_service
        .change_password(
            &claims.sub,
            &payload.current_password.unwrap_or_default(),
            &payload.new_password.unwrap_or_default(),
        )
        .await?;

    Ok(Json(MessageResponse {
        message: "Password updated successfully.".to_string(),
    }))
}
