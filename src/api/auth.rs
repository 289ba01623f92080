//! Authentication API endpoints
//!
//! Handles HTTP requests for accounts and tokens:
//! - POST /api/auth/register - Create an account
//! - POST /api/auth/login - Obtain an access/refresh token pair
//! - POST /api/auth/refresh - Exchange a refresh token for an access token
//! - GET /api/auth/me - Current user
//! - DELETE /api/auth/me - Delete the current account

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser, ValidatedJson};
use crate::models::{messages, CreateUserInput, FieldErrors, UserProfile};
use crate::services::TokenPair;

/// Request body for login
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Request body for token refresh
#[derive(Debug, Default, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh: Option<String>,
}

/// Response for token refresh
#[derive(Debug, Serialize)]
pub struct AccessTokenResponse {
    pub access: String,
}

/// Build protected auth routes (need auth)
pub fn protected_router() -> Router<AppState> {
    Router::new().route("/me", get(get_current_user).delete(delete_current_user))
}

/// Build public auth routes (no auth required)
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
}

/// POST /api/auth/register
async fn register(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<CreateUserInput>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.user_service.register(body).await?;
    Ok((StatusCode::CREATED, Json(UserProfile::from(&user))))
}

/// POST /api/auth/login
async fn login(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<LoginRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    let mut errors = FieldErrors::new();
    let username = required(&mut errors, "username", body.username);
    let password = required(&mut errors, "password", body.password);
    errors.into_result().map_err(ApiError::field_errors)?;

    let pair = state.user_service.login(&username, &password).await?;
    Ok(Json(pair))
}

/// POST /api/auth/refresh
async fn refresh(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<RefreshRequest>,
) -> Result<Json<AccessTokenResponse>, ApiError> {
    let mut errors = FieldErrors::new();
    let token = required(&mut errors, "refresh", body.refresh);
    errors.into_result().map_err(ApiError::field_errors)?;

    let access = state.user_service.refresh(&token).await?;
    Ok(Json(AccessTokenResponse { access }))
}

/// GET /api/auth/me
async fn get_current_user(user: AuthenticatedUser) -> Json<UserProfile> {
    Json(UserProfile::from(&user.0))
}

/// DELETE /api/auth/me
async fn delete_current_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<StatusCode, ApiError> {
    state.user_service.delete_account(user.id()).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn required(errors: &mut FieldErrors, field: &str, value: Option<String>) -> String {
    match value {
        None => {
            errors.add(field, messages::REQUIRED);
            String::new()
        }
        Some(v) if v.is_empty() => {
            errors.add(field, messages::BLANK);
            String::new()
        }
        Some(v) => v,
    }
}
