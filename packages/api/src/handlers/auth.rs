//! Account registration, login and the current-user lookup.

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use store::{Store, StoreError, User, UserInfo};
use tokio::task;
use tracing::info;
use uuid::Uuid;

use crate::auth::{hash_password, verify_password, AuthUser};
use crate::error::{ApiError, ApiJson, ApiResult};
use crate::state::AppState;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: Option<String>,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserInfo,
}

/// Trim and lower-case an email, rejecting anything without a local part and a
/// dotted domain.
fn normalize_email(email: &str) -> Option<String> {
    let email = email.trim().to_lowercase();
    let (local, domain) = email.split_once('@')?;
    let valid = !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.contains(char::is_whitespace);
    valid.then_some(email)
}

pub async fn register<S: Store>(
    State(state): State<AppState<S>>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<UserInfo>)> {
    let email =
        normalize_email(&req.email).ok_or_else(|| ApiError::bad_request("Invalid email address"))?;
    let min_len = state.auth.min_password_len;
    if req.password.chars().count() < min_len {
        return Err(ApiError::bad_request(format!(
            "Password must be at least {min_len} characters"
        )));
    }
    if state.store.find_user_by_email(&email).await?.is_some() {
        return Err(StoreError::EmailTaken.into());
    }

    let password = req.password;
    let password_hash = task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(ApiError::internal)??;

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4(),
        email,
        name: req
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty()),
        password_hash,
        created_at: now,
        updated_at: now,
    };
    state.store.insert_user(&user).await?;
    info!(id = %user.id, "User registered");
    Ok((StatusCode::CREATED, Json(user.to_info())))
}

pub async fn login<S: Store>(
    State(state): State<AppState<S>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let email = req.email.trim().to_lowercase();
    let user = state
        .store
        .find_user_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::bad_request(INVALID_CREDENTIALS))?;

    let password = req.password;
    let hash = user.password_hash.clone();
    let matches = task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(ApiError::internal)??;
    if !matches {
        return Err(ApiError::bad_request(INVALID_CREDENTIALS));
    }

    let token = state.tokens.issue(user.id)?;
    let info = user.to_info();
    info!(id = %info.id, name = info.display_name(), "User logged in");
    Ok(Json(LoginResponse { token, user: info }))
}

pub async fn me<S: Store>(
    State(state): State<AppState<S>>,
    auth: AuthUser,
) -> ApiResult<Json<UserInfo>> {
    let user = state
        .store
        .get_user(auth.id)
        .await?
        .ok_or(StoreError::UserNotFound(auth.id))?;
    Ok(Json(user.to_info()))
}
