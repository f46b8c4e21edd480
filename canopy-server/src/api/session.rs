//! Session endpoints: login, logout, profile
//!
//! Credential validation is delegated to the external identity provider;
//! login receives the already-validated identity, mirrors it into the
//! profile row, and issues a session token. Guests never call login, so no
//! server-side row is ever created for them.

use axum::{extract::State, http::HeaderMap, Json};
use canopy_common::db::models::UserRole;
use canopy_common::Error;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::{ApiError, ApiResult};
use crate::db::{sessions, users};
use crate::AppState;

/// Header carrying the session token
pub const SESSION_TOKEN_HEADER: &str = "x-session-token";

/// Identity asserted by the provider at login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    #[serde(default = "default_user_type")]
    pub user_type: String,
}

fn default_user_type() -> String {
    "guest".to_string()
}

fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(SESSION_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Resolve the effective role for a request
///
/// Missing, unknown, or expired tokens degrade to guest.
pub async fn request_role(state: &AppState, headers: &HeaderMap) -> ApiResult<UserRole> {
    match token_from_headers(headers) {
        None => Ok(UserRole::Guest),
        Some(token) => Ok(sessions::lookup_role(&state.db, &token)
            .await?
            .map(|(_, role)| role)
            .unwrap_or(UserRole::Guest)),
    }
}

/// Resolve a request to an authenticated user, or 401
pub async fn require_session(
    state: &AppState,
    headers: &HeaderMap,
) -> ApiResult<(String, UserRole)> {
    let token = token_from_headers(headers)
        .ok_or_else(|| ApiError::Unauthorized("Session token required".to_string()))?;

    sessions::lookup_role(&state.db, &token)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid or expired session".to_string()))
}

/// POST /api/auth/session
///
/// Upserts the profile row and issues a session token.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<Value>> {
    let profile = users::upsert_profile(
        &state.db,
        &req.id,
        &req.email,
        req.name.as_deref(),
        &req.user_type,
    )
    .await?;

    let token = sessions::create_session(&state.db, &profile.id).await?;

    Ok(Json(json!({
        "success": true,
        "token": token,
        "data": profile,
    })))
}

/// DELETE /api/auth/session
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Value>> {
    let token = token_from_headers(&headers)
        .ok_or_else(|| ApiError::Unauthorized("Session token required".to_string()))?;

    let removed = sessions::delete_session(&state.db, &token).await?;

    let message = if removed {
        "Signed out"
    } else {
        "Session already expired"
    };

    Ok(Json(json!({
        "success": true,
        "message": message,
    })))
}

/// GET /api/auth/profile
pub async fn profile(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Value>> {
    let (user_id, _role) = require_session(&state, &headers).await?;

    let profile = users::get_profile(&state.db, &user_id)
        .await?
        .ok_or_else(|| ApiError::Common(Error::NotFound("User profile not found".to_string())))?;

    Ok(Json(json!({
        "success": true,
        "data": profile,
    })))
}
