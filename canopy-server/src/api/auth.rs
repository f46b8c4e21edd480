//! Admin authentication middleware
//!
//! Validates the timestamp + SHA-256 hash carried by mutating admin
//! requests. Returns 401 Unauthorized on failure. Applied to the admin
//! router only; data and session endpoints do not use it.

use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use canopy_common::api::auth::{validate_hash, validate_timestamp, AdminAuthError};

use crate::AppState;

/// Authentication request fields
#[derive(Debug, Deserialize)]
struct AuthFields {
    timestamp: i64,
    hash: String,
}

/// Admin authentication middleware
///
/// A shared secret of 0 disables all checking.
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    if state.admin_secret == 0 {
        // Auth disabled - pass through without validation
        return Ok(next.run(request).await);
    }

    // Buffer the body for hash validation; 1MB cap matches the
    // http_max_body_size_bytes default
    let (parts, body) = request.into_parts();
    let body_bytes = axum::body::to_bytes(body, 1024 * 1024)
        .await
        .map_err(|e| AuthError::ParseError(format!("Failed to read body: {}", e)))?;

    let json_value: Value = serde_json::from_slice(&body_bytes)
        .map_err(|e| AuthError::ParseError(format!("Invalid JSON: {}", e)))?;

    let auth_fields: AuthFields = serde_json::from_value(json_value.clone())
        .map_err(|e| AuthError::MissingFields(format!("Missing auth fields: {}", e)))?;

    validate_timestamp(auth_fields.timestamp).map_err(|e| match e {
        AdminAuthError::InvalidTimestamp { reason, .. } => AuthError::InvalidTimestamp(reason),
        _ => AuthError::Other(e.to_string()),
    })?;

    validate_hash(&auth_fields.hash, &json_value, state.admin_secret).map_err(|e| match e {
        AdminAuthError::InvalidHash { provided, calculated } => {
            warn!(
                "Admin hash validation failed: provided={}, calculated={}",
                provided, calculated
            );
            AuthError::InvalidHash
        }
        _ => AuthError::Other(e.to_string()),
    })?;

    // Reconstruct request with restored body for downstream handlers
    let request = Request::from_parts(parts, Body::from(body_bytes));

    Ok(next.run(request).await)
}

/// Authentication error types for HTTP responses
#[derive(Debug)]
pub enum AuthError {
    InvalidTimestamp(String),
    InvalidHash,
    MissingFields(String),
    ParseError(String),
    Other(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::InvalidTimestamp(reason) => {
                (StatusCode::UNAUTHORIZED, format!("Invalid timestamp: {}", reason))
            }
            AuthError::InvalidHash => (StatusCode::UNAUTHORIZED, "Invalid hash".to_string()),
            AuthError::MissingFields(msg) => {
                (StatusCode::BAD_REQUEST, format!("Missing required fields: {}", msg))
            }
            AuthError::ParseError(msg) => (StatusCode::BAD_REQUEST, format!("Parse error: {}", msg)),
            AuthError::Other(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Authentication error: {}", msg))
            }
        };

        let body = Json(json!({
            "success": false,
            "error": message,
        }));

        (status, body).into_response()
    }
}
