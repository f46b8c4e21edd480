//! HTTP API handlers for canopy-server

pub mod admin;
pub mod auth;
pub mod categories;
pub mod health;
pub mod items;
pub mod points;
pub mod session;
pub mod table;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use canopy_common::Error;
use serde_json::json;

/// API error rendering the `{success: false, error}` shape
#[derive(Debug)]
pub enum ApiError {
    /// Missing or invalid session token (401)
    Unauthorized(String),
    /// Everything else, mapped from the common error enum
    Common(Error),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError::Common(err)
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Common(Error::Database(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Common(err) => match err {
                Error::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
                Error::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
                Error::Database(e) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Database error: {}", e),
                ),
                Error::Io(e) => (StatusCode::INTERNAL_SERVER_ERROR, format!("IO error: {}", e)),
                Error::Config(msg) | Error::Internal(msg) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, msg)
                }
            },
        };

        let body = Json(json!({
            "success": false,
            "error": message,
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
