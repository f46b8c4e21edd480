//! Explorer item endpoints (generic category items)

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use canopy_common::db::models::{Category, NewExplorerItem};
use canopy_common::Error;
use serde_json::{json, Value};

use crate::api::{session, ApiError, ApiResult};
use crate::db::items;
use crate::AppState;

fn parse_category(raw: &str) -> ApiResult<Category> {
    Category::parse(raw)
        .ok_or_else(|| ApiError::Common(Error::InvalidInput(format!("Invalid category: {}", raw))))
}

/// GET /api/items/:category
///
/// Non-researchers never see researcher-only items.
pub async fn list_items(
    State(state): State<AppState>,
    Path(category): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<Value>> {
    let category = parse_category(&category)?;
    let role = session::request_role(&state, &headers).await?;

    let data = items::list_by_category(&state.db, category, role).await?;

    Ok(Json(json!({
        "success": true,
        "data": data,
    })))
}

/// POST /api/items
///
/// Requires an authenticated session.
pub async fn create_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> ApiResult<Json<Value>> {
    session::require_session(&state, &headers).await?;

    let item: NewExplorerItem = serde_json::from_value(payload)
        .map_err(|e| ApiError::Common(Error::InvalidInput(format!("Invalid payload: {}", e))))?;

    let id = items::create_item(&state.db, &item).await?;

    Ok(Json(json!({
        "success": true,
        "data": { "id": id },
    })))
}
