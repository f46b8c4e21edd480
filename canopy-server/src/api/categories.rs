//! Category table endpoints (trees, birds, animals, tribes, terrain)

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use canopy_common::db::models::Category;
use canopy_common::Error;
use serde_json::{json, Value};

use crate::api::{session, ApiError, ApiResult};
use crate::db::categories;
use crate::AppState;

fn parse_category(raw: &str) -> ApiResult<Category> {
    Category::parse(raw)
        .ok_or_else(|| ApiError::Common(Error::InvalidInput(format!("Invalid category: {}", raw))))
}

/// GET /api/categories/:category
///
/// Rows ordered by name; researcher-only rows hidden from non-researchers.
pub async fn list_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<Value>> {
    let category = parse_category(&category)?;
    let role = session::request_role(&state, &headers).await?;

    let data = categories::list(&state.db, category, role).await?;

    Ok(Json(json!({
        "success": true,
        "data": data,
    })))
}

/// GET /api/categories/:category/:id
pub async fn get_category_item(
    State(state): State<AppState>,
    Path((category, id)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let category = parse_category(&category)?;

    let record = categories::get_by_id(&state.db, category, &id)
        .await?
        .ok_or_else(|| {
            ApiError::Common(Error::NotFound(format!(
                "No {} record with id {}",
                category, id
            )))
        })?;

    Ok(Json(json!({
        "success": true,
        "data": record,
    })))
}

/// POST /api/categories/:category
///
/// Requires an authenticated session.
pub async fn create_category_item(
    State(state): State<AppState>,
    Path(category): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> ApiResult<Json<Value>> {
    let category = parse_category(&category)?;
    session::require_session(&state, &headers).await?;

    let id = categories::create(&state.db, category, payload).await?;

    Ok(Json(json!({
        "success": true,
        "data": { "id": id },
    })))
}
