//! Explorer point endpoints

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::api::ApiResult;
use crate::db::points;
use crate::AppState;

/// GET /api/points
pub async fn list_points(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let data = points::list_points(&state.db).await?;

    Ok(Json(json!({
        "success": true,
        "data": data,
    })))
}
