//! Admin endpoints: seeding and schema repair
//!
//! All POST endpoints here sit behind the shared-secret auth middleware and
//! answer with the `{success, message|error}` shape. `check_schema` is a
//! read-only diagnostic and stays public.

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::api::ApiResult;
use crate::db::{repair, seed};
use crate::AppState;

fn ok_message(message: impl Into<String>) -> Json<Value> {
    Json(json!({
        "success": true,
        "message": message.into(),
    }))
}

/// POST /api/ensure-users-table
pub async fn ensure_users_table(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let message = repair::ensure_users_table(&state.db).await?;
    Ok(ok_message(message))
}

/// POST /api/fix-users-table
pub async fn fix_users_table(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let message = repair::fix_users_table(&state.db).await?;
    Ok(ok_message(message))
}

/// POST /api/fix-sessions-table
pub async fn fix_sessions_table(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let message = repair::fix_sessions_table(&state.db).await?;
    Ok(ok_message(message))
}

/// POST /api/add-researcher-only
pub async fn add_researcher_only(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let message = repair::add_researcher_only(&state.db).await?;
    Ok(ok_message(message))
}

/// POST /api/seed-categories
pub async fn seed_categories(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    seed::seed_categories(&state.db).await?;
    Ok(ok_message("Category tables created and seeded successfully"))
}

/// POST /api/seed-explorer
///
/// Seeds the explorer points and sample items (both idempotent).
pub async fn seed_explorer(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let points = seed::seed_explorer_points(&state.db).await?;
    let items = seed::seed_explorer_items(&state.db).await?;

    Ok(ok_message(format!(
        "Seeded {} explorer points and {} items",
        points, items
    )))
}

/// POST /api/cleanup-temp-tables
pub async fn cleanup_temp_tables(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let dropped = repair::cleanup_temp_tables(&state.db).await?;

    Ok(Json(json!({
        "success": true,
        "message": format!(
            "Cleaned up {} temporary tables: {}",
            dropped.len(),
            dropped.join(", ")
        ),
        "dropped_tables": dropped,
    })))
}

/// GET /api/check-schema
pub async fn check_schema(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let schema = repair::check_schema(&state.db).await?;

    Ok(Json(json!({
        "success": true,
        "schema": schema,
    })))
}
