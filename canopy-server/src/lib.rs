//! canopy-server library - HTTP service for the rainforest explorer
//!
//! Serves explorer points, category records with role-gated visibility,
//! session management, and the admin seed/repair surface.

use axum::Router;
use sqlx::SqlitePool;

pub mod api;
pub mod db;
pub mod pagination;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Shared secret for admin API authentication (0 disables auth)
    pub admin_secret: i64,
}

impl AppState {
    pub fn new(db: SqlitePool, admin_secret: i64) -> Self {
        Self { db, admin_secret }
    }
}

/// Build application router
///
/// Mutating admin endpoints require shared-secret authentication; data and
/// session endpoints are public (role gating happens per request via the
/// session token).
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post};

    // Admin routes (shared-secret auth)
    let admin = Router::new()
        .route("/api/ensure-users-table", post(api::admin::ensure_users_table))
        .route("/api/fix-users-table", post(api::admin::fix_users_table))
        .route("/api/fix-sessions-table", post(api::admin::fix_sessions_table))
        .route("/api/add-researcher-only", post(api::admin::add_researcher_only))
        .route("/api/seed-categories", post(api::admin::seed_categories))
        .route("/api/seed-explorer", post(api::admin::seed_explorer))
        .route("/api/cleanup-temp-tables", post(api::admin::cleanup_temp_tables))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth::admin_auth_middleware,
        ));

    // Public routes
    let public = Router::new()
        .route("/api/points", get(api::points::list_points))
        .route("/api/items/:category", get(api::items::list_items))
        .route("/api/items", post(api::items::create_item))
        .route(
            "/api/categories/:category",
            get(api::categories::list_category).post(api::categories::create_category_item),
        )
        .route("/api/categories/:category/:id", get(api::categories::get_category_item))
        .route(
            "/api/auth/session",
            post(api::session::login).delete(api::session::logout),
        )
        .route("/api/auth/profile", get(api::session::profile))
        .route("/api/check-schema", get(api::admin::check_schema))
        .route("/api/table/:name", get(api::table::get_table_data))
        .merge(api::health::health_routes());

    Router::new().merge(admin).merge(public).with_state(state)
}
