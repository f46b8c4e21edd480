//! Session data access
//!
//! Sessions are issued at login and looked up per request for role gating.
//! Guests never get a session row; an unknown or expired token degrades to
//! the guest role at the API layer.

use canopy_common::db::init::get_setting_i64;
use canopy_common::db::models::UserRole;
use canopy_common::Result;
use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Fallback when the setting is missing (1 year)
const DEFAULT_SESSION_TIMEOUT_SECONDS: i64 = 31_536_000;

/// Create a session for a user and return the token
pub async fn create_session(db: &SqlitePool, user_id: &str) -> Result<String> {
    let timeout =
        get_setting_i64(db, "session_timeout_seconds", DEFAULT_SESSION_TIMEOUT_SECONDS).await?;

    let token = Uuid::new_v4().to_string();
    let expires_at = (Utc::now() + Duration::seconds(timeout))
        .format("%Y-%m-%d %H:%M:%S")
        .to_string();

    sqlx::query("INSERT INTO sessions (token, user_id, expires_at) VALUES (?, ?, ?)")
        .bind(&token)
        .bind(user_id)
        .bind(&expires_at)
        .execute(db)
        .await?;

    Ok(token)
}

/// Resolve a session token to (user_id, role)
///
/// Expired tokens resolve to None; the caller treats that as guest.
pub async fn lookup_role(db: &SqlitePool, token: &str) -> Result<Option<(String, UserRole)>> {
    let row: Option<(String, String)> = sqlx::query_as(
        r#"
        SELECT u.id, u.user_type
        FROM sessions s
        JOIN users u ON u.id = s.user_id
        WHERE s.token = ? AND s.expires_at > datetime('now')
        "#,
    )
    .bind(token)
    .fetch_optional(db)
    .await?;

    Ok(row.map(|(user_id, user_type)| (user_id, UserRole::parse(&user_type))))
}

/// Delete a session (logout). Returns whether a row was removed.
pub async fn delete_session(db: &SqlitePool, token: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM sessions WHERE token = ?")
        .bind(token)
        .execute(db)
        .await?;

    Ok(result.rows_affected() > 0)
}
