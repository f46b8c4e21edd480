//! Database initialization
//!
//! Three-phase startup initialization replaces the per-request catalog
//! probing the original deployment relied on:
//! 1. CREATE TABLE IF NOT EXISTS for every table
//! 2. Automatic column synchronization (schema_sync)
//! 3. Versioned manual migrations (migrations)
//! followed by default-settings initialization.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::{info, warn};

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL mode allows concurrent readers with one writer
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    init_schema(&pool).await?;

    Ok(pool)
}

/// Create all tables and bring the schema up to date
///
/// Idempotent - safe to call on every startup. Split out from
/// `init_database` so tests can run against an in-memory pool.
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    // Phase 1: CREATE TABLE IF NOT EXISTS
    create_schema_version_table(pool).await?;
    create_settings_table(pool).await?;
    create_users_table(pool).await?;
    create_sessions_table(pool).await?;
    create_explorer_points_table(pool).await?;
    create_explorer_items_table(pool).await?;
    create_category_tables(pool).await?;

    // Phase 2: Automatic column synchronization
    crate::db::table_schemas::sync_all_table_schemas(pool).await?;

    // Phase 3: Versioned manual migrations
    crate::db::migrations::run_migrations(pool).await?;

    // Phase 4: Default settings
    init_default_settings(pool).await?;

    Ok(())
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the settings table
///
/// Stores application configuration key-value pairs.
pub async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the users table
///
/// id is TEXT: identity-provider ids are opaque strings, not integers.
/// Databases from before that change are repaired by the fix-users-table
/// endpoint.
pub async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            name TEXT,
            user_type TEXT NOT NULL DEFAULT 'guest' CHECK (user_type IN ('guest', 'dora', 'researcher')),
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the sessions table
pub async fn create_sessions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            token TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            expires_at TIMESTAMP NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the explorer_points table (map markers)
pub async fn create_explorer_points_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS explorer_points (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            icon TEXT NOT NULL,
            position_x TEXT NOT NULL,
            position_y TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the explorer_items table (generic category items)
pub async fn create_explorer_items_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS explorer_items (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            scientific_name TEXT,
            description TEXT NOT NULL,
            image_url TEXT NOT NULL,
            details TEXT NOT NULL DEFAULT '{}',
            category TEXT NOT NULL CHECK (category IN ('trees', 'birds', 'animals', 'tribes', 'terrain')),
            researcher_only INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_explorer_items_category ON explorer_items(category)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the five category tables
pub async fn create_category_tables(pool: &SqlitePool) -> Result<()> {
    create_trees_table(pool).await?;
    create_birds_table(pool).await?;
    create_animals_table(pool).await?;
    create_tribes_table(pool).await?;
    create_terrain_table(pool).await?;

    Ok(())
}

pub async fn create_trees_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS trees (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            scientific_name TEXT,
            description TEXT NOT NULL,
            image_url TEXT NOT NULL,
            height TEXT,
            trunk_diameter TEXT,
            lifespan TEXT,
            ecological_role TEXT,
            conservation_status TEXT,
            researcher_only INTEGER DEFAULT 0,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_trees_name ON trees(name)")
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn create_birds_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS birds (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            scientific_name TEXT,
            description TEXT NOT NULL,
            image_url TEXT NOT NULL,
            wingspan TEXT,
            habitat TEXT,
            diet TEXT,
            lifespan TEXT,
            conservation_status TEXT,
            researcher_only INTEGER DEFAULT 0,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_birds_name ON birds(name)")
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn create_animals_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS animals (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            scientific_name TEXT,
            description TEXT NOT NULL,
            image_url TEXT NOT NULL,
            weight TEXT,
            length TEXT,
            habitat TEXT,
            diet TEXT,
            conservation_status TEXT,
            researcher_only INTEGER DEFAULT 0,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_animals_name ON animals(name)")
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn create_tribes_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tribes (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            region TEXT,
            description TEXT NOT NULL,
            image_url TEXT NOT NULL,
            population TEXT,
            language TEXT,
            traditional_practices TEXT,
            challenges TEXT,
            researcher_only INTEGER DEFAULT 0,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_tribes_name ON tribes(name)")
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn create_terrain_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS terrain (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            type TEXT,
            description TEXT NOT NULL,
            image_url TEXT NOT NULL,
            elevation TEXT,
            climate TEXT,
            biodiversity TEXT,
            ecological_function TEXT,
            researcher_only INTEGER DEFAULT 0,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_terrain_name ON terrain(name)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Initialize or repair default settings
async fn init_default_settings(pool: &SqlitePool) -> Result<()> {
    // Session and authentication settings
    ensure_setting(pool, "session_timeout_seconds", "31536000").await?; // 1 year

    // HTTP server settings
    ensure_setting(pool, "http_max_body_size_bytes", "1048576").await?;

    info!("Default settings initialized");
    Ok(())
}

/// Ensure a setting exists with the specified default value
///
/// If the setting doesn't exist, it is created with the default. If it
/// exists with a NULL value, it is reset to the default.
pub async fn ensure_setting(pool: &SqlitePool, key: &str, default_value: &str) -> Result<()> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM settings WHERE key = ?)")
        .bind(key)
        .fetch_one(pool)
        .await?;

    if !exists {
        // INSERT OR IGNORE handles concurrent initialization: multiple
        // connections may pass the exists check simultaneously
        sqlx::query("INSERT OR IGNORE INTO settings (key, value) VALUES (?, ?)")
            .bind(key)
            .bind(default_value)
            .execute(pool)
            .await?;

        info!("Initialized setting '{}' with default value: {}", key, default_value);
        return Ok(());
    }

    let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_one(pool)
        .await?;

    if value.is_none() {
        sqlx::query("UPDATE settings SET value = ? WHERE key = ?")
            .bind(default_value)
            .bind(key)
            .execute(pool)
            .await?;

        warn!("Setting '{}' was NULL, reset to default: {}", key, default_value);
    }

    Ok(())
}

/// Read a setting as i64, falling back to a default
pub async fn get_setting_i64(pool: &SqlitePool, key: &str, default: i64) -> Result<i64> {
    let row: Option<(Option<String>,)> =
        sqlx::query_as("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(pool)
            .await?;

    match row.and_then(|(value,)| value) {
        Some(v) => Ok(v.parse::<i64>().unwrap_or(default)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema_sync::{introspect_table, table_exists};

    async fn setup_pool() -> SqlitePool {
        SqlitePool::connect("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_init_schema_creates_all_tables() {
        let pool = setup_pool().await;
        init_schema(&pool).await.unwrap();

        for table in [
            "schema_version",
            "settings",
            "users",
            "sessions",
            "explorer_points",
            "explorer_items",
            "trees",
            "birds",
            "animals",
            "tribes",
            "terrain",
        ] {
            assert!(
                table_exists(&pool, table).await.unwrap(),
                "missing table: {}",
                table
            );
        }
    }

    #[tokio::test]
    async fn test_init_schema_idempotent() {
        let pool = setup_pool().await;
        init_schema(&pool).await.unwrap();
        init_schema(&pool).await.unwrap();

        // Settings defaults exist exactly once
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM settings WHERE key = 'session_timeout_seconds'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_users_table_has_text_id() {
        let pool = setup_pool().await;
        init_schema(&pool).await.unwrap();

        let columns = introspect_table(&pool, "users").await.unwrap();
        let id = columns.iter().find(|c| c.name == "id").unwrap();
        assert_eq!(id.type_name.to_uppercase(), "TEXT");
        assert!(id.pk);
    }

    #[tokio::test]
    async fn test_init_database_creates_file() {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("canopy.db");

        let pool = init_database(&db_path).await.unwrap();
        assert!(db_path.exists());

        // Usable after init
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM explorer_points")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_ensure_setting_resets_null() {
        let pool = setup_pool().await;
        create_settings_table(&pool).await.unwrap();

        sqlx::query("INSERT INTO settings (key, value) VALUES ('session_timeout_seconds', NULL)")
            .execute(&pool)
            .await
            .unwrap();

        ensure_setting(&pool, "session_timeout_seconds", "31536000")
            .await
            .unwrap();

        let value: Option<String> = sqlx::query_scalar(
            "SELECT value FROM settings WHERE key = 'session_timeout_seconds'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(value, Some("31536000".to_string()));
    }

    #[tokio::test]
    async fn test_get_setting_i64_fallback() {
        let pool = setup_pool().await;
        create_settings_table(&pool).await.unwrap();

        assert_eq!(get_setting_i64(&pool, "missing", 42).await.unwrap(), 42);

        sqlx::query("INSERT INTO settings (key, value) VALUES ('present', '7')")
            .execute(&pool)
            .await
            .unwrap();
        assert_eq!(get_setting_i64(&pool, "present", 42).await.unwrap(), 7);
    }
}
