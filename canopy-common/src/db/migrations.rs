//! Database schema migrations
//!
//! Versioned schema migrations tracked in the `schema_version` table, so
//! databases created by earlier builds upgrade in place without data loss.
//!
//! # Migration guidelines
//!
//! 1. Never modify existing migrations - they must remain stable for users
//!    upgrading from older versions
//! 2. Always add new migrations as new functions
//! 3. Keep migrations idempotent (safe to run multiple times)
//! 4. Prefer ALTER TABLE over DROP/CREATE to preserve data

use crate::Result;
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Current schema version
///
/// IMPORTANT: increment when adding new migrations
const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Get current schema version from database
///
/// Returns 0 if schema_version table doesn't exist or has no rows
async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let table_exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM sqlite_master
            WHERE type='table' AND name='schema_version'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        return Ok(0);
    }

    let version: Option<i32> =
        sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
            .fetch_optional(pool)
            .await?;

    Ok(version.unwrap_or(0))
}

async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;

    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let current_version = get_schema_version(pool).await?;

    if current_version == CURRENT_SCHEMA_VERSION {
        info!("Database schema is up to date (v{})", current_version);
        return Ok(());
    }

    if current_version > CURRENT_SCHEMA_VERSION {
        warn!(
            "Database schema version ({}) is newer than code version ({})",
            current_version, CURRENT_SCHEMA_VERSION
        );
        warn!("This may indicate a downgrade. Proceeding with caution.");
        return Ok(());
    }

    info!(
        "Running database migrations: v{} -> v{}",
        current_version, CURRENT_SCHEMA_VERSION
    );

    if current_version < 1 {
        migrate_v1(pool).await?;
        set_schema_version(pool, 1).await?;
        info!("Migration v1 completed");
    }

    if current_version < 2 {
        migrate_v2(pool).await?;
        set_schema_version(pool, 2).await?;
        info!("Migration v2 completed");
    }

    info!("All migrations completed successfully");
    Ok(())
}

/// Migration v1: add `researcher_only` to every category table
///
/// Background: the category tables predate role-gated visibility. Databases
/// seeded by earlier builds lack the column entirely.
async fn migrate_v1(pool: &SqlitePool) -> Result<()> {
    info!("Running migration v1: add researcher_only to category tables");

    for table in ["trees", "birds", "animals", "tribes", "terrain"] {
        let table_exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM sqlite_master
                WHERE type='table' AND name = ?
            )
            "#,
        )
        .bind(table)
        .fetch_one(pool)
        .await?;

        if !table_exists {
            // Table will be created with the column in place
            continue;
        }

        let has_column: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM pragma_table_info('{}') WHERE name = 'researcher_only'",
            table
        ))
        .fetch_one(pool)
        .await?;

        if has_column > 0 {
            continue;
        }

        match sqlx::query(&format!(
            "ALTER TABLE {} ADD COLUMN researcher_only INTEGER DEFAULT 0",
            table
        ))
        .execute(pool)
        .await
        {
            Ok(_) => {
                info!("  Added researcher_only column to {}", table);
            }
            Err(sqlx::Error::Database(db_err))
                if db_err.message().contains("duplicate column") =>
            {
                // Another connection beat us to it - that's fine
                info!("  researcher_only added by concurrent connection - skipping");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

/// Migration v2: ensure `users.user_type` exists
///
/// Background: some early databases carried the role column under the
/// legacy name `usertype`, others not at all. Rename where possible,
/// otherwise add with the guest default.
async fn migrate_v2(pool: &SqlitePool) -> Result<()> {
    info!("Running migration v2: ensure users.user_type exists");

    let table_exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM sqlite_master
            WHERE type='table' AND name='users'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        info!("  Users table doesn't exist yet - skipping migration");
        return Ok(());
    }

    let has_column: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM pragma_table_info('users') WHERE name = 'user_type'",
    )
    .fetch_one(pool)
    .await?;

    if has_column > 0 {
        info!("  user_type column already exists - skipping");
        return Ok(());
    }

    let has_legacy: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM pragma_table_info('users') WHERE name = 'usertype'",
    )
    .fetch_one(pool)
    .await?;

    if has_legacy > 0 {
        sqlx::query("ALTER TABLE users RENAME COLUMN usertype TO user_type")
            .execute(pool)
            .await?;
        info!("  Renamed legacy usertype column to user_type");
    } else {
        sqlx::query("ALTER TABLE users ADD COLUMN user_type TEXT NOT NULL DEFAULT 'guest'")
            .execute(pool)
            .await?;
        info!("  Added user_type column to users table");
    }

    Ok(())
}
