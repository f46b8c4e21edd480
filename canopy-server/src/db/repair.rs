//! Schema repair operations
//!
//! One-shot, idempotent, best-effort fixes for schema drift the automatic
//! column sync cannot handle: key columns carrying INTEGER where TEXT is
//! expected are rebuilt through shadow `_new`/`_old` tables. Not
//! transactional across steps; a crash mid-sequence can leave shadow tables
//! behind, which re-running the repair (pre-drop) or `cleanup_temp_tables`
//! removes.

use canopy_common::db::init;
use canopy_common::db::schema_sync::table_exists;
use canopy_common::Result;
use serde_json::{json, Value};
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::{info, warn};

/// Column metadata from PRAGMA table_info, connection-scoped
#[derive(Debug, Clone)]
struct TableColumn {
    name: String,
    type_name: String,
    not_null: bool,
    default_value: Option<String>,
    pk: bool,
}

/// Foreign key reference: a column in `table` referencing the target table
#[derive(Debug, Clone)]
pub struct ForeignKeyRef {
    pub table: String,
    pub column: String,
    /// None when the key references the target's implicit primary key
    pub target_column: Option<String>,
}

/// List all user tables (excluding SQLite internals), alphabetically
pub async fn list_tables(db: &SqlitePool) -> Result<Vec<String>> {
    let tables = sqlx::query_as::<_, (String,)>(
        r#"
        SELECT name
        FROM sqlite_master
        WHERE type = 'table'
          AND name NOT LIKE 'sqlite_%'
        ORDER BY name ASC
        "#,
    )
    .fetch_all(db)
    .await?;

    Ok(tables.into_iter().map(|(name,)| name).collect())
}

async fn conn_table_exists(conn: &mut SqliteConnection, table: &str) -> Result<bool> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name = ?)",
    )
    .bind(table)
    .fetch_one(&mut *conn)
    .await?;

    Ok(exists)
}

async fn conn_columns(conn: &mut SqliteConnection, table: &str) -> Result<Vec<TableColumn>> {
    let rows = sqlx::query(&format!("PRAGMA table_info(\"{}\")", table))
        .fetch_all(&mut *conn)
        .await?;

    Ok(rows
        .iter()
        .map(|row| TableColumn {
            name: row.get("name"),
            type_name: row.get("type"),
            not_null: row.get::<i32, _>("notnull") != 0,
            default_value: row.get("dflt_value"),
            pk: row.get::<i32, _>("pk") != 0,
        })
        .collect())
}

/// Find every table holding a foreign key that references `target`
pub async fn referencing_tables(db: &SqlitePool, target: &str) -> Result<Vec<ForeignKeyRef>> {
    let mut refs = Vec::new();

    for table in list_tables(db).await? {
        if table == target {
            continue;
        }

        let rows = sqlx::query(&format!("PRAGMA foreign_key_list(\"{}\")", table))
            .fetch_all(db)
            .await?;

        for row in rows {
            let referenced: String = row.get("table");
            if referenced == target {
                refs.push(ForeignKeyRef {
                    table: table.clone(),
                    column: row.get("from"),
                    target_column: row.get("to"),
                });
            }
        }
    }

    Ok(refs)
}

async fn drop_shadow_if_exists(conn: &mut SqliteConnection, table: &str) -> Result<()> {
    if conn_table_exists(conn, table).await? {
        warn!("{} table already exists, dropping it first", table);
        sqlx::query(&format!("DROP TABLE \"{}\"", table))
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Rebuild `table` as `{table}_new` with `column` retyped to TEXT
///
/// Copies all rows with `CAST(column AS TEXT)`. The caller renames the
/// tables afterwards. `references` re-declares a foreign key on the retyped
/// column (SQLite cannot ADD CONSTRAINT after the fact).
async fn build_shadow_with_text_column(
    conn: &mut SqliteConnection,
    table: &str,
    column: &str,
    references: Option<&str>,
) -> Result<()> {
    let columns = conn_columns(conn, table).await?;

    let mut column_defs = Vec::new();
    let mut select_cols = Vec::new();

    for col in &columns {
        let mut def = format!("\"{}\" ", col.name);

        if col.name == column {
            def.push_str("TEXT");
            if let Some(target) = references {
                def.push_str(&format!(" REFERENCES {}", target));
            }
            select_cols.push(format!("CAST(\"{}\" AS TEXT)", col.name));
        } else {
            def.push_str(&col.type_name);
            select_cols.push(format!("\"{}\"", col.name));
        }

        if col.pk {
            def.push_str(" PRIMARY KEY");
        }
        if col.not_null {
            def.push_str(" NOT NULL");
        }
        if let Some(default) = &col.default_value {
            def.push_str(&format!(" DEFAULT {}", default));
        }

        column_defs.push(def);
    }

    let create_sql = format!(
        "CREATE TABLE \"{}_new\" ({})",
        table,
        column_defs.join(", ")
    );
    info!("Create table SQL: {}", create_sql);
    sqlx::query(&create_sql).execute(&mut *conn).await?;

    let insert_sql = format!(
        "INSERT INTO \"{}_new\" SELECT {} FROM \"{}\"",
        table,
        select_cols.join(", "),
        table
    );
    info!("Insert SQL: {}", insert_sql);
    sqlx::query(&insert_sql).execute(&mut *conn).await?;

    Ok(())
}

/// Swap `{table}` -> `{table}_old` and `{table}_new` -> `{table}`
async fn swap_shadow(conn: &mut SqliteConnection, table: &str) -> Result<()> {
    sqlx::query(&format!(
        "ALTER TABLE \"{}\" RENAME TO \"{}_old\"",
        table, table
    ))
    .execute(&mut *conn)
    .await?;

    sqlx::query(&format!(
        "ALTER TABLE \"{}_new\" RENAME TO \"{}\"",
        table, table
    ))
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Disable FK enforcement and rename-time FK rewriting for the rebuild
async fn pragmas_for_rebuild(conn: &mut SqliteConnection, active: bool) -> Result<()> {
    if active {
        sqlx::query("PRAGMA foreign_keys = OFF").execute(&mut *conn).await?;
        sqlx::query("PRAGMA legacy_alter_table = ON").execute(&mut *conn).await?;
    } else {
        sqlx::query("PRAGMA legacy_alter_table = OFF").execute(&mut *conn).await?;
        sqlx::query("PRAGMA foreign_keys = ON").execute(&mut *conn).await?;
    }
    Ok(())
}

/// Create the users table if missing
pub async fn ensure_users_table(db: &SqlitePool) -> Result<String> {
    if table_exists(db, "users").await? {
        return Ok("Users table already exists".to_string());
    }

    init::create_users_table(db).await?;
    Ok("Users table created successfully".to_string())
}

/// Ensure `users.user_type` exists, adding or renaming the legacy column
async fn ensure_user_type_column(conn: &mut SqliteConnection) -> Result<()> {
    let columns = conn_columns(conn, "users").await?;

    if columns.iter().any(|c| c.name == "user_type") {
        return Ok(());
    }

    if columns.iter().any(|c| c.name == "usertype") {
        // Rename legacy column for consistency
        sqlx::query("ALTER TABLE users RENAME COLUMN usertype TO user_type")
            .execute(&mut *conn)
            .await?;
    } else {
        sqlx::query("ALTER TABLE users ADD COLUMN user_type TEXT NOT NULL DEFAULT 'guest'")
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}

/// Repair the users table
///
/// Creates the table if missing; rebuilds it (and every table referencing
/// it) when the id column carries the legacy INTEGER type; ensures the
/// user_type column exists.
pub async fn fix_users_table(db: &SqlitePool) -> Result<String> {
    if !table_exists(db, "users").await? {
        init::create_users_table(db).await?;
        return Ok("Users table created successfully".to_string());
    }

    // Collect references on the pool before switching to a single connection
    let refs = referencing_tables(db, "users").await?;

    let mut conn = db.acquire().await?;

    drop_shadow_if_exists(&mut conn, "users_new").await?;

    let columns = conn_columns(&mut conn, "users").await?;
    let id_is_integer = columns
        .iter()
        .find(|c| c.name == "id")
        .map(|c| c.type_name.to_uppercase().contains("INT"))
        .unwrap_or(false);

    if id_is_integer {
        info!("Foreign key constraints referencing users: {:?}", refs);

        for fk in &refs {
            drop_shadow_if_exists(&mut conn, &format!("{}_new", fk.table)).await?;
        }

        pragmas_for_rebuild(&mut conn, true).await?;

        let result: Result<()> = async {
            build_shadow_with_text_column(&mut conn, "users", "id", None).await?;

            for fk in &refs {
                build_shadow_with_text_column(&mut conn, &fk.table, &fk.column, Some("users(id)"))
                    .await?;
            }

            swap_shadow(&mut conn, "users").await?;
            for fk in &refs {
                swap_shadow(&mut conn, &fk.table).await?;
            }

            Ok(())
        }
        .await;

        pragmas_for_rebuild(&mut conn, false).await?;
        result?;

        ensure_user_type_column(&mut conn).await?;

        return Ok(
            "Users table and related tables updated successfully with correct ID type".to_string(),
        );
    }

    ensure_user_type_column(&mut conn).await?;

    Ok("Users table schema verified and fixed if needed".to_string())
}

/// Repair the sessions table: user_id INTEGER -> TEXT rebuild
pub async fn fix_sessions_table(db: &SqlitePool) -> Result<String> {
    if !table_exists(db, "sessions").await? {
        return Ok("Sessions table does not exist, no action needed".to_string());
    }

    let mut conn = db.acquire().await?;

    drop_shadow_if_exists(&mut conn, "sessions_new").await?;

    let columns = conn_columns(&mut conn, "sessions").await?;
    info!("Sessions table columns: {:?}", columns);

    let Some(user_id) = columns.iter().find(|c| c.name == "user_id") else {
        return Ok("Sessions table does not have a user_id column, no action needed".to_string());
    };

    if !user_id.type_name.to_uppercase().contains("INT") {
        return Ok(format!(
            "Sessions table user_id is already {}, no action needed",
            user_id.type_name
        ));
    }

    pragmas_for_rebuild(&mut conn, true).await?;

    let result: Result<()> = async {
        build_shadow_with_text_column(&mut conn, "sessions", "user_id", Some("users(id)")).await?;
        swap_shadow(&mut conn, "sessions").await?;
        Ok(())
    }
    .await;

    pragmas_for_rebuild(&mut conn, false).await?;
    result?;

    Ok("Sessions table updated successfully with TEXT user_id".to_string())
}

/// Add the researcher_only column to every category table where missing
pub async fn add_researcher_only(db: &SqlitePool) -> Result<String> {
    let mut altered = Vec::new();

    for table in ["trees", "birds", "animals", "tribes", "terrain"] {
        if !table_exists(db, table).await? {
            continue;
        }

        let has_column: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM pragma_table_info('{}') WHERE name = 'researcher_only'",
            table
        ))
        .fetch_one(db)
        .await?;

        if has_column == 0 {
            sqlx::query(&format!(
                "ALTER TABLE {} ADD COLUMN researcher_only INTEGER DEFAULT 0",
                table
            ))
            .execute(db)
            .await?;
            altered.push(table);
        }
    }

    if altered.is_empty() {
        Ok("All category tables already have the researcher_only column".to_string())
    } else {
        Ok(format!(
            "Added researcher_only column to: {}",
            altered.join(", ")
        ))
    }
}

/// Drop leftover shadow tables by name-suffix convention
///
/// Returns the names of the tables dropped.
pub async fn cleanup_temp_tables(db: &SqlitePool) -> Result<Vec<String>> {
    let tables_to_drop: Vec<String> = list_tables(db)
        .await?
        .into_iter()
        .filter(|name| name.ends_with("_new") || name.ends_with("_old"))
        .collect();

    for table_name in &tables_to_drop {
        info!("Dropping temporary table: {}", table_name);
        sqlx::query(&format!("DROP TABLE IF EXISTS \"{}\"", table_name))
            .execute(db)
            .await?;
    }

    Ok(tables_to_drop)
}

fn columns_to_json(columns: &[TableColumn]) -> Value {
    Value::Array(
        columns
            .iter()
            .map(|c| {
                json!({
                    "column_name": c.name,
                    "data_type": c.type_name,
                    "is_nullable": !c.not_null,
                    "column_default": c.default_value,
                    "primary_key": c.pk,
                })
            })
            .collect(),
    )
}

/// Report the live schema around the users and sessions tables
pub async fn check_schema(db: &SqlitePool) -> Result<Value> {
    if !table_exists(db, "users").await? {
        return Ok(json!({
            "users_table_exists": false,
        }));
    }

    let mut conn = db.acquire().await?;
    let user_columns = conn_columns(&mut conn, "users").await?;
    drop(conn);

    let dependencies: Vec<Value> = referencing_tables(db, "users")
        .await?
        .iter()
        .map(|fk| {
            json!({
                "table_name": fk.table,
                "column_name": fk.column,
                "foreign_table_name": "users",
                "foreign_column_name": fk.target_column.as_deref().unwrap_or("id"),
            })
        })
        .collect();

    let sessions_info = if table_exists(db, "sessions").await? {
        let mut conn = db.acquire().await?;
        let session_columns = conn_columns(&mut conn, "sessions").await?;
        drop(conn);

        let session_fks: Vec<Value> = {
            let rows = sqlx::query("PRAGMA foreign_key_list(\"sessions\")")
                .fetch_all(db)
                .await?;
            rows.iter()
                .map(|row| {
                    json!({
                        "column_name": row.get::<String, _>("from"),
                        "foreign_table_name": row.get::<String, _>("table"),
                        "foreign_column_name": row
                            .get::<Option<String>, _>("to")
                            .unwrap_or_else(|| "id".to_string()),
                    })
                })
                .collect()
        };

        json!({
            "columns": columns_to_json(&session_columns),
            "foreign_keys": session_fks,
        })
    } else {
        Value::Null
    };

    Ok(json!({
        "users_table_exists": true,
        "columns": columns_to_json(&user_columns),
        "dependencies": dependencies,
        "sessions_info": sessions_info,
        "all_tables": list_tables(db).await?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_pool() -> SqlitePool {
        SqlitePool::connect("sqlite::memory:").await.unwrap()
    }

    /// Legacy schema with INTEGER ids, as left behind by early deployments
    async fn create_legacy_users(pool: &SqlitePool) {
        sqlx::query(
            r#"
            CREATE TABLE users (
                id INTEGER PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                name TEXT,
                user_type TEXT NOT NULL DEFAULT 'guest'
            )
            "#,
        )
        .execute(pool)
        .await
        .unwrap();

        sqlx::query("INSERT INTO users (id, email, name, user_type) VALUES (7, 'r@example.com', 'R', 'researcher')")
            .execute(pool)
            .await
            .unwrap();
    }

    async fn create_legacy_sessions(pool: &SqlitePool) {
        sqlx::query(
            r#"
            CREATE TABLE sessions (
                token TEXT PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id),
                expires_at TIMESTAMP NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await
        .unwrap();

        sqlx::query(
            "INSERT INTO sessions (token, user_id, expires_at) VALUES ('tok', 7, '2099-01-01 00:00:00')",
        )
        .execute(pool)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_ensure_users_table_creates_and_reports() {
        let pool = setup_pool().await;

        let msg = ensure_users_table(&pool).await.unwrap();
        assert!(msg.contains("created"));

        let msg = ensure_users_table(&pool).await.unwrap();
        assert!(msg.contains("already exists"));
    }

    #[tokio::test]
    async fn test_fix_users_creates_missing_table() {
        let pool = setup_pool().await;

        let msg = fix_users_table(&pool).await.unwrap();
        assert!(msg.contains("created"));
        assert!(table_exists(&pool, "users").await.unwrap());
    }

    #[tokio::test]
    async fn test_fix_users_rebuilds_integer_id() {
        let pool = setup_pool().await;
        create_legacy_users(&pool).await;
        create_legacy_sessions(&pool).await;

        let msg = fix_users_table(&pool).await.unwrap();
        assert!(msg.contains("updated successfully"));

        // id is now TEXT and data survived, including the referencing table
        let mut conn = pool.acquire().await.unwrap();
        let columns = conn_columns(&mut conn, "users").await.unwrap();
        let id = columns.iter().find(|c| c.name == "id").unwrap();
        assert_eq!(id.type_name.to_uppercase(), "TEXT");

        let session_columns = conn_columns(&mut conn, "sessions").await.unwrap();
        let user_id = session_columns.iter().find(|c| c.name == "user_id").unwrap();
        assert_eq!(user_id.type_name.to_uppercase(), "TEXT");
        drop(conn);

        let email: String = sqlx::query_scalar("SELECT email FROM users WHERE id = '7'")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(email, "r@example.com");

        let sid: String = sqlx::query_scalar("SELECT user_id FROM sessions WHERE token = 'tok'")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(sid, "7");

        // Old tables remain for the cleanup endpoint
        assert!(table_exists(&pool, "users_old").await.unwrap());
        assert!(table_exists(&pool, "sessions_old").await.unwrap());
    }

    #[tokio::test]
    async fn test_fix_users_noop_when_id_already_text() {
        let pool = setup_pool().await;
        init::create_users_table(&pool).await.unwrap();

        let msg = fix_users_table(&pool).await.unwrap();
        assert!(msg.contains("verified"));
        assert!(!table_exists(&pool, "users_old").await.unwrap());
    }

    #[tokio::test]
    async fn test_fix_users_survives_leftover_shadow_table() {
        let pool = setup_pool().await;
        create_legacy_users(&pool).await;

        // Leftover from a crashed earlier run
        sqlx::query("CREATE TABLE users_new (id TEXT)")
            .execute(&pool)
            .await
            .unwrap();

        let msg = fix_users_table(&pool).await.unwrap();
        assert!(msg.contains("updated successfully"));

        let email: String = sqlx::query_scalar("SELECT email FROM users WHERE id = '7'")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(email, "r@example.com");
    }

    #[tokio::test]
    async fn test_fix_users_renames_legacy_usertype_column() {
        let pool = setup_pool().await;

        sqlx::query(
            "CREATE TABLE users (id TEXT PRIMARY KEY, email TEXT NOT NULL, usertype TEXT NOT NULL)",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query("INSERT INTO users VALUES ('u1', 'a@b.c', 'dora')")
            .execute(&pool)
            .await
            .unwrap();

        fix_users_table(&pool).await.unwrap();

        let role: String = sqlx::query_scalar("SELECT user_type FROM users WHERE id = 'u1'")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(role, "dora");
    }

    #[tokio::test]
    async fn test_fix_sessions_no_table() {
        let pool = setup_pool().await;
        let msg = fix_sessions_table(&pool).await.unwrap();
        assert!(msg.contains("does not exist"));
    }

    #[tokio::test]
    async fn test_fix_sessions_already_text() {
        let pool = setup_pool().await;
        init::create_users_table(&pool).await.unwrap();
        init::create_sessions_table(&pool).await.unwrap();

        let msg = fix_sessions_table(&pool).await.unwrap();
        assert!(msg.contains("no action needed"));
    }

    #[tokio::test]
    async fn test_fix_sessions_rebuilds_integer_user_id() {
        let pool = setup_pool().await;
        create_legacy_users(&pool).await;
        create_legacy_sessions(&pool).await;

        let msg = fix_sessions_table(&pool).await.unwrap();
        assert!(msg.contains("updated successfully"));

        let sid: String = sqlx::query_scalar("SELECT user_id FROM sessions WHERE token = 'tok'")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(sid, "7");
    }

    #[tokio::test]
    async fn test_add_researcher_only() {
        let pool = setup_pool().await;

        sqlx::query("CREATE TABLE trees (id TEXT PRIMARY KEY, name TEXT NOT NULL)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query(
            "CREATE TABLE birds (id TEXT PRIMARY KEY, name TEXT NOT NULL, researcher_only INTEGER DEFAULT 0)",
        )
        .execute(&pool)
        .await
        .unwrap();

        let msg = add_researcher_only(&pool).await.unwrap();
        assert!(msg.contains("trees"));
        assert!(!msg.contains("birds"));

        let msg = add_researcher_only(&pool).await.unwrap();
        assert!(msg.contains("already"));
    }

    #[tokio::test]
    async fn test_cleanup_temp_tables() {
        let pool = setup_pool().await;

        sqlx::query("CREATE TABLE users (id TEXT PRIMARY KEY)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("CREATE TABLE users_old (id INTEGER)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("CREATE TABLE sessions_new (token TEXT)")
            .execute(&pool)
            .await
            .unwrap();

        let dropped = cleanup_temp_tables(&pool).await.unwrap();
        assert_eq!(dropped.len(), 2);
        assert!(dropped.contains(&"users_old".to_string()));
        assert!(dropped.contains(&"sessions_new".to_string()));

        assert!(table_exists(&pool, "users").await.unwrap());
        assert!(!table_exists(&pool, "users_old").await.unwrap());

        // Nothing left to drop
        let dropped = cleanup_temp_tables(&pool).await.unwrap();
        assert!(dropped.is_empty());
    }

    #[tokio::test]
    async fn test_check_schema_reports() {
        let pool = setup_pool().await;

        let report = check_schema(&pool).await.unwrap();
        assert_eq!(report["users_table_exists"], false);

        init::create_users_table(&pool).await.unwrap();
        init::create_sessions_table(&pool).await.unwrap();

        let report = check_schema(&pool).await.unwrap();
        assert_eq!(report["users_table_exists"], true);
        assert!(report["columns"].as_array().unwrap().len() >= 4);
        assert!(report["all_tables"]
            .as_array()
            .unwrap()
            .iter()
            .any(|t| t == "sessions"));

        // The sessions FK reference shows up in both views
        let deps = report["dependencies"].as_array().unwrap();
        assert!(deps.iter().any(|d| d["table_name"] == "sessions"));
        assert!(report["sessions_info"]["foreign_keys"]
            .as_array()
            .unwrap()
            .iter()
            .any(|fk| fk["foreign_table_name"] == "users"));
    }
}
