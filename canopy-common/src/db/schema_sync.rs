//! Automatic schema synchronization
//!
//! Declarative column definitions in code sync to the live database at
//! startup: missing columns are added via `ALTER TABLE ADD COLUMN`, while
//! type and constraint drift is logged for the admin repair endpoints to
//! handle (SQLite cannot alter those in place).
//!
//! Initialization order:
//! 1. `CREATE TABLE IF NOT EXISTS` (init.rs)
//! 2. Column sync (this module)
//! 3. Versioned manual migrations (migrations.rs)

use crate::Result;
use sqlx::{Row, SqlitePool};
use tracing::{info, warn};

/// Column definition with SQL constraints
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    pub name: String,
    /// SQL type (e.g., "TEXT", "INTEGER", "TIMESTAMP")
    pub sql_type: String,
    pub not_null: bool,
    pub primary_key: bool,
    pub unique: bool,
    pub default_value: Option<String>,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            not_null: false,
            primary_key: false,
            unique: false,
            default_value: None,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }
}

/// Actual column from `PRAGMA table_info`
#[derive(Debug, Clone)]
pub struct ActualColumn {
    pub cid: i32,
    pub name: String,
    pub type_name: String,
    pub not_null: bool,
    pub default_value: Option<String>,
    pub pk: bool,
}

/// Drift detected between expected and actual schema
#[derive(Debug, Clone)]
pub enum SchemaDrift {
    /// Column missing from database (auto-fixable)
    MissingColumn {
        table: String,
        column: ColumnDefinition,
    },
    /// Column type mismatch (requires table rebuild)
    TypeMismatch {
        table: String,
        column: String,
        expected: String,
        actual: String,
    },
    /// Constraint mismatch (requires table rebuild)
    ConstraintMismatch {
        table: String,
        column: String,
        constraint: &'static str,
    },
}

/// Declares the expected schema for one database table
pub trait TableSchema {
    fn table_name() -> &'static str;

    /// Expected column definitions (order matters for new table creation)
    fn expected_columns() -> Vec<ColumnDefinition>;
}

/// Check whether a table exists
pub async fn table_exists(pool: &SqlitePool, table_name: &str) -> Result<bool> {
    let exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM sqlite_master
            WHERE type='table' AND name = ?
        )
        "#,
    )
    .bind(table_name)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// Read actual columns from a table, in database order
pub async fn introspect_table(pool: &SqlitePool, table_name: &str) -> Result<Vec<ActualColumn>> {
    let query = format!("PRAGMA table_info({})", table_name);
    let rows = sqlx::query(&query).fetch_all(pool).await?;

    let mut columns: Vec<ActualColumn> = rows
        .iter()
        .map(|row| ActualColumn {
            cid: row.get("cid"),
            name: row.get("name"),
            type_name: row.get("type"),
            not_null: row.get::<i32, _>("notnull") != 0,
            default_value: row.get("dflt_value"),
            pk: row.get::<i32, _>("pk") != 0,
        })
        .collect();

    columns.sort_by_key(|c| c.cid);

    Ok(columns)
}

/// Compare an expected schema to the actual database schema
pub fn detect_drift(
    table_name: &str,
    expected: &[ColumnDefinition],
    actual: &[ActualColumn],
) -> Vec<SchemaDrift> {
    let mut drift = Vec::new();

    for expected_col in expected {
        let Some(actual_col) = actual.iter().find(|c| c.name == expected_col.name) else {
            drift.push(SchemaDrift::MissingColumn {
                table: table_name.to_string(),
                column: expected_col.clone(),
            });
            continue;
        };

        if !types_compatible(&expected_col.sql_type, &actual_col.type_name) {
            drift.push(SchemaDrift::TypeMismatch {
                table: table_name.to_string(),
                column: expected_col.name.clone(),
                expected: expected_col.sql_type.clone(),
                actual: actual_col.type_name.clone(),
            });
        }

        if expected_col.not_null && !actual_col.not_null {
            drift.push(SchemaDrift::ConstraintMismatch {
                table: table_name.to_string(),
                column: expected_col.name.clone(),
                constraint: "NOT NULL",
            });
        }

        if expected_col.primary_key && !actual_col.pk {
            drift.push(SchemaDrift::ConstraintMismatch {
                table: table_name.to_string(),
                column: expected_col.name.clone(),
                constraint: "PRIMARY KEY",
            });
        }
    }

    drift
}

/// SQLite type affinity comparison
pub fn types_compatible(expected: &str, actual: &str) -> bool {
    let exp = expected.to_uppercase();
    let act = actual.to_uppercase();

    if exp == act {
        return true;
    }

    // INTEGER affinity
    if exp.contains("INT") && act.contains("INT") {
        return true;
    }

    // TEXT affinity
    let is_text = |t: &str| t.contains("TEXT") || t.contains("CHAR") || t.contains("CLOB");
    if is_text(&exp) && is_text(&act) {
        return true;
    }

    // REAL affinity
    let is_real = |t: &str| t.contains("REAL") || t.contains("FLOA") || t.contains("DOUB");
    if is_real(&exp) && is_real(&act) {
        return true;
    }

    false
}

/// Synchronize one table: add missing columns, log unfixable drift
///
/// Type changes and constraint changes require a table rebuild (the admin
/// repair endpoints) and are only reported here.
pub async fn sync_table<T: TableSchema>(pool: &SqlitePool) -> Result<()> {
    let table_name = T::table_name();
    let expected = T::expected_columns();

    if !table_exists(pool, table_name).await? {
        warn!(
            "Schema sync: table '{}' does not exist - expected CREATE TABLE IF NOT EXISTS to run first",
            table_name
        );
        return Ok(());
    }

    let actual = introspect_table(pool, table_name).await?;
    let drift = detect_drift(table_name, &expected, &actual);

    if drift.is_empty() {
        return Ok(());
    }

    for change in drift {
        match change {
            SchemaDrift::MissingColumn { table, column } => {
                add_column(pool, &table, &column).await?;
            }
            SchemaDrift::TypeMismatch {
                table,
                column,
                expected,
                actual,
            } => {
                warn!(
                    "Type mismatch in {}.{}: expected '{}', found '{}'. Run the schema repair endpoint.",
                    table, column, expected, actual
                );
            }
            SchemaDrift::ConstraintMismatch {
                table,
                column,
                constraint,
            } => {
                warn!(
                    "Constraint mismatch in {}.{}: missing '{}'. Requires table rebuild.",
                    table, column, constraint
                );
            }
        }
    }

    Ok(())
}

/// Add a missing column via `ALTER TABLE ADD COLUMN`
///
/// SQLite limitations: PRIMARY KEY and UNIQUE cannot be added this way, and
/// NOT NULL needs a DEFAULT. Violating definitions degrade with a warning.
pub async fn add_column(pool: &SqlitePool, table: &str, column: &ColumnDefinition) -> Result<()> {
    let mut sql = format!(
        "ALTER TABLE {} ADD COLUMN {} {}",
        table, column.name, column.sql_type
    );

    if column.primary_key || column.unique {
        warn!(
            "Cannot add PRIMARY KEY/UNIQUE column {}.{} via ALTER TABLE; constraint omitted",
            table, column.name
        );
    }

    if column.not_null {
        if let Some(default) = &column.default_value {
            sql.push_str(&format!(" NOT NULL DEFAULT {}", default));
        } else {
            warn!(
                "Cannot add NOT NULL column {}.{} without DEFAULT; column will be nullable",
                table, column.name
            );
        }
    } else if let Some(default) = &column.default_value {
        sql.push_str(&format!(" DEFAULT {}", default));
    }

    info!("Adding column: {}.{} ({})", table, column.name, column.sql_type);

    match sqlx::query(&sql).execute(pool).await {
        Ok(_) => Ok(()),
        Err(sqlx::Error::Database(db_err)) if db_err.message().contains("duplicate column") => {
            // Concurrent initialization - column added by another connection
            info!(
                "Column {}.{} already added (concurrent initialization)",
                table, column.name
            );
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_test_db() -> SqlitePool {
        SqlitePool::connect("sqlite::memory:").await.unwrap()
    }

    #[test]
    fn test_column_definition_builder() {
        let col = ColumnDefinition::new("image_url", "TEXT")
            .not_null()
            .default("''");

        assert_eq!(col.name, "image_url");
        assert_eq!(col.sql_type, "TEXT");
        assert!(col.not_null);
        assert!(!col.primary_key);
        assert_eq!(col.default_value, Some("''".to_string()));
    }

    #[test]
    fn test_types_compatible() {
        assert!(types_compatible("TEXT", "TEXT"));
        assert!(types_compatible("text", "TEXT"));
        assert!(types_compatible("INTEGER", "INT"));
        assert!(types_compatible("TEXT", "VARCHAR(255)"));
        assert!(types_compatible("REAL", "FLOAT"));

        assert!(!types_compatible("TEXT", "INTEGER"));
        assert!(!types_compatible("REAL", "TEXT"));
    }

    #[tokio::test]
    async fn test_table_exists() {
        let pool = setup_test_db().await;

        assert!(!table_exists(&pool, "trees").await.unwrap());

        sqlx::query("CREATE TABLE trees (id TEXT PRIMARY KEY)")
            .execute(&pool)
            .await
            .unwrap();

        assert!(table_exists(&pool, "trees").await.unwrap());
    }

    #[tokio::test]
    async fn test_introspect_table() {
        let pool = setup_test_db().await;

        sqlx::query(
            r#"
            CREATE TABLE birds (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                wingspan TEXT
            )
            "#,
        )
        .execute(&pool)
        .await
        .unwrap();

        let columns = introspect_table(&pool, "birds").await.unwrap();

        assert_eq!(columns.len(), 3);
        assert_eq!(columns[0].name, "id");
        assert!(columns[0].pk);
        assert_eq!(columns[1].name, "name");
        assert!(columns[1].not_null);
        assert_eq!(columns[2].name, "wingspan");
        assert!(!columns[2].not_null);
    }

    #[tokio::test]
    async fn test_detect_missing_column() {
        let pool = setup_test_db().await;

        sqlx::query("CREATE TABLE trees (id TEXT PRIMARY KEY, name TEXT NOT NULL)")
            .execute(&pool)
            .await
            .unwrap();

        let expected = vec![
            ColumnDefinition::new("id", "TEXT").primary_key(),
            ColumnDefinition::new("name", "TEXT").not_null(),
            ColumnDefinition::new("researcher_only", "INTEGER").default("0"),
        ];

        let actual = introspect_table(&pool, "trees").await.unwrap();
        let drift = detect_drift("trees", &expected, &actual);

        assert_eq!(drift.len(), 1);
        match &drift[0] {
            SchemaDrift::MissingColumn { table, column } => {
                assert_eq!(table, "trees");
                assert_eq!(column.name, "researcher_only");
            }
            other => panic!("Expected MissingColumn, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_detect_type_mismatch() {
        let pool = setup_test_db().await;

        // Legacy table with INTEGER id
        sqlx::query("CREATE TABLE users (id INTEGER PRIMARY KEY, email TEXT NOT NULL)")
            .execute(&pool)
            .await
            .unwrap();

        let expected = vec![
            ColumnDefinition::new("id", "TEXT").primary_key(),
            ColumnDefinition::new("email", "TEXT").not_null(),
        ];

        let actual = introspect_table(&pool, "users").await.unwrap();
        let drift = detect_drift("users", &expected, &actual);

        assert_eq!(drift.len(), 1);
        match &drift[0] {
            SchemaDrift::TypeMismatch {
                column, expected, actual, ..
            } => {
                assert_eq!(column, "id");
                assert_eq!(expected, "TEXT");
                assert_eq!(actual, "INTEGER");
            }
            other => panic!("Expected TypeMismatch, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_add_column_with_default() {
        let pool = setup_test_db().await;

        sqlx::query("CREATE TABLE animals (id TEXT PRIMARY KEY, name TEXT NOT NULL)")
            .execute(&pool)
            .await
            .unwrap();

        let new_column = ColumnDefinition::new("researcher_only", "INTEGER").default("0");
        add_column(&pool, "animals", &new_column).await.unwrap();

        let columns = introspect_table(&pool, "animals").await.unwrap();
        assert_eq!(columns.len(), 3);
        assert_eq!(columns[2].name, "researcher_only");
        assert_eq!(columns[2].default_value, Some("0".to_string()));
    }

    #[tokio::test]
    async fn test_sync_table_adds_missing_columns() {
        struct PartialTrees;

        impl TableSchema for PartialTrees {
            fn table_name() -> &'static str {
                "trees"
            }

            fn expected_columns() -> Vec<ColumnDefinition> {
                vec![
                    ColumnDefinition::new("id", "TEXT").primary_key(),
                    ColumnDefinition::new("name", "TEXT").not_null(),
                    ColumnDefinition::new("conservation_status", "TEXT"),
                ]
            }
        }

        let pool = setup_test_db().await;

        sqlx::query("CREATE TABLE trees (id TEXT PRIMARY KEY, name TEXT NOT NULL)")
            .execute(&pool)
            .await
            .unwrap();

        // Sync twice: second run must be a no-op
        sync_table::<PartialTrees>(&pool).await.unwrap();
        sync_table::<PartialTrees>(&pool).await.unwrap();

        let columns = introspect_table(&pool, "trees").await.unwrap();
        assert_eq!(columns.len(), 3);
        assert_eq!(columns[2].name, "conservation_status");
    }
}
