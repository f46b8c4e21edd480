//! Table schema definitions
//!
//! Single source of truth for database table schemas. Each struct defines
//! the expected columns for one table; `sync_all_table_schemas` adds any
//! missing columns at startup.

use crate::db::schema_sync::{sync_table, ColumnDefinition, TableSchema};
use crate::Result;
use sqlx::SqlitePool;
use tracing::info;

fn timestamps() -> [ColumnDefinition; 2] {
    [
        ColumnDefinition::new("created_at", "TIMESTAMP")
            .not_null()
            .default("CURRENT_TIMESTAMP"),
        ColumnDefinition::new("updated_at", "TIMESTAMP")
            .not_null()
            .default("CURRENT_TIMESTAMP"),
    ]
}

/// Users table schema
///
/// id is TEXT (provider-issued identity ids are not integers)
pub struct UsersTableSchema;

impl TableSchema for UsersTableSchema {
    fn table_name() -> &'static str {
        "users"
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("id", "TEXT").primary_key(),
            ColumnDefinition::new("email", "TEXT").not_null().unique(),
            ColumnDefinition::new("name", "TEXT"),
            ColumnDefinition::new("user_type", "TEXT")
                .not_null()
                .default("'guest'"),
            ColumnDefinition::new("created_at", "TIMESTAMP")
                .not_null()
                .default("CURRENT_TIMESTAMP"),
        ]
    }
}

/// Sessions table schema
pub struct SessionsTableSchema;

impl TableSchema for SessionsTableSchema {
    fn table_name() -> &'static str {
        "sessions"
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("token", "TEXT").primary_key(),
            ColumnDefinition::new("user_id", "TEXT").not_null(),
            ColumnDefinition::new("expires_at", "TIMESTAMP").not_null(),
            ColumnDefinition::new("created_at", "TIMESTAMP")
                .not_null()
                .default("CURRENT_TIMESTAMP"),
        ]
    }
}

/// Explorer points table schema (map markers)
pub struct ExplorerPointsTableSchema;

impl TableSchema for ExplorerPointsTableSchema {
    fn table_name() -> &'static str {
        "explorer_points"
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        let mut cols = vec![
            ColumnDefinition::new("id", "TEXT").primary_key(),
            ColumnDefinition::new("title", "TEXT").not_null(),
            ColumnDefinition::new("description", "TEXT").not_null(),
            ColumnDefinition::new("icon", "TEXT").not_null(),
            ColumnDefinition::new("position_x", "TEXT").not_null(),
            ColumnDefinition::new("position_y", "TEXT").not_null(),
        ];
        cols.extend(timestamps());
        cols
    }
}

/// Explorer items table schema (generic category items)
pub struct ExplorerItemsTableSchema;

impl TableSchema for ExplorerItemsTableSchema {
    fn table_name() -> &'static str {
        "explorer_items"
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        let mut cols = vec![
            ColumnDefinition::new("id", "TEXT").primary_key(),
            ColumnDefinition::new("name", "TEXT").not_null(),
            ColumnDefinition::new("scientific_name", "TEXT"),
            ColumnDefinition::new("description", "TEXT").not_null(),
            ColumnDefinition::new("image_url", "TEXT").not_null(),
            ColumnDefinition::new("details", "TEXT")
                .not_null()
                .default("'{}'"),
            ColumnDefinition::new("category", "TEXT").not_null(),
            ColumnDefinition::new("researcher_only", "INTEGER")
                .not_null()
                .default("0"),
        ];
        cols.extend(timestamps());
        cols
    }
}

fn category_common_head() -> Vec<ColumnDefinition> {
    vec![
        ColumnDefinition::new("id", "TEXT").primary_key(),
        ColumnDefinition::new("name", "TEXT").not_null(),
    ]
}

fn category_common_tail() -> Vec<ColumnDefinition> {
    let mut cols = vec![ColumnDefinition::new("researcher_only", "INTEGER").default("0")];
    cols.extend(timestamps());
    cols
}

pub struct TreesTableSchema;

impl TableSchema for TreesTableSchema {
    fn table_name() -> &'static str {
        "trees"
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        let mut cols = category_common_head();
        cols.extend([
            ColumnDefinition::new("scientific_name", "TEXT"),
            ColumnDefinition::new("description", "TEXT").not_null(),
            ColumnDefinition::new("image_url", "TEXT").not_null(),
            ColumnDefinition::new("height", "TEXT"),
            ColumnDefinition::new("trunk_diameter", "TEXT"),
            ColumnDefinition::new("lifespan", "TEXT"),
            ColumnDefinition::new("ecological_role", "TEXT"),
            ColumnDefinition::new("conservation_status", "TEXT"),
        ]);
        cols.extend(category_common_tail());
        cols
    }
}

pub struct BirdsTableSchema;

impl TableSchema for BirdsTableSchema {
    fn table_name() -> &'static str {
        "birds"
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        let mut cols = category_common_head();
        cols.extend([
            ColumnDefinition::new("scientific_name", "TEXT"),
            ColumnDefinition::new("description", "TEXT").not_null(),
            ColumnDefinition::new("image_url", "TEXT").not_null(),
            ColumnDefinition::new("wingspan", "TEXT"),
            ColumnDefinition::new("habitat", "TEXT"),
            ColumnDefinition::new("diet", "TEXT"),
            ColumnDefinition::new("lifespan", "TEXT"),
            ColumnDefinition::new("conservation_status", "TEXT"),
        ]);
        cols.extend(category_common_tail());
        cols
    }
}

pub struct AnimalsTableSchema;

impl TableSchema for AnimalsTableSchema {
    fn table_name() -> &'static str {
        "animals"
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        let mut cols = category_common_head();
        cols.extend([
            ColumnDefinition::new("scientific_name", "TEXT"),
            ColumnDefinition::new("description", "TEXT").not_null(),
            ColumnDefinition::new("image_url", "TEXT").not_null(),
            ColumnDefinition::new("weight", "TEXT"),
            ColumnDefinition::new("length", "TEXT"),
            ColumnDefinition::new("habitat", "TEXT"),
            ColumnDefinition::new("diet", "TEXT"),
            ColumnDefinition::new("conservation_status", "TEXT"),
        ]);
        cols.extend(category_common_tail());
        cols
    }
}

pub struct TribesTableSchema;

impl TableSchema for TribesTableSchema {
    fn table_name() -> &'static str {
        "tribes"
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        let mut cols = category_common_head();
        cols.extend([
            ColumnDefinition::new("region", "TEXT"),
            ColumnDefinition::new("description", "TEXT").not_null(),
            ColumnDefinition::new("image_url", "TEXT").not_null(),
            ColumnDefinition::new("population", "TEXT"),
            ColumnDefinition::new("language", "TEXT"),
            ColumnDefinition::new("traditional_practices", "TEXT"),
            ColumnDefinition::new("challenges", "TEXT"),
        ]);
        cols.extend(category_common_tail());
        cols
    }
}

pub struct TerrainTableSchema;

impl TableSchema for TerrainTableSchema {
    fn table_name() -> &'static str {
        "terrain"
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        let mut cols = category_common_head();
        cols.extend([
            ColumnDefinition::new("type", "TEXT"),
            ColumnDefinition::new("description", "TEXT").not_null(),
            ColumnDefinition::new("image_url", "TEXT").not_null(),
            ColumnDefinition::new("elevation", "TEXT"),
            ColumnDefinition::new("climate", "TEXT"),
            ColumnDefinition::new("biodiversity", "TEXT"),
            ColumnDefinition::new("ecological_function", "TEXT"),
        ]);
        cols.extend(category_common_tail());
        cols
    }
}

/// Synchronize all table schemas
///
/// Phase 2 of database initialization (after CREATE TABLE IF NOT EXISTS,
/// before manual migrations).
pub async fn sync_all_table_schemas(pool: &SqlitePool) -> Result<()> {
    info!("Schema synchronization starting");

    sync_table::<UsersTableSchema>(pool).await?;
    sync_table::<SessionsTableSchema>(pool).await?;
    sync_table::<ExplorerPointsTableSchema>(pool).await?;
    sync_table::<ExplorerItemsTableSchema>(pool).await?;
    sync_table::<TreesTableSchema>(pool).await?;
    sync_table::<BirdsTableSchema>(pool).await?;
    sync_table::<AnimalsTableSchema>(pool).await?;
    sync_table::<TribesTableSchema>(pool).await?;
    sync_table::<TerrainTableSchema>(pool).await?;

    info!("Schema synchronization complete");
    Ok(())
}
