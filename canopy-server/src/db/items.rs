//! Explorer item data access (generic category items with JSON details)

use canopy_common::db::models::{Category, ExplorerItem, NewExplorerItem, UserRole};
use canopy_common::{Error, Result};
use sqlx::SqlitePool;
use uuid::Uuid;

const ITEM_COLS: &str =
    "id, name, scientific_name, description, image_url, details, category, researcher_only";

/// List explorer items in a category
///
/// Non-researchers never see rows flagged researcher_only.
pub async fn list_by_category(
    db: &SqlitePool,
    category: Category,
    role: UserRole,
) -> Result<Vec<ExplorerItem>> {
    let sql = if role.is_researcher() {
        format!(
            "SELECT {} FROM explorer_items WHERE category = ? ORDER BY name",
            ITEM_COLS
        )
    } else {
        format!(
            "SELECT {} FROM explorer_items WHERE category = ? AND researcher_only = 0 ORDER BY name",
            ITEM_COLS
        )
    };

    let items = sqlx::query_as::<_, ExplorerItem>(&sql)
        .bind(category.table_name())
        .fetch_all(db)
        .await?;

    Ok(items)
}

/// Create an explorer item with a generated id
pub async fn create_item(db: &SqlitePool, item: &NewExplorerItem) -> Result<String> {
    if item.name.is_empty() || item.description.is_empty() {
        return Err(Error::InvalidInput(
            "Item name and description are required".to_string(),
        ));
    }

    let id = Uuid::new_v4().to_string();
    let details = serde_json::to_string(&item.details)
        .map_err(|e| Error::InvalidInput(format!("Invalid details JSON: {}", e)))?;

    sqlx::query(
        r#"
        INSERT INTO explorer_items
            (id, name, scientific_name, description, image_url, details, category, researcher_only)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&item.name)
    .bind(&item.scientific_name)
    .bind(&item.description)
    .bind(&item.image_url)
    .bind(&details)
    .bind(item.category.table_name())
    .bind(item.researcher_only)
    .execute(db)
    .await?;

    Ok(id)
}
