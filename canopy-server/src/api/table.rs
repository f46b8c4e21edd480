//! Debug table browser with pagination and sorting
//!
//! Backs the admin debug screen: raw table contents, 100 rows per page.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use canopy_common::Error;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{Column, Row, ValueRef};

use crate::api::{ApiError, ApiResult};
use crate::pagination::{calculate_pagination, PAGE_SIZE};
use crate::AppState;

/// Query parameters for table viewing
#[derive(Debug, Deserialize)]
pub struct TableQuery {
    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    pub page: i64,

    /// Column to sort by (optional)
    pub sort: Option<String>,

    /// Sort order: "asc" or "desc"
    #[serde(default = "default_order")]
    pub order: String,
}

fn default_page() -> i64 {
    1
}

fn default_order() -> String {
    "asc".to_string()
}

/// Table data response
#[derive(Debug, Serialize)]
pub struct TableDataResponse {
    pub success: bool,
    pub table_name: String,
    pub total_rows: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
}

/// GET /api/table/:name
///
/// Returns paginated table data with optional sorting.
pub async fn get_table_data(
    State(state): State<AppState>,
    Path(table_name): Path<String>,
    Query(query): Query<TableQuery>,
) -> ApiResult<Json<TableDataResponse>> {
    // Validate table name (prevent SQL injection)
    if !is_valid_table_name(&table_name) {
        return Err(invalid_input(format!("Invalid table name: {}", table_name)));
    }

    let exists: bool = canopy_common::db::schema_sync::table_exists(&state.db, &table_name).await?;
    if !exists {
        return Err(invalid_input(format!("Invalid table name: {}", table_name)));
    }

    let total_rows: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table_name))
        .fetch_one(&state.db)
        .await?;

    let p = calculate_pagination(total_rows, query.page);

    // Build query with optional sorting
    let mut sql = format!("SELECT * FROM {}", table_name);

    if let Some(sort_column) = &query.sort {
        if !is_valid_column(&state, &table_name, sort_column).await? {
            return Err(invalid_input(format!("Invalid column: {}", sort_column)));
        }

        let order = if query.order.to_lowercase() == "desc" {
            "DESC"
        } else {
            "ASC"
        };

        sql.push_str(&format!(" ORDER BY {} {}", sort_column, order));
    }

    sql.push_str(&format!(" LIMIT {} OFFSET {}", PAGE_SIZE, p.offset));

    let rows = sqlx::query(&sql).fetch_all(&state.db).await?;

    // Column names from the first row, or from the schema for empty tables
    let columns = if let Some(first_row) = rows.first() {
        first_row
            .columns()
            .iter()
            .map(|col| col.name().to_string())
            .collect()
    } else {
        get_table_columns(&state, &table_name).await?
    };

    let json_rows: Vec<Vec<serde_json::Value>> = rows
        .iter()
        .map(|row| {
            (0..row.len())
                .map(|i| {
                    row.try_get_raw(i)
                        .ok()
                        .and_then(|val| {
                            if val.is_null() {
                                Some(serde_json::Value::Null)
                            } else {
                                row.try_get::<String, _>(i)
                                    .ok()
                                    .map(serde_json::Value::String)
                                    .or_else(|| row.try_get::<i64, _>(i).ok().map(|v| json!(v)))
                                    .or_else(|| row.try_get::<f64, _>(i).ok().map(|v| json!(v)))
                            }
                        })
                        .unwrap_or(serde_json::Value::Null)
                })
                .collect()
        })
        .collect();

    Ok(Json(TableDataResponse {
        success: true,
        table_name,
        total_rows,
        page: p.page,
        page_size: PAGE_SIZE,
        total_pages: p.total_pages,
        columns,
        rows: json_rows,
    }))
}

fn invalid_input(message: String) -> ApiError {
    ApiError::Common(Error::InvalidInput(message))
}

/// Validate table name to prevent SQL injection
fn is_valid_table_name(name: &str) -> bool {
    name.chars().all(|c| c.is_alphanumeric() || c == '_') && !name.is_empty() && name.len() < 100
}

/// Check if column exists in table
async fn is_valid_column(
    state: &AppState,
    table_name: &str,
    column_name: &str,
) -> ApiResult<bool> {
    let columns = get_table_columns(state, table_name).await?;
    Ok(columns.contains(&column_name.to_string()))
}

/// Get column names for a table
async fn get_table_columns(state: &AppState, table_name: &str) -> ApiResult<Vec<String>> {
    let rows = sqlx::query(&format!("PRAGMA table_info({})", table_name))
        .fetch_all(&state.db)
        .await?;

    // PRAGMA table_info returns: (cid, name, type, notnull, dflt_value, pk)
    Ok(rows.iter().map(|row| row.get::<String, _>(1)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_name_validation() {
        assert!(is_valid_table_name("explorer_points"));
        assert!(is_valid_table_name("users_old"));
        assert!(!is_valid_table_name(""));
        assert!(!is_valid_table_name("users; DROP TABLE users"));
        assert!(!is_valid_table_name("users--"));
    }
}
