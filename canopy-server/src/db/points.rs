//! Explorer point data access

use canopy_common::db::models::ExplorerPoint;
use canopy_common::Result;
use sqlx::SqlitePool;
use uuid::Uuid;

const POINT_COLS: &str = "id, title, description, icon, position_x, position_y";

/// List all explorer points, ordered by title
pub async fn list_points(db: &SqlitePool) -> Result<Vec<ExplorerPoint>> {
    let points = sqlx::query_as::<_, ExplorerPoint>(&format!(
        "SELECT {} FROM explorer_points ORDER BY title",
        POINT_COLS
    ))
    .fetch_all(db)
    .await?;

    Ok(points)
}

/// Insert an explorer point with a generated id
pub async fn insert_point(
    db: &SqlitePool,
    title: &str,
    description: &str,
    icon: &str,
    position_x: &str,
    position_y: &str,
) -> Result<String> {
    let id = Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO explorer_points (id, title, description, icon, position_x, position_y)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(title)
    .bind(description)
    .bind(icon)
    .bind(position_x)
    .bind(position_y)
    .execute(db)
    .await?;

    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use canopy_common::db::init::init_schema;

    #[tokio::test]
    async fn test_insert_and_list_ordered() {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        init_schema(&pool).await.unwrap();

        insert_point(&pool, "Tropical Birds", "Birds of the canopy", "Bird", "70", "15")
            .await
            .unwrap();
        insert_point(&pool, "Explore Trees", "Giants of the forest", "Leaf", "20", "25")
            .await
            .unwrap();

        let points = list_points(&pool).await.unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].title, "Explore Trees");
        assert_eq!(points[1].title, "Tropical Birds");
        assert_eq!(points[0].position_x, "20");
    }
}
