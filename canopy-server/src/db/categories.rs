//! Category table data access (trees, birds, animals, tribes, terrain)
//!
//! Each category has its own table with category-specific columns, so the
//! dispatcher serializes typed rows to JSON values for the uniform
//! `{success, data}` response shape.

use canopy_common::db::models::{
    Animal, Bird, Category, NewAnimal, NewBird, NewTerrain, NewTree, NewTribe, Terrain, Tree,
    Tribe, UserRole,
};
use canopy_common::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use sqlx::SqlitePool;
use uuid::Uuid;

const TREE_COLS: &str = "id, name, scientific_name, description, image_url, height, trunk_diameter, lifespan, ecological_role, conservation_status, researcher_only";
const BIRD_COLS: &str = "id, name, scientific_name, description, image_url, wingspan, habitat, diet, lifespan, conservation_status, researcher_only";
const ANIMAL_COLS: &str = "id, name, scientific_name, description, image_url, weight, length, habitat, diet, conservation_status, researcher_only";
const TRIBE_COLS: &str = "id, name, region, description, image_url, population, language, traditional_practices, challenges, researcher_only";
const TERRAIN_COLS: &str = "id, name, type, description, image_url, elevation, climate, biodiversity, ecological_function, researcher_only";

fn columns_for(category: Category) -> &'static str {
    match category {
        Category::Trees => TREE_COLS,
        Category::Birds => BIRD_COLS,
        Category::Animals => ANIMAL_COLS,
        Category::Tribes => TRIBE_COLS,
        Category::Terrain => TERRAIN_COLS,
    }
}

fn list_sql(category: Category, role: UserRole) -> String {
    let cols = columns_for(category);
    let table = category.table_name();

    if role.is_researcher() {
        format!("SELECT {} FROM {} ORDER BY name", cols, table)
    } else {
        // NULL tolerated: rows predating the visibility flag stay public
        format!(
            "SELECT {} FROM {} WHERE researcher_only = 0 OR researcher_only IS NULL ORDER BY name",
            cols, table
        )
    }
}

fn to_values<T: Serialize>(rows: Vec<T>) -> Result<Vec<Value>> {
    rows.into_iter()
        .map(|row| {
            serde_json::to_value(row).map_err(|e| Error::Internal(format!("Serialize row: {}", e)))
        })
        .collect()
}

/// List category records, ordered by name
///
/// Non-researchers never see rows flagged researcher_only.
pub async fn list(db: &SqlitePool, category: Category, role: UserRole) -> Result<Vec<Value>> {
    let sql = list_sql(category, role);

    match category {
        Category::Trees => to_values(sqlx::query_as::<_, Tree>(&sql).fetch_all(db).await?),
        Category::Birds => to_values(sqlx::query_as::<_, Bird>(&sql).fetch_all(db).await?),
        Category::Animals => to_values(sqlx::query_as::<_, Animal>(&sql).fetch_all(db).await?),
        Category::Tribes => to_values(sqlx::query_as::<_, Tribe>(&sql).fetch_all(db).await?),
        Category::Terrain => to_values(sqlx::query_as::<_, Terrain>(&sql).fetch_all(db).await?),
    }
}

/// Fetch one category record by id
pub async fn get_by_id(db: &SqlitePool, category: Category, id: &str) -> Result<Option<Value>> {
    let sql = format!(
        "SELECT {} FROM {} WHERE id = ?",
        columns_for(category),
        category.table_name()
    );

    let value = match category {
        Category::Trees => sqlx::query_as::<_, Tree>(&sql)
            .bind(id)
            .fetch_optional(db)
            .await?
            .map(serde_json::to_value),
        Category::Birds => sqlx::query_as::<_, Bird>(&sql)
            .bind(id)
            .fetch_optional(db)
            .await?
            .map(serde_json::to_value),
        Category::Animals => sqlx::query_as::<_, Animal>(&sql)
            .bind(id)
            .fetch_optional(db)
            .await?
            .map(serde_json::to_value),
        Category::Tribes => sqlx::query_as::<_, Tribe>(&sql)
            .bind(id)
            .fetch_optional(db)
            .await?
            .map(serde_json::to_value),
        Category::Terrain => sqlx::query_as::<_, Terrain>(&sql)
            .bind(id)
            .fetch_optional(db)
            .await?
            .map(serde_json::to_value),
    };

    match value {
        Some(Ok(v)) => Ok(Some(v)),
        Some(Err(e)) => Err(Error::Internal(format!("Serialize row: {}", e))),
        None => Ok(None),
    }
}

fn parse_payload<T: DeserializeOwned>(payload: Value) -> Result<T> {
    serde_json::from_value(payload).map_err(|e| Error::InvalidInput(format!("Invalid payload: {}", e)))
}

/// Create a category record from a JSON payload, returning the new id
pub async fn create(db: &SqlitePool, category: Category, payload: Value) -> Result<String> {
    match category {
        Category::Trees => create_tree(db, parse_payload(payload)?).await,
        Category::Birds => create_bird(db, parse_payload(payload)?).await,
        Category::Animals => create_animal(db, parse_payload(payload)?).await,
        Category::Tribes => create_tribe(db, parse_payload(payload)?).await,
        Category::Terrain => create_terrain(db, parse_payload(payload)?).await,
    }
}

async fn create_tree(db: &SqlitePool, data: NewTree) -> Result<String> {
    let id = Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO trees (
            id, name, scientific_name, description, image_url,
            height, trunk_diameter, lifespan, ecological_role,
            conservation_status, researcher_only
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&data.name)
    .bind(&data.scientific_name)
    .bind(&data.description)
    .bind(&data.image_url)
    .bind(&data.height)
    .bind(&data.trunk_diameter)
    .bind(&data.lifespan)
    .bind(&data.ecological_role)
    .bind(&data.conservation_status)
    .bind(data.researcher_only)
    .execute(db)
    .await?;

    Ok(id)
}

async fn create_bird(db: &SqlitePool, data: NewBird) -> Result<String> {
    let id = Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO birds (
            id, name, scientific_name, description, image_url,
            wingspan, habitat, diet, lifespan,
            conservation_status, researcher_only
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&data.name)
    .bind(&data.scientific_name)
    .bind(&data.description)
    .bind(&data.image_url)
    .bind(&data.wingspan)
    .bind(&data.habitat)
    .bind(&data.diet)
    .bind(&data.lifespan)
    .bind(&data.conservation_status)
    .bind(data.researcher_only)
    .execute(db)
    .await?;

    Ok(id)
}

async fn create_animal(db: &SqlitePool, data: NewAnimal) -> Result<String> {
    let id = Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO animals (
            id, name, scientific_name, description, image_url,
            weight, length, habitat, diet,
            conservation_status, researcher_only
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&data.name)
    .bind(&data.scientific_name)
    .bind(&data.description)
    .bind(&data.image_url)
    .bind(&data.weight)
    .bind(&data.length)
    .bind(&data.habitat)
    .bind(&data.diet)
    .bind(&data.conservation_status)
    .bind(data.researcher_only)
    .execute(db)
    .await?;

    Ok(id)
}

async fn create_tribe(db: &SqlitePool, data: NewTribe) -> Result<String> {
    let id = Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO tribes (
            id, name, region, description, image_url,
            population, language, traditional_practices, challenges,
            researcher_only
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&data.name)
    .bind(&data.region)
    .bind(&data.description)
    .bind(&data.image_url)
    .bind(&data.population)
    .bind(&data.language)
    .bind(&data.traditional_practices)
    .bind(&data.challenges)
    .bind(data.researcher_only)
    .execute(db)
    .await?;

    Ok(id)
}

async fn create_terrain(db: &SqlitePool, data: NewTerrain) -> Result<String> {
    let id = Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO terrain (
            id, name, type, description, image_url,
            elevation, climate, biodiversity, ecological_function,
            researcher_only
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&data.name)
    .bind(&data.r#type)
    .bind(&data.description)
    .bind(&data.image_url)
    .bind(&data.elevation)
    .bind(&data.climate)
    .bind(&data.biodiversity)
    .bind(&data.ecological_function)
    .bind(data.researcher_only)
    .execute(db)
    .await?;

    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use canopy_common::db::init::init_schema;
    use serde_json::json;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        init_schema(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_create_and_list_trees() {
        let pool = setup_test_db().await;

        let id = create(
            &pool,
            Category::Trees,
            json!({
                "name": "Giant Kapok Tree",
                "scientific_name": "Ceiba pentandra",
                "description": "One of the largest trees in the rainforest",
                "image_url": "/rainforest-giant.png",
                "height": "Up to 70 meters (230 feet)",
                "researcher_only": false
            }),
        )
        .await
        .unwrap();

        let rows = list(&pool, Category::Trees, UserRole::Guest).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], id);
        assert_eq!(rows[0]["name"], "Giant Kapok Tree");
        assert_eq!(rows[0]["height"], "Up to 70 meters (230 feet)");
    }

    #[tokio::test]
    async fn test_list_hides_researcher_only_from_guests() {
        let pool = setup_test_db().await;

        create(
            &pool,
            Category::Birds,
            json!({
                "name": "Toco Toucan",
                "description": "Known for its enormous, colorful bill",
                "image_url": "/rainforest-toucan.png"
            }),
        )
        .await
        .unwrap();

        create(
            &pool,
            Category::Birds,
            json!({
                "name": "Scarlet Macaw",
                "description": "Spectacular parrot with bright plumage",
                "image_url": "/scarlet-flight.png",
                "researcher_only": true
            }),
        )
        .await
        .unwrap();

        let guest_rows = list(&pool, Category::Birds, UserRole::Guest).await.unwrap();
        assert_eq!(guest_rows.len(), 1);
        assert_eq!(guest_rows[0]["name"], "Toco Toucan");

        let researcher_rows = list(&pool, Category::Birds, UserRole::Researcher)
            .await
            .unwrap();
        assert_eq!(researcher_rows.len(), 2);
    }

    #[tokio::test]
    async fn test_list_tolerates_null_visibility_flag() {
        let pool = setup_test_db().await;

        // Row from before the flag existed
        sqlx::query(
            "INSERT INTO terrain (id, name, description, image_url, researcher_only)
             VALUES ('t1', 'Understory', 'Dark, humid layer', '/understory.jpg', NULL)",
        )
        .execute(&pool)
        .await
        .unwrap();

        let rows = list(&pool, Category::Terrain, UserRole::Guest).await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let pool = setup_test_db().await;

        let id = create(
            &pool,
            Category::Tribes,
            json!({
                "name": "Yanomami",
                "region": "Venezuela and Brazil border",
                "description": "One of the largest relatively isolated groups",
                "image_url": "/yanomami-shabono.png",
                "population": "Approximately 35,000 people"
            }),
        )
        .await
        .unwrap();

        let row = get_by_id(&pool, Category::Tribes, &id).await.unwrap().unwrap();
        assert_eq!(row["name"], "Yanomami");
        assert_eq!(row["region"], "Venezuela and Brazil border");

        assert!(get_by_id(&pool, Category::Tribes, "missing")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_create_rejects_missing_required_fields() {
        let pool = setup_test_db().await;

        // No description
        let result = create(
            &pool,
            Category::Animals,
            json!({
                "name": "Jaguar",
                "image_url": "/rainforest-jaguar.png"
            }),
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_terrain_type_field_round_trip() {
        let pool = setup_test_db().await;

        create(
            &pool,
            Category::Terrain,
            json!({
                "name": "Rainforest River",
                "type": "Water feature",
                "description": "Lifeblood of the ecosystem",
                "image_url": "/rainforest-river.jpg"
            }),
        )
        .await
        .unwrap();

        let rows = list(&pool, Category::Terrain, UserRole::Guest).await.unwrap();
        assert_eq!(rows[0]["type"], "Water feature");
    }
}
