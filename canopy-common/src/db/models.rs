//! Database models and category definitions

use serde::{Deserialize, Serialize};
use sqlx::types::Json;

/// User role stored in `users.user_type`
///
/// Unknown role strings coerce to `Guest` rather than failing; the original
/// data contains free-form values from earlier schema drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Guest,
    Dora,
    Researcher,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Guest => "guest",
            UserRole::Dora => "dora",
            UserRole::Researcher => "researcher",
        }
    }

    /// Parse a role string, coercing anything unknown to `Guest`
    pub fn parse(s: &str) -> UserRole {
        match s {
            "dora" => UserRole::Dora,
            "researcher" => UserRole::Researcher,
            _ => UserRole::Guest,
        }
    }

    pub fn is_researcher(&self) -> bool {
        matches!(self, UserRole::Researcher)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Content category backing one of the five category tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Trees,
    Birds,
    Animals,
    Tribes,
    Terrain,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Trees,
        Category::Birds,
        Category::Animals,
        Category::Tribes,
        Category::Terrain,
    ];

    /// Table name for this category
    pub fn table_name(&self) -> &'static str {
        match self {
            Category::Trees => "trees",
            Category::Birds => "birds",
            Category::Animals => "animals",
            Category::Tribes => "tribes",
            Category::Terrain => "terrain",
        }
    }

    pub fn parse(s: &str) -> Option<Category> {
        match s {
            "trees" => Some(Category::Trees),
            "birds" => Some(Category::Birds),
            "animals" => Some(Category::Animals),
            "tribes" => Some(Category::Tribes),
            "terrain" => Some(Category::Terrain),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table_name())
    }
}

/// Application-owned user profile row, mirrored from the identity provider
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub user_type: String,
}

impl UserProfile {
    pub fn role(&self) -> UserRole {
        UserRole::parse(&self.user_type)
    }
}

/// Map marker opening a category view
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ExplorerPoint {
    pub id: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub position_x: String,
    pub position_y: String,
}

/// Generic category item with a JSON details blob
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ExplorerItem {
    pub id: String,
    pub name: String,
    pub scientific_name: Option<String>,
    pub description: String,
    pub image_url: String,
    pub details: Json<serde_json::Value>,
    pub category: String,
    pub researcher_only: bool,
}

/// Payload for creating an explorer item
#[derive(Debug, Clone, Deserialize)]
pub struct NewExplorerItem {
    pub name: String,
    pub scientific_name: Option<String>,
    pub description: String,
    pub image_url: String,
    pub details: serde_json::Value,
    pub category: Category,
    #[serde(default)]
    pub researcher_only: bool,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Tree {
    pub id: String,
    pub name: String,
    pub scientific_name: Option<String>,
    pub description: String,
    pub image_url: String,
    pub height: Option<String>,
    pub trunk_diameter: Option<String>,
    pub lifespan: Option<String>,
    pub ecological_role: Option<String>,
    pub conservation_status: Option<String>,
    pub researcher_only: Option<bool>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Bird {
    pub id: String,
    pub name: String,
    pub scientific_name: Option<String>,
    pub description: String,
    pub image_url: String,
    pub wingspan: Option<String>,
    pub habitat: Option<String>,
    pub diet: Option<String>,
    pub lifespan: Option<String>,
    pub conservation_status: Option<String>,
    pub researcher_only: Option<bool>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Animal {
    pub id: String,
    pub name: String,
    pub scientific_name: Option<String>,
    pub description: String,
    pub image_url: String,
    pub weight: Option<String>,
    pub length: Option<String>,
    pub habitat: Option<String>,
    pub diet: Option<String>,
    pub conservation_status: Option<String>,
    pub researcher_only: Option<bool>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Tribe {
    pub id: String,
    pub name: String,
    pub region: Option<String>,
    pub description: String,
    pub image_url: String,
    pub population: Option<String>,
    pub language: Option<String>,
    pub traditional_practices: Option<String>,
    pub challenges: Option<String>,
    pub researcher_only: Option<bool>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Terrain {
    pub id: String,
    pub name: String,
    pub r#type: Option<String>,
    pub description: String,
    pub image_url: String,
    pub elevation: Option<String>,
    pub climate: Option<String>,
    pub biodiversity: Option<String>,
    pub ecological_function: Option<String>,
    pub researcher_only: Option<bool>,
}

/// Payload for creating a tree record
#[derive(Debug, Clone, Deserialize)]
pub struct NewTree {
    pub name: String,
    pub scientific_name: Option<String>,
    pub description: String,
    pub image_url: String,
    pub height: Option<String>,
    pub trunk_diameter: Option<String>,
    pub lifespan: Option<String>,
    pub ecological_role: Option<String>,
    pub conservation_status: Option<String>,
    #[serde(default)]
    pub researcher_only: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewBird {
    pub name: String,
    pub scientific_name: Option<String>,
    pub description: String,
    pub image_url: String,
    pub wingspan: Option<String>,
    pub habitat: Option<String>,
    pub diet: Option<String>,
    pub lifespan: Option<String>,
    pub conservation_status: Option<String>,
    #[serde(default)]
    pub researcher_only: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAnimal {
    pub name: String,
    pub scientific_name: Option<String>,
    pub description: String,
    pub image_url: String,
    pub weight: Option<String>,
    pub length: Option<String>,
    pub habitat: Option<String>,
    pub diet: Option<String>,
    pub conservation_status: Option<String>,
    #[serde(default)]
    pub researcher_only: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTribe {
    pub name: String,
    pub region: Option<String>,
    pub description: String,
    pub image_url: String,
    pub population: Option<String>,
    pub language: Option<String>,
    pub traditional_practices: Option<String>,
    pub challenges: Option<String>,
    #[serde(default)]
    pub researcher_only: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTerrain {
    pub name: String,
    pub r#type: Option<String>,
    pub description: String,
    pub image_url: String,
    pub elevation: Option<String>,
    pub climate: Option<String>,
    pub biodiversity: Option<String>,
    pub ecological_function: Option<String>,
    #[serde(default)]
    pub researcher_only: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_coerces_unknown_to_guest() {
        assert_eq!(UserRole::parse("researcher"), UserRole::Researcher);
        assert_eq!(UserRole::parse("dora"), UserRole::Dora);
        assert_eq!(UserRole::parse("guest"), UserRole::Guest);
        assert_eq!(UserRole::parse("admin"), UserRole::Guest);
        assert_eq!(UserRole::parse(""), UserRole::Guest);
    }

    #[test]
    fn test_category_parse_round_trip() {
        for category in Category::ALL {
            assert_eq!(Category::parse(category.table_name()), Some(category));
        }
        assert_eq!(Category::parse("rivers"), None);
    }

    #[test]
    fn test_category_serde_lowercase() {
        let json = serde_json::to_string(&Category::Trees).unwrap();
        assert_eq!(json, "\"trees\"");

        let parsed: Category = serde_json::from_str("\"terrain\"").unwrap();
        assert_eq!(parsed, Category::Terrain);
    }
}
