//! Idempotent seed data
//!
//! Every seed function guards on a pre-existing-row count so re-running a
//! seed endpoint never duplicates rows.

use canopy_common::db::models::{Category, NewExplorerItem};
use canopy_common::Result;
use serde_json::json;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::db::{items, points};

/// Seed the initial explorer points (map markers)
///
/// Returns the number of points inserted (0 when already seeded).
pub async fn seed_explorer_points(db: &SqlitePool) -> Result<u64> {
    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM explorer_points")
        .fetch_one(db)
        .await?;

    if existing > 0 {
        info!("Explorer points already exist, skipping seed");
        return Ok(0);
    }

    let seed_points = [
        (
            "Explore Trees",
            "Discover the magnificent trees that form the rainforest canopy. These giants provide homes for countless species and create the unique rainforest ecosystem.",
            "Leaf",
            "20",
            "25",
        ),
        (
            "Tropical Birds",
            "The rainforest is home to thousands of bird species, including toucans, macaws, and hummingbirds.",
            "Bird",
            "70",
            "15",
        ),
        (
            "Explore Animals",
            "From colorful butterflies to exotic mammals, the rainforest teems with incredible animal life. Discover the amazing diversity of rainforest creatures.",
            "Bug",
            "85",
            "40",
        ),
        (
            "Tribes",
            "Indigenous tribes have lived in harmony with the rainforest for thousands of years. Learn about their traditional knowledge and sustainable practices.",
            "Users",
            "15",
            "60",
        ),
        (
            "Explore Terrain",
            "The rainforest terrain varies from flat floodplains to steep hillsides. Explore how the landscape shapes the unique environments within the rainforest.",
            "Droplets",
            "60",
            "50",
        ),
    ];

    for (title, description, icon, x, y) in seed_points {
        points::insert_point(db, title, description, icon, x, y).await?;
    }

    info!("Explorer points seeded");
    Ok(seed_points.len() as u64)
}

/// Seed sample explorer items across all categories
pub async fn seed_explorer_items(db: &SqlitePool) -> Result<u64> {
    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM explorer_items")
        .fetch_one(db)
        .await?;

    if existing > 0 {
        info!("Explorer items already exist, skipping seed");
        return Ok(0);
    }

    let seed_items = vec![
        NewExplorerItem {
            name: "Giant Kapok Tree".to_string(),
            scientific_name: Some("Ceiba pentandra".to_string()),
            description: "The giant kapok tree is one of the largest trees in the rainforest, reaching heights of up to 70 meters.".to_string(),
            image_url: "/rainforest-giant.png".to_string(),
            details: json!({
                "Height": "Up to 70 meters (230 feet)",
                "Trunk Diameter": "3-4 meters (10-13 feet)",
                "Lifespan": "500-1000 years"
            }),
            category: Category::Trees,
            researcher_only: false,
        },
        NewExplorerItem {
            name: "Mahogany".to_string(),
            scientific_name: Some("Swietenia macrophylla".to_string()),
            description: "Mahogany is a highly valued hardwood tree known for its beautiful reddish-brown timber.".to_string(),
            image_url: "/rainforest-mahogany.png".to_string(),
            details: json!({
                "Height": "30-40 meters (100-130 feet)",
                "Conservation Status": "Vulnerable - protected under CITES Appendix II"
            }),
            category: Category::Trees,
            researcher_only: true,
        },
        NewExplorerItem {
            name: "Toco Toucan".to_string(),
            scientific_name: Some("Ramphastos toco".to_string()),
            description: "The Toco Toucan is known for its enormous, colorful bill. These birds are fruit-eaters and play an important role in seed dispersal.".to_string(),
            image_url: "/rainforest-toucan.png".to_string(),
            details: json!({
                "Bill Length": "Up to 20 cm (8 inches)",
                "Wingspan": "55-60 cm (22-24 inches)",
                "Habitat": "Forest canopy and edges"
            }),
            category: Category::Birds,
            researcher_only: false,
        },
        NewExplorerItem {
            name: "Scarlet Macaw".to_string(),
            scientific_name: Some("Ara macao".to_string()),
            description: "The Scarlet Macaw is one of the most spectacular parrots, with bright red, yellow, and blue plumage.".to_string(),
            image_url: "/scarlet-flight.png".to_string(),
            details: json!({
                "Wingspan": "Up to 1 meter (3.3 feet)",
                "Lifespan": "40-50 years in the wild, up to 75 in captivity"
            }),
            category: Category::Birds,
            researcher_only: true,
        },
        NewExplorerItem {
            name: "Jaguar".to_string(),
            scientific_name: Some("Panthera onca".to_string()),
            description: "The jaguar is the largest cat in the Americas and the third-largest in the world.".to_string(),
            image_url: "/rainforest-jaguar.png".to_string(),
            details: json!({
                "Weight": "56-96 kg (124-212 lbs)",
                "Hunting Style": "Solitary ambush predator"
            }),
            category: Category::Animals,
            researcher_only: false,
        },
        NewExplorerItem {
            name: "Three-toed Sloth".to_string(),
            scientific_name: Some("Bradypus variegatus".to_string()),
            description: "The three-toed sloth is one of the slowest-moving animals on Earth, spending most of its life hanging upside-down in the canopy.".to_string(),
            image_url: "/sleepy-sloth-hangout.png".to_string(),
            details: json!({
                "Speed": "0.24 km/h (0.15 mph) maximum",
                "Sleep": "15-18 hours per day"
            }),
            category: Category::Animals,
            researcher_only: true,
        },
        NewExplorerItem {
            name: "Yanomami".to_string(),
            scientific_name: None,
            description: "The Yanomami are one of the largest relatively isolated indigenous groups in South America.".to_string(),
            image_url: "/yanomami-shabono.png".to_string(),
            details: json!({
                "Population": "Approximately 35,000 people",
                "Housing": "Communal roundhouses called shabonos"
            }),
            category: Category::Tribes,
            researcher_only: false,
        },
        NewExplorerItem {
            name: "Kayapo".to_string(),
            scientific_name: None,
            description: "The Kayapo people are indigenous to the Amazon rainforest in Brazil, known for their fierce protection of their traditional lands.".to_string(),
            image_url: "/kayapo-warrior.png".to_string(),
            details: json!({
                "Territory": "Over 11 million acres of legally recognized land",
                "Ethnographic Notes": "Maintain knowledge of over 300 medicinal plants"
            }),
            category: Category::Tribes,
            researcher_only: true,
        },
        NewExplorerItem {
            name: "Emergent Layer".to_string(),
            scientific_name: None,
            description: "The emergent layer is the topmost layer of the rainforest, where the tallest trees rise above the dense canopy below.".to_string(),
            image_url: "/rainforest-canopy.jpg".to_string(),
            details: json!({
                "Height": "45-70 meters (150-230 feet) above ground",
                "Biodiversity": "Home to eagles, butterflies, bats, and certain monkey species"
            }),
            category: Category::Terrain,
            researcher_only: false,
        },
        NewExplorerItem {
            name: "Rainforest Waterfall".to_string(),
            scientific_name: None,
            description: "Waterfalls are dramatic features of rainforest landscapes, creating unique microhabitats with high humidity and constant mist.".to_string(),
            image_url: "/rainforest-waterfall.jpg".to_string(),
            details: json!({
                "Microclimate": "Creates zones of constant mist and high humidity",
                "Flora": "Supports mosses, ferns, and certain orchids"
            }),
            category: Category::Terrain,
            researcher_only: true,
        },
    ];

    let count = seed_items.len() as u64;
    for item in &seed_items {
        items::create_item(db, item).await?;
    }

    info!("Explorer items seeded ({} rows)", count);
    Ok(count)
}

/// Create the category tables if missing and seed two sample rows each
///
/// Tables that already hold data are left untouched.
pub async fn seed_categories(db: &SqlitePool) -> Result<()> {
    canopy_common::db::init::create_category_tables(db).await?;

    seed_trees(db).await?;
    seed_birds(db).await?;
    seed_animals(db).await?;
    seed_tribes(db).await?;
    seed_terrain(db).await?;

    info!("Category tables created and seeded");
    Ok(())
}

async fn table_is_empty(db: &SqlitePool, table: &str) -> Result<bool> {
    let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(db)
        .await?;
    Ok(count == 0)
}

async fn seed_trees(db: &SqlitePool) -> Result<()> {
    if !table_is_empty(db, "trees").await? {
        return Ok(());
    }

    let rows = [
        (
            "Giant Kapok Tree",
            Some("Ceiba pentandra"),
            "The giant kapok tree is one of the largest trees in the rainforest, reaching heights of up to 70 meters.",
            "/rainforest-giant.png",
            Some("Up to 70 meters (230 feet)"),
            Some("3-4 meters (10-13 feet)"),
            Some("500-1000 years"),
            Some("The kapok tree serves as a habitat for countless species, from epiphytes growing on its branches to animals nesting in its hollows."),
            Some("Least Concern"),
            false,
        ),
        (
            "Mahogany",
            Some("Swietenia macrophylla"),
            "Mahogany is a highly valued hardwood tree known for its beautiful reddish-brown timber.",
            "/rainforest-mahogany.png",
            Some("30-40 meters (100-130 feet)"),
            Some("1-2 meters (3-6 feet)"),
            Some("200-300 years"),
            Some("Provides habitat and food for various species"),
            Some("Vulnerable - protected under CITES Appendix II"),
            true,
        ),
    ];

    for (name, sci, desc, img, height, trunk, lifespan, role, status, gated) in rows {
        sqlx::query(
            r#"
            INSERT INTO trees (id, name, scientific_name, description, image_url, height, trunk_diameter, lifespan, ecological_role, conservation_status, researcher_only)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(name)
        .bind(sci)
        .bind(desc)
        .bind(img)
        .bind(height)
        .bind(trunk)
        .bind(lifespan)
        .bind(role)
        .bind(status)
        .bind(gated)
        .execute(db)
        .await?;
    }

    Ok(())
}

async fn seed_birds(db: &SqlitePool) -> Result<()> {
    if !table_is_empty(db, "birds").await? {
        return Ok(());
    }

    let rows = [
        (
            "Toco Toucan",
            Some("Ramphastos toco"),
            "The Toco Toucan is known for its enormous, colorful bill.",
            "/rainforest-toucan.png",
            Some("55-60 cm (22-24 inches)"),
            Some("Forest canopy and edges"),
            Some("Primarily fruits, but also insects, eggs, and small lizards"),
            Some("15-20 years"),
            Some("Least Concern"),
            false,
        ),
        (
            "Scarlet Macaw",
            Some("Ara macao"),
            "The Scarlet Macaw is one of the most spectacular parrots, with bright red, yellow, and blue plumage.",
            "/scarlet-flight.png",
            Some("Up to 1 meter (3.3 feet)"),
            Some("Tropical rainforests"),
            Some("Seeds, nuts, fruits, and berries"),
            Some("40-50 years in the wild, up to 75 in captivity"),
            Some("Least Concern"),
            true,
        ),
    ];

    for (name, sci, desc, img, wingspan, habitat, diet, lifespan, status, gated) in rows {
        sqlx::query(
            r#"
            INSERT INTO birds (id, name, scientific_name, description, image_url, wingspan, habitat, diet, lifespan, conservation_status, researcher_only)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(name)
        .bind(sci)
        .bind(desc)
        .bind(img)
        .bind(wingspan)
        .bind(habitat)
        .bind(diet)
        .bind(lifespan)
        .bind(status)
        .bind(gated)
        .execute(db)
        .await?;
    }

    Ok(())
}

async fn seed_animals(db: &SqlitePool) -> Result<()> {
    if !table_is_empty(db, "animals").await? {
        return Ok(());
    }

    let rows = [
        (
            "Jaguar",
            Some("Panthera onca"),
            "The jaguar is the largest cat in the Americas and the third-largest in the world.",
            "/rainforest-jaguar.png",
            Some("56-96 kg (124-212 lbs)"),
            Some("1.12-1.85 meters (3.7-6.1 feet)"),
            Some("Tropical rainforests, swamps, and grasslands"),
            Some("Carnivorous - deer, capybaras, tapirs, and other mammals"),
            Some("Near Threatened"),
            false,
        ),
        (
            "Three-toed Sloth",
            Some("Bradypus variegatus"),
            "The three-toed sloth is one of the slowest-moving animals on Earth.",
            "/sleepy-sloth-hangout.png",
            Some("3.5-4.5 kg (8-10 lbs)"),
            Some("45-60 cm (18-24 inches)"),
            Some("Tropical rainforest canopies"),
            Some("Leaves, buds, and tender shoots"),
            Some("Least Concern"),
            true,
        ),
    ];

    for (name, sci, desc, img, weight, length, habitat, diet, status, gated) in rows {
        sqlx::query(
            r#"
            INSERT INTO animals (id, name, scientific_name, description, image_url, weight, length, habitat, diet, conservation_status, researcher_only)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(name)
        .bind(sci)
        .bind(desc)
        .bind(img)
        .bind(weight)
        .bind(length)
        .bind(habitat)
        .bind(diet)
        .bind(status)
        .bind(gated)
        .execute(db)
        .await?;
    }

    Ok(())
}

async fn seed_tribes(db: &SqlitePool) -> Result<()> {
    if !table_is_empty(db, "tribes").await? {
        return Ok(());
    }

    let rows = [
        (
            "Yanomami",
            Some("Amazon rainforest on the border between Venezuela and Brazil"),
            "The Yanomami are one of the largest relatively isolated indigenous groups in South America.",
            "/yanomami-shabono.png",
            Some("Approximately 35,000 people"),
            Some("Yanomami"),
            Some("Hunting, fishing, gathering, and slash-and-burn agriculture"),
            Some("Facing threats from illegal gold mining, disease, and deforestation"),
            false,
        ),
        (
            "Kayapo",
            Some("Amazon rainforest in Brazil"),
            "The Kayapo people are indigenous to the Amazon rainforest in Brazil.",
            "/kayapo-warrior.png",
            Some("Around 8,500 people"),
            Some("Kayapo"),
            Some("Hunting, fishing, and sustainable agriculture"),
            Some("Land encroachment, illegal logging, and mining"),
            true,
        ),
    ];

    for (name, region, desc, img, population, language, practices, challenges, gated) in rows {
        sqlx::query(
            r#"
            INSERT INTO tribes (id, name, region, description, image_url, population, language, traditional_practices, challenges, researcher_only)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(name)
        .bind(region)
        .bind(desc)
        .bind(img)
        .bind(population)
        .bind(language)
        .bind(practices)
        .bind(challenges)
        .bind(gated)
        .execute(db)
        .await?;
    }

    Ok(())
}

async fn seed_terrain(db: &SqlitePool) -> Result<()> {
    if !table_is_empty(db, "terrain").await? {
        return Ok(());
    }

    let rows = [
        (
            "Emergent Layer",
            Some("Forest layer"),
            "The emergent layer is the topmost layer of the rainforest, where the tallest trees rise above the dense canopy below.",
            "/rainforest-canopy.jpg",
            Some("45-70 meters (150-230 feet) above ground"),
            Some("Variable, with high daytime heat and cooler nights"),
            Some("Home to eagles, butterflies, bats, and certain monkey species"),
            Some("First to capture rainfall, reducing erosion impact on lower layers"),
            false,
        ),
        (
            "Rainforest Waterfall",
            Some("Water feature"),
            "Waterfalls are dramatic features of rainforest landscapes, created where rivers flow over resistant rock ledges.",
            "/rainforest-waterfall.jpg",
            Some("Varies"),
            Some("Creates zones of constant mist and high humidity"),
            Some("Supports moisture-loving plants like mosses, ferns, and certain orchids"),
            Some("Oxygenates water and creates habitats for specialized aquatic species"),
            true,
        ),
    ];

    for (name, kind, desc, img, elevation, climate, biodiversity, function, gated) in rows {
        sqlx::query(
            r#"
            INSERT INTO terrain (id, name, type, description, image_url, elevation, climate, biodiversity, ecological_function, researcher_only)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(name)
        .bind(kind)
        .bind(desc)
        .bind(img)
        .bind(elevation)
        .bind(climate)
        .bind(biodiversity)
        .bind(function)
        .bind(gated)
        .execute(db)
        .await?;
    }

    Ok(())
}
