//! User profile data access
//!
//! Profiles mirror identities validated by the external provider. The
//! server never checks credentials itself; it only stores the asserted
//! identity and the role used for content gating.

use canopy_common::db::models::{UserProfile, UserRole};
use canopy_common::{Error, Result};
use sqlx::SqlitePool;

const PROFILE_COLS: &str = "id, email, name, user_type";

/// Fetch a user profile by id
pub async fn get_profile(db: &SqlitePool, user_id: &str) -> Result<Option<UserProfile>> {
    if user_id.is_empty() {
        return Err(Error::InvalidInput("User ID is required".to_string()));
    }

    let profile = sqlx::query_as::<_, UserProfile>(&format!(
        "SELECT {} FROM users WHERE id = ?",
        PROFILE_COLS
    ))
    .bind(user_id)
    .fetch_optional(db)
    .await?;

    Ok(profile)
}

/// Insert or update a user profile
///
/// Invalid role strings coerce to `guest` rather than failing.
pub async fn upsert_profile(
    db: &SqlitePool,
    user_id: &str,
    email: &str,
    name: Option<&str>,
    user_type: &str,
) -> Result<UserProfile> {
    if user_id.is_empty() || email.is_empty() {
        return Err(Error::InvalidInput(
            "User ID and email are required".to_string(),
        ));
    }

    let role = UserRole::parse(user_type);

    sqlx::query(
        r#"
        INSERT INTO users (id, email, name, user_type)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            email = excluded.email,
            name = excluded.name,
            user_type = excluded.user_type
        "#,
    )
    .bind(user_id)
    .bind(email)
    .bind(name)
    .bind(role.as_str())
    .execute(db)
    .await?;

    Ok(UserProfile {
        id: user_id.to_string(),
        email: email.to_string(),
        name: name.map(str::to_string),
        user_type: role.as_str().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use canopy_common::db::init::init_schema;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        init_schema(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_get_profile_not_found() {
        let pool = setup_test_db().await;
        let profile = get_profile(&pool, "nope").await.unwrap();
        assert!(profile.is_none());
    }

    #[tokio::test]
    async fn test_get_profile_empty_id_rejected() {
        let pool = setup_test_db().await;
        assert!(get_profile(&pool, "").await.is_err());
    }

    #[tokio::test]
    async fn test_upsert_inserts_then_updates() {
        let pool = setup_test_db().await;

        upsert_profile(&pool, "u1", "dora@example.com", Some("Dora"), "dora")
            .await
            .unwrap();

        let profile = get_profile(&pool, "u1").await.unwrap().unwrap();
        assert_eq!(profile.email, "dora@example.com");
        assert_eq!(profile.user_type, "dora");

        // Promotion to researcher updates in place
        upsert_profile(&pool, "u1", "dora@example.com", Some("Dora"), "researcher")
            .await
            .unwrap();

        let profile = get_profile(&pool, "u1").await.unwrap().unwrap();
        assert_eq!(profile.user_type, "researcher");
        assert!(profile.role().is_researcher());

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_upsert_coerces_invalid_role_to_guest() {
        let pool = setup_test_db().await;

        let profile = upsert_profile(&pool, "u2", "x@example.com", None, "superadmin")
            .await
            .unwrap();
        assert_eq!(profile.user_type, "guest");

        let stored: String = sqlx::query_scalar("SELECT user_type FROM users WHERE id = 'u2'")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(stored, "guest");
    }

    #[tokio::test]
    async fn test_upsert_requires_id_and_email() {
        let pool = setup_test_db().await;
        assert!(upsert_profile(&pool, "", "x@example.com", None, "guest")
            .await
            .is_err());
        assert!(upsert_profile(&pool, "u3", "", None, "guest").await.is_err());
    }
}
