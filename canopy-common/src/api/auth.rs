//! Admin API authentication via timestamp and hash validation
//!
//! Mutating admin requests carry a `timestamp` (Unix epoch ms) and a `hash`
//! (SHA-256, 64 hex chars). The hash covers the canonical JSON body with the
//! shared secret appended. The secret lives in the `settings` table under
//! `admin_shared_secret`; the special value 0 disables auth checking.
//!
//! This module contains only pure functions and database operations. The
//! HTTP middleware lives in canopy-server.

use serde_json::Value;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use std::time::{SystemTime, UNIX_EPOCH};

/// Settings key holding the admin shared secret
pub const ADMIN_SECRET_KEY: &str = "admin_shared_secret";

/// Dummy hash substituted into the body before hashing (64 zeros)
const DUMMY_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Authentication error conditions
#[derive(Debug, Clone)]
pub enum AdminAuthError {
    /// Timestamp outside acceptable window
    InvalidTimestamp {
        timestamp: i64,
        now: i64,
        reason: String,
    },

    /// Hash does not match calculated value
    InvalidHash { provided: String, calculated: String },

    /// Timestamp field missing from request
    MissingTimestamp,

    /// Hash field missing from request
    MissingHash,

    /// Database error loading shared secret
    DatabaseError(String),

    /// Failed to parse request body
    ParseError(String),
}

impl std::fmt::Display for AdminAuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdminAuthError::InvalidTimestamp { reason, .. } => {
                write!(f, "Invalid timestamp: {}", reason)
            }
            AdminAuthError::InvalidHash { .. } => write!(f, "Invalid hash"),
            AdminAuthError::MissingTimestamp => write!(f, "Missing timestamp field"),
            AdminAuthError::MissingHash => write!(f, "Missing hash field"),
            AdminAuthError::DatabaseError(err) => write!(f, "Database error: {}", err),
            AdminAuthError::ParseError(err) => write!(f, "Parse error: {}", err),
        }
    }
}

impl std::error::Error for AdminAuthError {}

/// Load the admin shared secret from the settings table
///
/// Generates and stores a new secret if none exists. The value 0 disables
/// auth checking entirely.
pub async fn load_shared_secret(db: &SqlitePool) -> Result<i64, AdminAuthError> {
    let result: Option<(String,)> =
        sqlx::query_as("SELECT value FROM settings WHERE key = ?")
            .bind(ADMIN_SECRET_KEY)
            .fetch_optional(db)
            .await
            .map_err(|e| AdminAuthError::DatabaseError(e.to_string()))?;

    match result {
        Some((value,)) => value
            .parse::<i64>()
            .map_err(|e| AdminAuthError::DatabaseError(format!("Invalid i64: {}", e))),
        None => initialize_shared_secret(db).await,
    }
}

/// Generate a crypto-random non-zero secret and persist it
pub async fn initialize_shared_secret(db: &SqlitePool) -> Result<i64, AdminAuthError> {
    use rand::Rng;

    let mut rng = rand::thread_rng();
    let secret: i64 = loop {
        let val = rng.gen::<i64>();
        if val != 0 {
            break val;
        }
    };

    sqlx::query("INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)")
        .bind(ADMIN_SECRET_KEY)
        .bind(secret.to_string())
        .execute(db)
        .await
        .map_err(|e| AdminAuthError::DatabaseError(e.to_string()))?;

    Ok(secret)
}

/// Validate a request timestamp
///
/// Accepts up to 1000ms in the past (processing delay) and 1ms in the
/// future (clock drift only).
pub fn validate_timestamp(timestamp: i64) -> Result<(), AdminAuthError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis() as i64;

    let diff = now - timestamp;

    if diff > 1000 {
        return Err(AdminAuthError::InvalidTimestamp {
            timestamp,
            now,
            reason: format!("Timestamp {}ms too old (max 1000ms past)", diff),
        });
    }

    if diff < -1 {
        return Err(AdminAuthError::InvalidTimestamp {
            timestamp,
            now,
            reason: format!("Timestamp {}ms in future (max 1ms future)", diff.abs()),
        });
    }

    Ok(())
}

/// Calculate the request hash
///
/// 1. Replace the hash field with the dummy hash
/// 2. Convert to canonical JSON (sorted keys, no whitespace)
/// 3. Append the shared secret as a decimal i64 string
/// 4. SHA-256 the result, rendered as 64 hex chars
pub fn calculate_hash(json_value: &Value, shared_secret: i64) -> String {
    let mut value = json_value.clone();
    if let Some(obj) = value.as_object_mut() {
        obj.insert("hash".to_string(), Value::String(DUMMY_HASH.to_string()));
    }

    let canonical = to_canonical_json(&value);
    let to_hash = format!("{}{}", canonical, shared_secret);

    let mut hasher = Sha256::new();
    hasher.update(to_hash.as_bytes());
    let result = hasher.finalize();

    format!("{:x}", result)
}

/// Convert JSON to canonical form (sorted keys, no whitespace)
pub fn to_canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut pairs: Vec<_> = map.iter().collect();
            pairs.sort_by_key(|(k, _)| *k);
            let items: Vec<String> = pairs
                .into_iter()
                .map(|(k, v)| format!("\"{}\":{}", k, to_canonical_json(v)))
                .collect();
            format!("{{{}}}", items.join(","))
        }
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(to_canonical_json).collect();
            format!("[{}]", items.join(","))
        }
        Value::String(s) => format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
    }
}

/// Validate a provided hash against the calculated value
pub fn validate_hash(
    provided_hash: &str,
    json_value: &Value,
    shared_secret: i64,
) -> Result<(), AdminAuthError> {
    let calculated = calculate_hash(json_value, shared_secret);

    if provided_hash != calculated {
        return Err(AdminAuthError::InvalidHash {
            provided: provided_hash.to_string(),
            calculated,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now_ms() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_millis() as i64
    }

    #[test]
    fn test_valid_timestamp_accepted() {
        let now = now_ms();

        assert!(validate_timestamp(now).is_ok());
        assert!(validate_timestamp(now - 500).is_ok());
        // Boundary
        assert!(validate_timestamp(now - 1000).is_ok());
    }

    #[test]
    fn test_timestamp_too_old_rejected() {
        let now = now_ms();

        assert!(validate_timestamp(now - 1001).is_err());
        assert!(validate_timestamp(now - 5000).is_err());
    }

    #[test]
    fn test_timestamp_future_rejected() {
        let now = now_ms();

        // 1ms future is the boundary
        assert!(validate_timestamp(now + 1).is_ok());
        assert!(validate_timestamp(now + 100).is_err());
    }

    #[test]
    fn test_hash_is_deterministic_and_secret_dependent() {
        let json = serde_json::json!({
            "action": "seed-categories",
            "timestamp": 1730000000000i64,
            "hash": "dummy"
        });

        let hash = calculate_hash(&json, 123456789);
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));

        assert_eq!(hash, calculate_hash(&json, 123456789));
        assert_ne!(hash, calculate_hash(&json, 987654321));
    }

    #[test]
    fn test_canonical_json_sorted_keys_no_whitespace() {
        let json = serde_json::json!({
            "z_field": "last",
            "a_field": "first",
            "m_field": 42
        });

        let canonical = to_canonical_json(&json);

        let a_pos = canonical.find("\"a_field\"").unwrap();
        let m_pos = canonical.find("\"m_field\"").unwrap();
        let z_pos = canonical.find("\"z_field\"").unwrap();
        assert!(a_pos < m_pos);
        assert!(m_pos < z_pos);

        assert!(!canonical.contains(' '));
        assert!(!canonical.contains('\n'));
    }

    #[test]
    fn test_valid_hash_accepted_invalid_rejected() {
        let json = serde_json::json!({
            "action": "cleanup",
            "timestamp": 1730000000000i64,
            "hash": "dummy"
        });

        let secret = 42i64;
        let calculated = calculate_hash(&json, secret);

        assert!(validate_hash(&calculated, &json, secret).is_ok());
        assert!(validate_hash(DUMMY_HASH, &json, secret).is_err());
    }

    #[tokio::test]
    async fn test_load_shared_secret_initializes_when_missing() {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        sqlx::query("CREATE TABLE settings (key TEXT PRIMARY KEY, value TEXT)")
            .execute(&pool)
            .await
            .unwrap();

        let secret = load_shared_secret(&pool).await.unwrap();
        assert_ne!(secret, 0);

        // Second load returns the stored value
        let again = load_shared_secret(&pool).await.unwrap();
        assert_eq!(secret, again);
    }

    #[tokio::test]
    async fn test_load_shared_secret_zero_disables() {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        sqlx::query("CREATE TABLE settings (key TEXT PRIMARY KEY, value TEXT)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO settings (key, value) VALUES (?, '0')")
            .bind(ADMIN_SECRET_KEY)
            .execute(&pool)
            .await
            .unwrap();

        let secret = load_shared_secret(&pool).await.unwrap();
        assert_eq!(secret, 0);
    }
}
