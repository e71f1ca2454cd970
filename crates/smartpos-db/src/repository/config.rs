//! # System Configuration Repository
//!
//! Key/value store settings (store name, address, tax rate, currency,
//! receipt footer). Writes are upserts keyed on `key`.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use smartpos_core::{ConfigKey, SystemConfig};

const CONFIG_COLUMNS: &str = "id, key, value, updated_by, created_at, updated_at";

/// Repository for system configuration.
#[derive(Debug, Clone)]
pub struct ConfigRepository {
    pool: SqlitePool,
}

impl ConfigRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ConfigRepository { pool }
    }

    /// All stored entries ordered by key.
    pub async fn list(&self) -> DbResult<Vec<SystemConfig>> {
        let sql = format!("SELECT {} FROM system_configs ORDER BY key ASC", CONFIG_COLUMNS);
        let entries = sqlx::query_as::<_, SystemConfig>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(entries)
    }

    pub async fn get(&self, key: ConfigKey) -> DbResult<Option<SystemConfig>> {
        let sql = format!("SELECT {} FROM system_configs WHERE key = ?1", CONFIG_COLUMNS);
        let entry = sqlx::query_as::<_, SystemConfig>(&sql)
            .bind(key.as_str())
            .fetch_optional(&self.pool)
            .await?;

        Ok(entry)
    }

    /// Inserts or replaces the value for `key`.
    pub async fn set(&self, key: ConfigKey, value: &str, user_id: i64) -> DbResult<SystemConfig> {
        debug!(key = %key, user_id, "Setting system config");

        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO system_configs (key, value, updated_by, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?4)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_by = excluded.updated_by,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key.as_str())
        .bind(value)
        .bind(user_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get(key)
            .await?
            .ok_or_else(|| DbError::not_found("SystemConfig", key))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::database;

    #[tokio::test]
    async fn test_set_is_an_upsert() {
        let db = database().await;
        let repo = db.configs();

        let first = repo.set(ConfigKey::StoreName, "Corner Shop", 1).await.unwrap();
        let second = repo.set(ConfigKey::StoreName, "Corner Shop II", 2).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.value, "Corner Shop II");
        assert_eq!(second.updated_by, 2);
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_ordered_by_key_and_get_missing() {
        let db = database().await;
        let repo = db.configs();
        repo.set(ConfigKey::TaxRate, "8.5", 1).await.unwrap();
        repo.set(ConfigKey::Currency, "USD", 1).await.unwrap();

        let keys: Vec<String> = repo.list().await.unwrap().into_iter().map(|c| c.key).collect();
        assert_eq!(keys, vec!["currency", "tax_rate"]);

        assert!(repo.get(ConfigKey::ReceiptFooter).await.unwrap().is_none());
    }
}
