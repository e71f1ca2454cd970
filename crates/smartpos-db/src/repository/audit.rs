//! # Audit Repository
//!
//! Append-only trail of state-changing operations. There is no update or
//! delete here on purpose; the table only grows.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use smartpos_core::{AuditAction, AuditEntity, AuditLog};

const AUDIT_COLUMNS: &str = "id, user_id, action, entity, entity_id, changes, timestamp";

/// An audit entry before it is persisted.
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub user_id: i64,
    pub action: AuditAction,
    pub entity: AuditEntity,
    pub entity_id: Option<i64>,
    pub changes: Option<serde_json::Value>,
}

impl NewAuditEntry {
    pub fn new(user_id: i64, action: AuditAction, entity: AuditEntity) -> Self {
        NewAuditEntry {
            user_id,
            action,
            entity,
            entity_id: None,
            changes: None,
        }
    }

    pub fn entity_id(mut self, id: i64) -> Self {
        self.entity_id = Some(id);
        self
    }

    pub fn changes(mut self, changes: serde_json::Value) -> Self {
        self.changes = Some(changes);
        self
    }
}

/// Repository for audit log operations.
#[derive(Debug, Clone)]
pub struct AuditRepository {
    pool: SqlitePool,
}

impl AuditRepository {
    pub fn new(pool: SqlitePool) -> Self {
        AuditRepository { pool }
    }

    /// Appends an entry. `changes` is stored as serialized JSON text.
    pub async fn record(&self, entry: &NewAuditEntry) -> DbResult<AuditLog> {
        debug!(
            user_id = entry.user_id,
            action = ?entry.action,
            entity = ?entry.entity,
            entity_id = ?entry.entity_id,
            "Recording audit entry"
        );

        let changes = entry
            .changes
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let result = sqlx::query(
            r#"
            INSERT INTO audit_logs (user_id, action, entity, entity_id, changes, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(entry.user_id)
        .bind(entry.action)
        .bind(entry.entity)
        .bind(entry.entity_id)
        .bind(changes)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        let sql = format!("SELECT {} FROM audit_logs WHERE id = ?1", AUDIT_COLUMNS);
        sqlx::query_as::<_, AuditLog>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("AuditLog", id))
    }

    /// Entries newest first, optionally for one entity type.
    pub async fn list(
        &self,
        entity: Option<AuditEntity>,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<AuditLog>> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM audit_logs", AUDIT_COLUMNS));
        if let Some(entity) = entity {
            builder.push(" WHERE entity = ").push_bind(entity);
        }
        builder
            .push(" ORDER BY timestamp DESC, id DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let logs = builder
            .build_query_as::<AuditLog>()
            .fetch_all(&self.pool)
            .await?;

        Ok(logs)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM audit_logs")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
