//! # Notification Outbox Repository
//!
//! Outbound e-mails are queued here and drained by an external mail relay.
//!
//! ## The Outbox Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  API (after commit)                                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  queue(message) ──► INSERT INTO notification_outbox (sent_at = NULL)    │
//! │                                                                         │
//! │  MAIL RELAY (separate process)                                          │
//! │  1. get_pending(limit)    WHERE sent_at IS NULL ORDER BY created_at     │
//! │  2. deliver                                                             │
//! │  3. mark_sent(id)         or   mark_failed(id, error) → attempts += 1   │
//! │                                                                         │
//! │  KEY GUARANTEES:                                                        │
//! │  • A slow or offline mail server never blocks a sale                    │
//! │  • Undelivered mail stays queued until the relay succeeds               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Relay Contract
//! The API only ever calls [`queue`](NotificationOutboxRepository::queue).
//! The relay side (`smartpos_api::notify::relay_pending`, or any process
//! sharing the database file) owns the rest:
//!
//! * an entry is pending while `sent_at` is NULL
//! * every delivery attempt ends in exactly one `mark_sent` or `mark_failed`,
//!   both of which bump `attempts`
//! * failed entries stay pending with `last_error` set and are retried on
//!   the next pass; nothing is ever deleted

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use smartpos_core::notification::OutboundMessage;
use smartpos_core::NotificationEntry;

const OUTBOX_COLUMNS: &str =
    "id, kind, recipient, cc, subject, body, attempts, last_error, created_at, sent_at";

/// Repository for the notification outbox.
#[derive(Debug, Clone)]
pub struct NotificationOutboxRepository {
    pool: SqlitePool,
}

impl NotificationOutboxRepository {
    pub fn new(pool: SqlitePool) -> Self {
        NotificationOutboxRepository { pool }
    }

    /// Queues a rendered message for delivery.
    pub async fn queue(&self, message: &OutboundMessage) -> DbResult<NotificationEntry> {
        debug!(
            kind = ?message.kind,
            recipient = %message.recipient,
            "Queuing notification"
        );

        let result = sqlx::query(
            r#"
            INSERT INTO notification_outbox (kind, recipient, cc, subject, body, attempts, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)
            "#,
        )
        .bind(message.kind)
        .bind(&message.recipient)
        .bind(&message.cc)
        .bind(&message.subject)
        .bind(&message.body)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Notification", id))
    }

    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<NotificationEntry>> {
        let sql = format!("SELECT {} FROM notification_outbox WHERE id = ?1", OUTBOX_COLUMNS);
        let entry = sqlx::query_as::<_, NotificationEntry>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(entry)
    }

    /// Undelivered messages, oldest first.
    pub async fn get_pending(&self, limit: i64) -> DbResult<Vec<NotificationEntry>> {
        let sql = format!(
            "SELECT {} FROM notification_outbox WHERE sent_at IS NULL ORDER BY created_at ASC, id ASC LIMIT ?1",
            OUTBOX_COLUMNS
        );
        let entries = sqlx::query_as::<_, NotificationEntry>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(entries)
    }

    pub async fn mark_sent(&self, id: i64) -> DbResult<()> {
        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE notification_outbox SET sent_at = ?2, attempts = attempts + 1, last_error = NULL WHERE id = ?1",
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Notification", id));
        }

        Ok(())
    }

    pub async fn mark_failed(&self, id: i64, error: &str) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE notification_outbox SET attempts = attempts + 1, last_error = ?2 WHERE id = ?1",
        )
        .bind(id)
        .bind(error)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Notification", id));
        }

        Ok(())
    }

    pub async fn count_pending(&self) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM notification_outbox WHERE sent_at IS NULL")
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::database;
    use smartpos_core::NotificationKind;

    fn message(subject: &str) -> OutboundMessage {
        OutboundMessage {
            kind: NotificationKind::LowStock,
            recipient: "manager@pos.com".to_string(),
            cc: None,
            subject: subject.to_string(),
            body: "body".to_string(),
        }
    }

    #[tokio::test]
    async fn test_queue_and_drain() {
        let db = database().await;
        let outbox = db.notifications();

        let first = outbox.queue(&message("Low Stock Alert: Mouse")).await.unwrap();
        let second = outbox.queue(&message("Low Stock Alert: Cable")).await.unwrap();
        assert_eq!(first.kind, NotificationKind::LowStock);
        assert_eq!(first.attempts, 0);
        assert!(first.sent_at.is_none());
        assert_eq!(outbox.count_pending().await.unwrap(), 2);

        outbox.mark_failed(first.id, "SMTP timeout").await.unwrap();
        outbox.mark_sent(second.id).await.unwrap();

        let pending = outbox.get_pending(10).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, first.id);
        assert_eq!(pending[0].attempts, 1);
        assert_eq!(pending[0].last_error.as_deref(), Some("SMTP timeout"));
    }

    #[tokio::test]
    async fn test_mark_unknown_entry() {
        let db = database().await;
        assert!(matches!(
            db.notifications().mark_sent(7).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
