//! # Notification Dispatch
//!
//! The boundary between the services and whatever delivers e-mail.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  service ──► OutboundMessage ──► dyn Notifier                           │
//! │                                     │                                   │
//! │                                     ├── OutboxNotifier                  │
//! │                                     │   INSERT notification_outbox      │
//! │                                     │   (mail relay drains it)          │
//! │                                     │                                   │
//! │                                     └── LogNotifier                     │
//! │                                         tracing only                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Alerts go through [`dispatch`], which logs and swallows failures so a
//! broken mail path never fails a sale or an approval.
//!
//! The outbox is drained with [`relay_pending`], which hands each queued
//! entry to a delivering `Notifier` and records the outcome.

use async_trait::async_trait;
use smartpos_core::notification::OutboundMessage;
use smartpos_core::NotificationEntry;
use smartpos_db::{DbError, NotificationOutboxRepository};
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Failed to queue notification: {0}")]
    Queue(#[from] DbError),

    #[error("Notification rejected: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &OutboundMessage) -> Result<(), NotifyError>;
}

/// Persists messages to the notification outbox.
pub struct OutboxNotifier {
    outbox: NotificationOutboxRepository,
}

impl OutboxNotifier {
    pub fn new(outbox: NotificationOutboxRepository) -> Self {
        OutboxNotifier { outbox }
    }
}

#[async_trait]
impl Notifier for OutboxNotifier {
    async fn send(&self, message: &OutboundMessage) -> Result<(), NotifyError> {
        let entry = self.outbox.queue(message).await?;
        info!(
            notification_id = entry.id,
            kind = ?entry.kind,
            recipient = %entry.recipient,
            "Notification queued"
        );
        Ok(())
    }
}

/// Logs messages instead of delivering them.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, message: &OutboundMessage) -> Result<(), NotifyError> {
        info!(
            kind = ?message.kind,
            recipient = %message.recipient,
            cc = ?message.cc,
            subject = %message.subject,
            "Notification (log only)"
        );
        Ok(())
    }
}

/// Sends `message`, logging instead of returning any failure.
pub async fn dispatch(notifier: &dyn Notifier, message: &OutboundMessage) {
    if let Err(e) = notifier.send(message).await {
        warn!(
            error = %e,
            kind = ?message.kind,
            recipient = %message.recipient,
            "Failed to send notification"
        );
    }
}

// =============================================================================
// Outbox Relay
// =============================================================================

/// Outcome of one [`relay_pending`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Delivers up to `limit` queued messages through `transport`.
///
/// Each entry is marked sent or failed as soon as its attempt finishes, so
/// an interrupted pass leaves the remainder pending for the next one.
pub async fn relay_pending(
    outbox: &NotificationOutboxRepository,
    transport: &dyn Notifier,
    limit: i64,
) -> Result<RelayReport, NotifyError> {
    let mut report = RelayReport::default();

    for entry in outbox.get_pending(limit).await? {
        let message = outbound(&entry);
        match transport.send(&message).await {
            Ok(()) => {
                outbox.mark_sent(entry.id).await?;
                report.delivered += 1;
            }
            Err(e) => {
                warn!(
                    notification_id = entry.id,
                    attempts = entry.attempts + 1,
                    error = %e,
                    "Notification delivery failed"
                );
                outbox.mark_failed(entry.id, &e.to_string()).await?;
                report.failed += 1;
            }
        }
    }

    debug!(delivered = report.delivered, failed = report.failed, "Outbox relay pass finished");
    Ok(report)
}

fn outbound(entry: &NotificationEntry) -> OutboundMessage {
    OutboundMessage {
        kind: entry.kind,
        recipient: entry.recipient.clone(),
        cc: entry.cc.clone(),
        subject: entry.subject.clone(),
        body: entry.body.clone(),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Keeps every message it is handed; optionally fails them all.
    #[derive(Default)]
    pub struct RecordingNotifier {
        pub fail: bool,
        sent: Mutex<Vec<OutboundMessage>>,
    }

    impl RecordingNotifier {
        pub fn failing() -> Self {
            RecordingNotifier {
                fail: true,
                ..Default::default()
            }
        }

        pub fn sent(&self) -> Vec<OutboundMessage> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, message: &OutboundMessage) -> Result<(), NotifyError> {
            if self.fail {
                return Err(NotifyError::Rejected("relay offline".to_string()));
            }
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingNotifier;
    use super::*;
    use smartpos_core::NotificationKind;
    use smartpos_db::{Database, DbConfig};

    fn message() -> OutboundMessage {
        OutboundMessage {
            kind: NotificationKind::Receipt,
            recipient: "customer@example.com".to_string(),
            cc: None,
            subject: "Your receipt RCP-000001".to_string(),
            body: "Thanks".to_string(),
        }
    }

    #[tokio::test]
    async fn test_outbox_notifier_queues() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let notifier = OutboxNotifier::new(db.notifications());

        notifier.send(&message()).await.unwrap();

        let pending = db.notifications().get_pending(10).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].recipient, "customer@example.com");
    }

    #[tokio::test]
    async fn test_relay_marks_outcome_and_retries() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let outbox = db.notifications();
        let queued = OutboxNotifier::new(db.notifications());
        queued.send(&message()).await.unwrap();

        let offline = RecordingNotifier::failing();
        let report = relay_pending(&outbox, &offline, 10).await.unwrap();
        assert_eq!(report, RelayReport { delivered: 0, failed: 1 });

        let pending = outbox.get_pending(10).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].attempts, 1);
        assert!(pending[0].last_error.as_deref().unwrap().contains("relay offline"));

        let online = RecordingNotifier::default();
        let report = relay_pending(&outbox, &online, 10).await.unwrap();
        assert_eq!(report, RelayReport { delivered: 1, failed: 0 });
        assert_eq!(online.sent(), vec![message()]);
        assert_eq!(outbox.count_pending().await.unwrap(), 0);

        let entry = outbox.get_by_id(pending[0].id).await.unwrap().unwrap();
        assert_eq!(entry.attempts, 2);
        assert!(entry.sent_at.is_some());
        assert!(entry.last_error.is_none());
    }

    #[tokio::test]
    async fn test_dispatch_swallows_failures() {
        let notifier = RecordingNotifier::failing();
        dispatch(&notifier, &message()).await;
        assert!(notifier.sent().is_empty());

        let notifier = RecordingNotifier::default();
        dispatch(&notifier, &message()).await;
        assert_eq!(notifier.sent().len(), 1);
    }
}
