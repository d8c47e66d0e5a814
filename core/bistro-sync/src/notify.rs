//! User-facing change notifications.
//!
//! Every reconciliation that changes a collection, and every failed load or
//! write, is announced on a broadcast channel. UI layers turn these into
//! toasts; tests read them to assert what happened.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;
use tracing::trace;

/// What a notification announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Added,
    Updated,
    Removed,
    Error,
}

/// A single announcement for one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub table: String,
    /// Display name of the record, or the error message for [`NotificationKind::Error`].
    pub subject: String,
}

impl Notification {
    pub fn added(table: &str, name: &str) -> Self {
        Self::new(NotificationKind::Added, table, name)
    }

    pub fn updated(table: &str, name: &str) -> Self {
        Self::new(NotificationKind::Updated, table, name)
    }

    pub fn removed(table: &str, name: &str) -> Self {
        Self::new(NotificationKind::Removed, table, name)
    }

    pub fn error(table: &str, message: impl fmt::Display) -> Self {
        Self::new(NotificationKind::Error, table, &message.to_string())
    }

    fn new(kind: NotificationKind, table: &str, subject: &str) -> Self {
        Self {
            kind,
            table: table.to_string(),
            subject: subject.to_string(),
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            NotificationKind::Added => write!(f, "New in {}: {}", self.table, self.subject),
            NotificationKind::Updated => write!(f, "Updated in {}: {}", self.table, self.subject),
            NotificationKind::Removed => write!(f, "Removed from {}: {}", self.table, self.subject),
            NotificationKind::Error => write!(f, "Error in {}: {}", self.table, self.subject),
        }
    }
}

/// Broadcast hub for notifications. Cloning shares the channel.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Notification>,
}

impl Notifier {
    /// Creates a hub that buffers up to `capacity` notifications per
    /// lagging receiver.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    /// Publishes a notification. Having no listeners is not an error.
    pub fn publish(&self, notification: Notification) {
        trace!("Notification: {}", notification);
        let _ = self.tx.send(notification);
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(64)
    }
}
