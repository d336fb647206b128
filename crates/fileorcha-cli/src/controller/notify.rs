//! Transient, dismissible notifications.

use std::collections::VecDeque;
use std::time::Duration;

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: u64,
    pub kind: NotificationKind,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Queue of notifications that expire after a fixed time-to-live unless
/// dismissed earlier.
#[derive(Debug)]
pub struct Notifications {
    ttl: chrono::Duration,
    next_id: u64,
    entries: VecDeque<Notification>,
    /// Id of the first entry not yet handed out by `take_unseen`.
    unseen_from: u64,
}

impl Notifications {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl: chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::seconds(5)),
            next_id: 1,
            entries: VecDeque::new(),
            unseen_from: 1,
        }
    }

    pub fn push(&mut self, kind: NotificationKind, message: impl Into<String>) -> u64 {
        self.push_at(kind, message, Utc::now())
    }

    pub fn push_at(
        &mut self,
        kind: NotificationKind,
        message: impl Into<String>,
        at: DateTime<Utc>,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        let message = message.into();
        tracing::debug!(id, kind = ?kind, message = %message, "Notification");
        self.entries.push_back(Notification {
            id,
            kind,
            message,
            created_at: at,
        });
        id
    }

    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.entries.len();
        self.entries.retain(|n| n.id != id);
        self.entries.len() != before
    }

    /// Drop every notification older than the TTL at `now`.
    pub fn prune(&mut self, now: DateTime<Utc>) {
        let ttl = self.ttl;
        self.entries.retain(|n| now - n.created_at < ttl);
    }

    pub fn active(&self) -> impl Iterator<Item = &Notification> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&Notification> {
        self.entries.back()
    }

    /// Notifications pushed since the previous call, oldest first.
    pub fn take_unseen(&mut self) -> Vec<Notification> {
        let from = self.unseen_from;
        self.unseen_from = self.next_id;
        self.entries
            .iter()
            .filter(|n| n.id >= from)
            .cloned()
            .collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.unseen_from = self.next_id;
    }
}
