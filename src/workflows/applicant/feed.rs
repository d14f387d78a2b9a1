use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};

use super::domain::{NotificationId, UndoableNotification};

pub const DEFAULT_FEED_CAPACITY: usize = 32;

/// Bounded, insertion-ordered collection of undoable notifications. Purely a
/// projection of the committer and undo layers; entries leave by explicit
/// dismissal, successful undo, eviction past capacity, or caller-driven TTL
/// pruning.
#[derive(Debug)]
pub struct NotificationFeed {
    entries: VecDeque<UndoableNotification>,
    capacity: usize,
}

impl NotificationFeed {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "notification feed capacity must be non-zero");
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a notification, evicting the oldest entry once full.
    pub fn push(&mut self, notification: UndoableNotification) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(notification);
    }

    pub fn get(&self, id: NotificationId) -> Option<&UndoableNotification> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Remove one notification, returning it when present.
    pub fn remove(&mut self, id: NotificationId) -> Option<UndoableNotification> {
        let position = self.entries.iter().position(|entry| entry.id == id)?;
        self.entries.remove(position)
    }

    /// Insertion-ordered snapshot.
    pub fn snapshot(&self) -> Vec<UndoableNotification> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop entries older than `ttl`, returning how many were removed.
    /// There is no timer behind this; callers decide if and when feeds
    /// expire. Left unused, notifications live until dismissed or undone.
    pub fn prune_expired(&mut self, now: DateTime<Utc>, ttl: Duration) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| now - entry.created_at <= ttl);
        before - self.entries.len()
    }
}

impl Default for NotificationFeed {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_CAPACITY)
    }
}
