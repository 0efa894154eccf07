//! Bounded most-recent-first toast queue.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};

use heartline_core::types::{NotificationEntry, NotificationId, PeerId};

use crate::focus::FocusObserver;

/// Visible toasts, newest at the front.
///
/// Trimming on overflow is display-only; the unread ledger is never touched
/// from here.
#[derive(Debug)]
pub struct NotificationQueue {
    /// Maximum visible entries
    capacity: usize,
    /// Entries, most recent first
    entries: Mutex<VecDeque<NotificationEntry>>,
}

impl NotificationQueue {
    /// Create a queue showing at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(VecDeque::new()),
        }
    }

    /// Insert at the front, dropping the oldest entries beyond capacity.
    pub fn push(&self, entry: NotificationEntry) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.push_front(entry);
        if entries.len() > self.capacity {
            let dropped = entries.len() - self.capacity;
            entries.truncate(self.capacity);
            tracing::trace!(dropped, "Toast queue trimmed");
        }
    }

    /// Dismiss one entry. Returns whether it was visible.
    pub fn remove(&self, id: NotificationId) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|e| e.id != id);
        entries.len() != before
    }

    /// Dismiss every entry for `peer`.
    pub fn remove_peer(&self, peer: &PeerId) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.retain(|e| &e.peer != peer);
    }

    /// Dismiss everything.
    pub fn clear(&self) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.clear();
    }

    /// Remove entries created more than `max_age` before `now`.
    ///
    /// Meant to be driven by a periodic timer owned by the host.
    pub fn sweep(&self, now: DateTime<Utc>, max_age: Duration) -> usize {
        let Ok(max_age) = chrono::Duration::from_std(max_age) else {
            return 0;
        };
        let cutoff = now - max_age;

        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|e| e.created_at >= cutoff);
        let removed = before - entries.len();
        if removed > 0 {
            tracing::debug!(removed, "Swept stale toasts");
        }
        removed
    }

    /// Snapshot of visible entries, most recent first.
    pub fn entries(&self) -> Vec<NotificationEntry> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.iter().cloned().collect()
    }

    /// Number of visible entries.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Whether nothing is visible.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum visible entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl FocusObserver for NotificationQueue {
    fn conversation_opened(&self, peer: &PeerId) {
        self.remove_peer(peer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toast(peer: &str, message: &str, created_at: DateTime<Utc>) -> NotificationEntry {
        NotificationEntry {
            id: NotificationId::new(),
            peer: PeerId::new(peer),
            display_name: peer.to_string(),
            display_photo: None,
            message: message.to_string(),
            created_at,
        }
    }

    #[test]
    fn test_push_keeps_three_most_recent() {
        let queue = NotificationQueue::new(3);
        let now = Utc::now();
        for i in 1..=5 {
            queue.push(toast("peerA", &format!("n{i}"), now));
        }

        let messages: Vec<_> = queue.entries().into_iter().map(|e| e.message).collect();
        assert_eq!(messages, vec!["n5", "n4", "n3"]);
    }

    #[test]
    fn test_remove_and_clear() {
        let queue = NotificationQueue::new(3);
        let first = toast("peerA", "a", Utc::now());
        let id = first.id;
        queue.push(first);
        queue.push(toast("peerB", "b", Utc::now()));

        assert!(queue.remove(id));
        assert!(!queue.remove(id));
        assert_eq!(queue.len(), 1);

        queue.clear();
        assert!(queue.is_empty());
    }

    #[test]
    fn test_sweep_removes_old_entries() {
        let queue = NotificationQueue::new(3);
        let now = Utc::now();
        queue.push(toast("peerA", "stale", now - chrono::Duration::minutes(6)));
        queue.push(toast("peerB", "fresh", now - chrono::Duration::minutes(1)));

        let removed = queue.sweep(now, Duration::from_secs(300));
        assert_eq!(removed, 1);
        assert_eq!(queue.entries()[0].message, "fresh");
    }

    #[test]
    fn test_opening_conversation_dismisses_its_toasts() {
        let queue = NotificationQueue::new(3);
        queue.push(toast("peerA", "a1", Utc::now()));
        queue.push(toast("peerB", "b1", Utc::now()));
        queue.push(toast("peerA", "a2", Utc::now()));

        queue.conversation_opened(&PeerId::new("peerA"));

        let peers: Vec<_> = queue.entries().into_iter().map(|e| e.peer).collect();
        assert_eq!(peers, vec![PeerId::new("peerB")]);
    }

    #[test]
    fn test_unbounded_capacity_does_not_overflow() {
        let queue = NotificationQueue::new(usize::MAX);
        for i in 0..4 {
            queue.push(toast("peerA", &format!("n{i}"), Utc::now()));
        }
        assert_eq!(queue.len(), 4);
        assert_eq!(queue.capacity(), usize::MAX);
    }
}
