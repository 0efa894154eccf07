//! Bounded window of recently processed message ids.

use std::collections::{HashSet, VecDeque};

use heartline_core::types::MessageId;

/// Remembers the last `capacity` message ids in arrival order.
///
/// Feed delivery is at-least-once; an id seen inside the window is a
/// duplicate. Once the window is full the oldest id is forgotten.
#[derive(Debug)]
pub struct RecentIds {
    /// Maximum number of ids retained
    capacity: usize,
    /// Arrival order, oldest at the front
    order: VecDeque<MessageId>,
    /// Membership index
    seen: HashSet<MessageId>,
}

impl RecentIds {
    /// Create a window that retains `capacity` ids (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity),
            seen: HashSet::with_capacity(capacity),
        }
    }

    /// Record `id`. Returns `true` if it was not already in the window.
    pub fn insert(&mut self, id: &MessageId) -> bool {
        if self.seen.contains(id) {
            return false;
        }

        if self.order.len() == self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.seen.remove(&evicted);
            }
        }

        self.order.push_back(id.clone());
        self.seen.insert(id.clone());
        true
    }

    /// Whether `id` is inside the window.
    pub fn contains(&self, id: &MessageId) -> bool {
        self.seen.contains(id)
    }

    /// Number of ids currently retained.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether no ids are retained.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_rejected() {
        let mut ids = RecentIds::new(10);
        let m1 = MessageId::new("m1");
        assert!(ids.insert(&m1));
        assert!(!ids.insert(&m1));
        assert_eq!(ids.len(), 1);
    }

    #[test]
    fn test_oldest_evicted_when_full() {
        let mut ids = RecentIds::new(2);
        let (a, b, c) = (MessageId::new("a"), MessageId::new("b"), MessageId::new("c"));
        ids.insert(&a);
        ids.insert(&b);
        ids.insert(&c);

        assert!(!ids.contains(&a));
        assert!(ids.contains(&b));
        assert!(ids.contains(&c));
        // Forgotten ids are accepted again
        assert!(ids.insert(&a));
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let mut ids = RecentIds::new(0);
        assert!(ids.insert(&MessageId::new("x")));
        assert_eq!(ids.len(), 1);
    }
}
