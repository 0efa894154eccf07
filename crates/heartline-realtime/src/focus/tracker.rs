//! Focus tracker — the single process-wide "open conversation" value.

use std::sync::{Mutex, Weak};

use heartline_core::types::PeerId;

/// Reacts to a conversation being opened.
///
/// The unread ledger and the toast queue register themselves so that
/// opening a chat marks its backlog as seen.
pub trait FocusObserver: Send + Sync {
    /// Called after `peer` became the active conversation.
    fn conversation_opened(&self, peer: &PeerId);
}

/// Tracks the currently open conversation, if any.
#[derive(Default)]
pub struct FocusTracker {
    /// Active peer
    active: Mutex<Option<PeerId>>,
    /// Registered observers; dropped ones are pruned lazily
    observers: Mutex<Vec<Weak<dyn FocusObserver>>>,
}

impl std::fmt::Debug for FocusTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FocusTracker")
            .field("active", &self.active())
            .finish()
    }
}

impl FocusTracker {
    /// Create a tracker with no conversation open.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer notified whenever a conversation is opened.
    pub fn observe(&self, observer: Weak<dyn FocusObserver>) {
        let mut observers = self.observers.lock().unwrap_or_else(|e| e.into_inner());
        observers.push(observer);
    }

    /// Set the open conversation; `None` means no conversation is open.
    ///
    /// Opening a conversation notifies observers after the focus value is
    /// updated, so any event processed afterwards sees the new focus.
    pub fn set_active(&self, peer: Option<PeerId>) {
        {
            let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
            active.clone_from(&peer);
        }

        let Some(peer) = peer else {
            tracing::debug!("Conversation closed");
            return;
        };
        tracing::debug!(peer = %peer, "Conversation opened");

        let live: Vec<_> = {
            let mut observers = self.observers.lock().unwrap_or_else(|e| e.into_inner());
            observers.retain(|o| o.strong_count() > 0);
            observers.iter().filter_map(Weak::upgrade).collect()
        };
        for observer in live {
            observer.conversation_opened(&peer);
        }
    }

    /// Whether `peer` is the open conversation.
    pub fn is_active(&self, peer: &PeerId) -> bool {
        self.active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            == Some(peer)
    }

    /// The open conversation, if any.
    pub fn active(&self) -> Option<PeerId> {
        self.active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        opened: Mutex<Vec<PeerId>>,
    }

    impl FocusObserver for Recorder {
        fn conversation_opened(&self, peer: &PeerId) {
            self.opened.lock().unwrap().push(peer.clone());
        }
    }

    #[test]
    fn test_is_active_follows_set_active() {
        let focus = FocusTracker::new();
        let a = PeerId::new("peerA");
        assert!(!focus.is_active(&a));

        focus.set_active(Some(a.clone()));
        assert!(focus.is_active(&a));
        assert!(!focus.is_active(&PeerId::new("peerB")));

        focus.set_active(None);
        assert!(!focus.is_active(&a));
        assert_eq!(focus.active(), None);
    }

    #[test]
    fn test_observers_notified_only_on_open() {
        let focus = FocusTracker::new();
        let recorder = Arc::new(Recorder::default());
        let weak: Weak<dyn FocusObserver> = Arc::downgrade(&recorder) as Weak<dyn FocusObserver>;
        focus.observe(weak);

        focus.set_active(Some(PeerId::new("peerA")));
        focus.set_active(None);
        focus.set_active(Some(PeerId::new("peerB")));

        let opened = recorder.opened.lock().unwrap();
        assert_eq!(opened.as_slice(), &[PeerId::new("peerA"), PeerId::new("peerB")]);
    }

    #[test]
    fn test_dropped_observer_is_pruned() {
        let focus = FocusTracker::new();
        {
            let recorder = Arc::new(Recorder::default());
            focus.observe(Arc::downgrade(&recorder) as Weak<dyn FocusObserver>);
        }
        focus.set_active(Some(PeerId::new("peerA")));
        assert!(focus.observers.lock().unwrap().is_empty());
    }
}
