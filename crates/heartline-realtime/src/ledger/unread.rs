//! Unread ledger — per-peer unread counters and message previews.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use heartline_core::traits::ProfileSummary;
use heartline_core::types::{
    IncomingMessageEvent, PeerId, UnreadConversationEntry, UnreadSummary,
};

use crate::focus::{FocusObserver, FocusTracker};

use super::dedup::RecentIds;

/// Result of recording an incoming message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The peer's unread counter was incremented.
    Counted {
        /// Whether the entry was created by this message.
        created: bool,
        /// Entry after the update.
        entry: UnreadConversationEntry,
    },
    /// The conversation is open; only the preview was updated.
    Suppressed {
        /// Entry after the update.
        entry: UnreadConversationEntry,
    },
    /// The message id was already processed.
    Duplicate,
}

impl RecordOutcome {
    /// Whether a toast should be raised for this message.
    pub fn should_notify(&self) -> bool {
        matches!(self, Self::Counted { .. })
    }
}

#[derive(Debug)]
struct LedgerState {
    /// Peer → unread entry
    entries: HashMap<PeerId, UnreadConversationEntry>,
    /// Recently processed message ids
    recent: RecentIds,
}

/// In-memory map from conversation peer to unread state.
///
/// Counters only go down through [`UnreadLedger::mark_read`], which the
/// focus tracker triggers when a conversation is opened.
#[derive(Debug)]
pub struct UnreadLedger {
    /// The signed-in user; the other party of each message is the peer
    local_user: PeerId,
    /// Consulted at record time to suppress counting for the open chat
    focus: Arc<FocusTracker>,
    /// Entries and de-duplication window, updated together
    state: Mutex<LedgerState>,
}

impl UnreadLedger {
    /// Create a ledger and register it with `focus` so that opening a
    /// conversation marks it read.
    pub fn new(local_user: PeerId, focus: Arc<FocusTracker>, dedup_window: usize) -> Arc<Self> {
        let ledger = Arc::new(Self {
            local_user,
            focus: focus.clone(),
            state: Mutex::new(LedgerState {
                entries: HashMap::new(),
                recent: RecentIds::new(dedup_window),
            }),
        });
        let observer: Weak<dyn FocusObserver> = Arc::downgrade(&ledger) as Weak<dyn FocusObserver>;
        focus.observe(observer);
        ledger
    }

    /// Record a delivered message.
    ///
    /// Duplicates (by message id) are no-ops. If the peer's conversation is
    /// open at the moment of recording, the preview is refreshed but the
    /// counter is left alone.
    pub fn record_incoming(&self, evt: &IncomingMessageEvent) -> RecordOutcome {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        if !state.recent.insert(&evt.id) {
            tracing::trace!(message_id = %evt.id, "Duplicate feed delivery ignored");
            return RecordOutcome::Duplicate;
        }

        let peer = evt.counterpart(&self.local_user).clone();
        let suppressed = self.focus.is_active(&peer);

        let created = !state.entries.contains_key(&peer);
        let entry = state
            .entries
            .entry(peer.clone())
            .or_insert_with(|| UnreadConversationEntry {
                peer: peer.clone(),
                display_name: peer.to_string(),
                display_photo: None,
                unread_count: 0,
                last_message: evt.content.clone(),
                last_message_at: evt.created_at,
            });

        if evt.created_at >= entry.last_message_at {
            entry.last_message.clone_from(&evt.content);
            entry.last_message_at = evt.created_at;
        }

        if suppressed {
            tracing::debug!(peer = %peer, message_id = %evt.id, "Conversation open, not counting");
            return RecordOutcome::Suppressed {
                entry: entry.clone(),
            };
        }

        entry.unread_count = entry.unread_count.saturating_add(1);
        tracing::debug!(
            peer = %peer,
            message_id = %evt.id,
            unread = entry.unread_count,
            "Unread message recorded"
        );

        RecordOutcome::Counted {
            created,
            entry: entry.clone(),
        }
    }

    /// Reset the unread counter for `peer`. The preview is kept.
    pub fn mark_read(&self, peer: &PeerId) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(entry) = state.entries.get_mut(peer) {
            if entry.unread_count > 0 {
                tracing::debug!(
                    peer = %peer,
                    cleared = entry.unread_count,
                    "Conversation marked read"
                );
            }
            entry.unread_count = 0;
        }
    }

    /// Fill in display data once the sender profile is resolved.
    pub fn apply_profile(&self, peer: &PeerId, profile: &ProfileSummary) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(entry) = state.entries.get_mut(peer) {
            entry.display_name.clone_from(&profile.display_name);
            entry.display_photo.clone_from(&profile.photo_url);
        }
    }

    /// Unread count for `peer` (zero if unknown).
    pub fn unread_count(&self, peer: &PeerId) -> u32 {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.entries.get(peer).map(|e| e.unread_count).unwrap_or(0)
    }

    /// Sum of all unread counters.
    pub fn total_unread(&self) -> u32 {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state
            .entries
            .values()
            .fold(0u32, |acc, e| acc.saturating_add(e.unread_count))
    }

    /// Entry for `peer`, including read ones.
    pub fn entry(&self, peer: &PeerId) -> Option<UnreadConversationEntry> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.entries.get(peer).cloned()
    }

    /// Badge total plus conversations with unread messages, newest first.
    pub fn summary(&self) -> UnreadSummary {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let mut entries: Vec<_> = state
            .entries
            .values()
            .filter(|e| e.unread_count > 0)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at));

        UnreadSummary {
            total_unread: entries
                .iter()
                .fold(0u32, |acc, e| acc.saturating_add(e.unread_count)),
            entries,
        }
    }
}

impl FocusObserver for UnreadLedger {
    fn conversation_opened(&self, peer: &PeerId) {
        self.mark_read(peer);
    }
}
