//! Per-conversation unread bookkeeping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::PeerId;

/// Unread state for one conversation peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadConversationEntry {
    /// Conversation peer.
    pub peer: PeerId,
    /// Sender label, filled in once the profile is resolved.
    pub display_name: String,
    /// Sender avatar.
    pub display_photo: Option<String>,
    /// Messages received while the conversation was not open.
    pub unread_count: u32,
    /// Preview of the latest message.
    pub last_message: String,
    /// Timestamp of the latest message.
    pub last_message_at: DateTime<Utc>,
}

/// Snapshot used to render badge counts and the inbox list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadSummary {
    /// Sum of `unread_count` over all entries.
    pub total_unread: u32,
    /// Conversations with unread messages, newest first.
    pub entries: Vec<UnreadConversationEntry>,
}
