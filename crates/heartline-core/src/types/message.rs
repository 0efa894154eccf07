//! Row-insert events delivered by the message change feed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{MessageId, PeerId};

/// A newly inserted message row as observed on the change feed.
///
/// Delivery is at-least-once; `id` is the de-duplication key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingMessageEvent {
    /// Unique message id.
    pub id: MessageId,
    /// Author of the message.
    pub sender_id: PeerId,
    /// Recipient of the message.
    pub receiver_id: PeerId,
    /// Message body.
    pub content: String,
    /// When the backend stored the row.
    pub created_at: DateTime<Utc>,
}

impl IncomingMessageEvent {
    /// The party of the conversation that is not `local_user`.
    pub fn counterpart(&self, local_user: &PeerId) -> &PeerId {
        if &self.sender_id == local_user {
            &self.receiver_id
        } else {
            &self.sender_id
        }
    }

    /// Whether this row was written by `local_user`.
    pub fn is_from(&self, local_user: &PeerId) -> bool {
        &self.sender_id == local_user
    }
}
