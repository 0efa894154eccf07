//! Transient toast entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{NotificationId, PeerId};

/// A toast shown for an incoming message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEntry {
    /// Toast identifier.
    pub id: NotificationId,
    /// Conversation peer the toast refers to.
    pub peer: PeerId,
    /// Resolved sender label.
    pub display_name: String,
    /// Resolved sender avatar.
    pub display_photo: Option<String>,
    /// Message preview.
    pub message: String,
    /// When the toast was created.
    pub created_at: DateTime<Utc>,
}
