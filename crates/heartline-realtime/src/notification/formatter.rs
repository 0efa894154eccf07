//! Builds toast entries and platform notification text.

use chrono::{DateTime, Utc};

use heartline_core::traits::ProfileSummary;
use heartline_core::types::{IncomingMessageEvent, NotificationEntry, NotificationId};

/// Longest body passed to the platform notification surface, in characters.
const SYSTEM_BODY_MAX_CHARS: usize = 120;

/// Formats notifications for incoming messages.
pub struct NotificationFormatter;

impl NotificationFormatter {
    /// Toast for `evt` attributed to the resolved `profile`.
    pub fn toast(
        evt: &IncomingMessageEvent,
        profile: &ProfileSummary,
        now: DateTime<Utc>,
    ) -> NotificationEntry {
        NotificationEntry {
            id: NotificationId::new(),
            peer: evt.sender_id.clone(),
            display_name: profile.display_name.clone(),
            display_photo: profile.photo_url.clone(),
            message: evt.content.clone(),
            created_at: now,
        }
    }

    /// Title for the platform notification.
    pub fn system_title(entry: &NotificationEntry) -> String {
        format!("New message from {}", entry.display_name)
    }

    /// Body for the platform notification, shortened on a char boundary.
    pub fn system_body(entry: &NotificationEntry) -> String {
        let mut chars = entry.message.chars();
        let head: String = chars.by_ref().take(SYSTEM_BODY_MAX_CHARS).collect();
        if chars.next().is_some() {
            format!("{head}…")
        } else {
            head
        }
    }
}

#[cfg(test)]
mod tests {
    use heartline_core::types::{MessageId, PeerId};

    use super::*;

    fn entry_with(message: &str) -> NotificationEntry {
        let evt = IncomingMessageEvent {
            id: MessageId::new("m1"),
            sender_id: PeerId::new("peerA"),
            receiver_id: PeerId::new("u1"),
            content: message.to_string(),
            created_at: Utc::now(),
        };
        let profile = ProfileSummary {
            display_name: "Alice".to_string(),
            photo_url: None,
        };
        NotificationFormatter::toast(&evt, &profile, Utc::now())
    }

    #[test]
    fn test_toast_uses_profile_and_content() {
        let entry = entry_with("hi");
        assert_eq!(entry.peer, PeerId::new("peerA"));
        assert_eq!(entry.display_name, "Alice");
        assert_eq!(entry.message, "hi");
        assert_eq!(NotificationFormatter::system_title(&entry), "New message from Alice");
    }

    #[test]
    fn test_system_body_truncates_long_text() {
        let long = "é".repeat(200);
        let body = NotificationFormatter::system_body(&entry_with(&long));
        assert_eq!(body.chars().count(), SYSTEM_BODY_MAX_CHARS + 1);
        assert!(body.ends_with('…'));

        assert_eq!(NotificationFormatter::system_body(&entry_with("short")), "short");
    }
}
