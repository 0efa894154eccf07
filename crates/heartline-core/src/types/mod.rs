//! Shared domain types: identifiers, feed events, ledger entries and toasts.

pub mod id;
pub mod message;
pub mod notification;
pub mod unread;

pub use id::{MessageId, NotificationId, PeerId, SubscriptionId};
pub use message::IncomingMessageEvent;
pub use notification::NotificationEntry;
pub use unread::{UnreadConversationEntry, UnreadSummary};
