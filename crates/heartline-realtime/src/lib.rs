//! # heartline-realtime
//!
//! Client-side realtime notification pipeline for Heartline. Provides:
//!
//! - Conversation focus tracking (which chat the user has open)
//! - An unread ledger with per-peer counters and id-based de-duplication
//! - A bounded most-recent-first toast queue with expiry and sweeping
//! - A change-feed connector with exponential reconnect backoff and
//!   offline/online handling
//! - The notification center that ties feed deliveries to user-visible state
//! - In-memory feed, connectivity and profile adapters

pub mod bridge;
pub mod center;
pub mod connection;
pub mod focus;
pub mod ledger;
pub mod notification;

pub use center::NotificationCenter;
pub use connection::connector::FeedConnector;
pub use connection::state::ConnectionState;
pub use focus::tracker::FocusTracker;
pub use ledger::unread::{RecordOutcome, UnreadLedger};
pub use notification::queue::NotificationQueue;
