//! Unread bookkeeping with id-based idempotent ingestion.

pub mod dedup;
pub mod unread;

pub use dedup::RecentIds;
pub use unread::{RecordOutcome, UnreadLedger};
