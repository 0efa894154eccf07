//! Toast notifications: bounded queue and formatting.

pub mod formatter;
pub mod queue;

pub use queue::NotificationQueue;
