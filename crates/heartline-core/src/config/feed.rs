//! Realtime change-feed subscription configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Change-feed subscription and reconnect policy settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Logical topic name used when subscribing.
    #[serde(default = "default_topic")]
    pub topic: String,
    /// Table whose inserts are watched.
    #[serde(default = "default_table")]
    pub table: String,
    /// Maximum consecutive reconnect attempts before giving up.
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,
    /// Delay before the first reconnect attempt, in milliseconds.
    #[serde(default = "default_base_backoff")]
    pub base_backoff_ms: u64,
    /// Upper bound for the reconnect delay, in milliseconds.
    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,
    /// How long a subscribe request may take before it counts as timed out.
    #[serde(default = "default_subscribe_timeout")]
    pub subscribe_timeout_ms: u64,
}

impl FeedConfig {
    /// First reconnect delay.
    pub fn base_backoff(&self) -> Duration {
        Duration::from_millis(self.base_backoff_ms)
    }

    /// Reconnect delay cap.
    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }

    /// Subscribe request timeout.
    pub fn subscribe_timeout(&self) -> Duration {
        Duration::from_millis(self.subscribe_timeout_ms)
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            topic: default_topic(),
            table: default_table(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
            base_backoff_ms: default_base_backoff(),
            max_backoff_ms: default_max_backoff(),
            subscribe_timeout_ms: default_subscribe_timeout(),
        }
    }
}

fn default_topic() -> String {
    "messages-feed".to_string()
}

fn default_table() -> String {
    "messages".to_string()
}

fn default_max_reconnect_attempts() -> u32 {
    3
}

fn default_base_backoff() -> u64 {
    1000
}

fn default_max_backoff() -> u64 {
    10_000
}

fn default_subscribe_timeout() -> u64 {
    10_000
}
