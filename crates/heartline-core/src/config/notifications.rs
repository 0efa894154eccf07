//! Unread ledger and notification toast configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Notification pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Maximum number of toasts visible at once.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// How long a toast stays visible, in seconds.
    #[serde(default = "default_display_seconds")]
    pub display_seconds: u64,
    /// Absolute toast age removed by the periodic sweep, in seconds.
    #[serde(default = "default_max_age")]
    pub max_age_seconds: u64,
    /// Interval at which the host should call the sweep, in seconds.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
    /// Timeout for resolving a sender profile, in milliseconds.
    #[serde(default = "default_lookup_timeout")]
    pub profile_lookup_timeout_ms: u64,
    /// Number of recently processed message ids remembered for de-duplication.
    #[serde(default = "default_dedup_window")]
    pub dedup_window: usize,
    /// Sender label used when the profile cannot be resolved.
    #[serde(default = "default_fallback_name")]
    pub fallback_display_name: String,
    /// Whether to raise a platform-level notification.
    #[serde(default = "default_true")]
    pub system_notifications: bool,
    /// Whether to play an audible cue.
    #[serde(default = "default_true")]
    pub sound: bool,
}

impl NotificationConfig {
    /// Toast display duration.
    pub fn display_duration(&self) -> Duration {
        Duration::from_secs(self.display_seconds)
    }

    /// Maximum toast age for the sweep.
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_seconds)
    }

    /// Sweep interval.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds)
    }

    /// Profile lookup timeout.
    pub fn profile_lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.profile_lookup_timeout_ms)
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            display_seconds: default_display_seconds(),
            max_age_seconds: default_max_age(),
            sweep_interval_seconds: default_sweep_interval(),
            profile_lookup_timeout_ms: default_lookup_timeout(),
            dedup_window: default_dedup_window(),
            fallback_display_name: default_fallback_name(),
            system_notifications: true,
            sound: true,
        }
    }
}

fn default_queue_capacity() -> usize {
    3
}

fn default_display_seconds() -> u64 {
    8
}

fn default_max_age() -> u64 {
    300
}

fn default_sweep_interval() -> u64 {
    60
}

fn default_lookup_timeout() -> u64 {
    3000
}

fn default_dedup_window() -> usize {
    1000
}

fn default_fallback_name() -> String {
    "Someone".to_string()
}

fn default_true() -> bool {
    true
}
