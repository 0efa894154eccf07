//! Connection states of the feed connector.

use std::fmt;
use std::time::Duration;

/// Lifecycle state of a feed subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not subscribed; the feed closed the channel.
    Disconnected,
    /// A subscribe request is in flight.
    Connecting {
        /// Reconnect attempts consumed before this one.
        attempt: u32,
    },
    /// The feed acknowledged the subscription.
    Subscribed,
    /// Waiting out the backoff delay before the next attempt.
    Reconnecting {
        /// Attempt number being scheduled (1-based).
        attempt: u32,
        /// Delay before the attempt.
        delay: Duration,
    },
    /// The runtime reports no connectivity; retries are paused.
    Offline,
    /// Reconnect attempts exhausted; notifications are degraded.
    Failed,
    /// Torn down explicitly.
    Closed,
}

impl ConnectionState {
    /// Short machine-readable label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting { .. } => "connecting",
            Self::Subscribed => "subscribed",
            Self::Reconnecting { .. } => "reconnecting",
            Self::Offline => "offline",
            Self::Failed => "failed",
            Self::Closed => "closed",
        }
    }

    /// Whether the feed gave up retrying.
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Failed)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting { attempt } => write!(f, "connecting (attempt {attempt})"),
            Self::Reconnecting { attempt, delay } => {
                write!(f, "reconnecting (attempt {attempt} in {} ms)", delay.as_millis())
            }
            other => f.write_str(other.as_str()),
        }
    }
}
