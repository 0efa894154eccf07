//! Realtime change-feed subscription contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::result::AppResult;
use crate::types::id::{PeerId, SubscriptionId};
use crate::types::message::IncomingMessageEvent;

/// Row filter for a change-feed subscription.
///
/// Only `INSERT` events on `table` whose `receiver_id` equals `receiver`
/// are delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedFilter {
    /// Logical topic (channel) name.
    pub topic: String,
    /// Table whose inserts are watched.
    pub table: String,
    /// Receiver the rows must be addressed to.
    pub receiver: PeerId,
}

impl FeedFilter {
    /// Whether an event passes the `receiver_id = receiver` predicate.
    pub fn matches(&self, evt: &IncomingMessageEvent) -> bool {
        evt.receiver_id == self.receiver
    }
}

/// Subscription status reported by the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChannelStatus {
    /// The subscription was acknowledged.
    Subscribed,
    /// The channel failed.
    ChannelError {
        /// Reason given by the feed.
        reason: String,
    },
    /// The subscription did not complete in time.
    TimedOut,
    /// The feed closed the channel.
    Closed,
}

impl ChannelStatus {
    /// Whether this status should trigger the reconnect policy.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::ChannelError { .. } | Self::TimedOut)
    }
}

/// Anything the feed pushes to a subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedSignal {
    /// A matching row was inserted.
    Event(IncomingMessageEvent),
    /// The subscription status changed.
    Status(ChannelStatus),
}

/// Sending half handed to the feed on subscribe.
#[derive(Debug, Clone)]
pub struct FeedSink {
    tx: mpsc::UnboundedSender<FeedSignal>,
}

impl FeedSink {
    /// Create a sink and the receiver that observes it.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<FeedSignal>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Deliver an inserted row. Returns `false` if the subscriber is gone.
    pub fn deliver(&self, evt: IncomingMessageEvent) -> bool {
        self.tx.send(FeedSignal::Event(evt)).is_ok()
    }

    /// Report a status change. Returns `false` if the subscriber is gone.
    pub fn report(&self, status: ChannelStatus) -> bool {
        self.tx.send(FeedSignal::Status(status)).is_ok()
    }

    /// Whether the subscriber dropped its receiver.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// A realtime change feed, e.g. the hosted backend's Postgres replication channel.
#[async_trait]
pub trait ChangeFeed: Send + Sync + std::fmt::Debug + 'static {
    /// Open a subscription. Events and statuses are pushed into `sink`
    /// until `unsubscribe` is called.
    async fn subscribe(&self, filter: &FeedFilter, sink: FeedSink) -> AppResult<SubscriptionId>;

    /// Release a subscription. Unknown handles are ignored.
    async fn unsubscribe(&self, handle: SubscriptionId) -> AppResult<()>;
}
