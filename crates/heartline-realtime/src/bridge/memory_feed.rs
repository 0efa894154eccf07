//! In-memory change feed for single-process runs.

use std::collections::HashMap;
use std::future::pending;
use std::sync::Mutex;

use async_trait::async_trait;

use heartline_core::error::AppError;
use heartline_core::result::AppResult;
use heartline_core::traits::{ChangeFeed, ChannelStatus, FeedFilter, FeedSink};
use heartline_core::types::{IncomingMessageEvent, SubscriptionId};

#[derive(Debug, Default)]
struct FeedState {
    /// Subscription → (filter, sink)
    subscriptions: HashMap<SubscriptionId, (FeedFilter, FeedSink)>,
    /// Total subscribe requests received
    subscribe_calls: usize,
    /// Acknowledge new subscriptions right away
    auto_ack: bool,
    /// Never answer subscribe requests
    hang: bool,
    /// Reject subscribe requests with this reason
    reject: Option<String>,
}

/// In-memory feed: fans inserted rows out to matching subscriptions and lets
/// callers inject channel statuses.
#[derive(Debug, Default)]
pub struct MemoryFeed {
    state: Mutex<FeedState>,
}

impl MemoryFeed {
    /// Create a feed that waits for explicit acknowledgements.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a feed that acknowledges every subscription immediately.
    pub fn with_auto_ack() -> Self {
        let feed = Self::default();
        feed.lock().auto_ack = true;
        feed
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FeedState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Make subscribe requests hang forever.
    pub fn set_hang_on_subscribe(&self, hang: bool) {
        self.lock().hang = hang;
    }

    /// Make subscribe requests fail with `reason` (or succeed again with `None`).
    pub fn set_reject(&self, reason: Option<String>) {
        self.lock().reject = reason;
    }

    /// Insert a row. Returns how many subscriptions received it.
    pub fn deliver(&self, evt: IncomingMessageEvent) -> usize {
        let state = self.lock();
        state
            .subscriptions
            .values()
            .filter(|(filter, _)| filter.matches(&evt))
            .filter(|(_, sink)| sink.deliver(evt.clone()))
            .count()
    }

    /// Report a status to every active subscription.
    pub fn report(&self, status: ChannelStatus) -> usize {
        let state = self.lock();
        state
            .subscriptions
            .values()
            .filter(|(_, sink)| sink.report(status.clone()))
            .count()
    }

    /// Acknowledge every active subscription.
    pub fn acknowledge(&self) -> usize {
        self.report(ChannelStatus::Subscribed)
    }

    /// Number of subscriptions not yet released.
    pub fn active_subscriptions(&self) -> usize {
        self.lock().subscriptions.len()
    }

    /// Number of subscribe requests received so far.
    pub fn subscribe_calls(&self) -> usize {
        self.lock().subscribe_calls
    }
}

#[async_trait]
impl ChangeFeed for MemoryFeed {
    async fn subscribe(&self, filter: &FeedFilter, sink: FeedSink) -> AppResult<SubscriptionId> {
        let hang = {
            let mut state = self.lock();
            state.subscribe_calls += 1;
            if let Some(reason) = &state.reject {
                return Err(AppError::feed(reason.clone()));
            }
            state.hang
        };
        if hang {
            return pending().await;
        }

        let id = SubscriptionId::new();
        let mut state = self.lock();
        if state.auto_ack {
            sink.report(ChannelStatus::Subscribed);
        }
        state.subscriptions.insert(id, (filter.clone(), sink));
        tracing::trace!(
            subscription = %id,
            topic = %filter.topic,
            "Memory feed subscription opened"
        );
        Ok(id)
    }

    async fn unsubscribe(&self, handle: SubscriptionId) -> AppResult<()> {
        self.lock().subscriptions.remove(&handle);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use heartline_core::traits::FeedSignal;
    use heartline_core::types::{MessageId, PeerId};

    use super::*;

    fn filter_for(receiver: &str) -> FeedFilter {
        FeedFilter {
            topic: "messages-feed".to_string(),
            table: "messages".to_string(),
            receiver: PeerId::new(receiver),
        }
    }

    fn row(to: &str) -> IncomingMessageEvent {
        IncomingMessageEvent {
            id: MessageId::new("m1"),
            sender_id: PeerId::new("peerA"),
            receiver_id: PeerId::new(to),
            content: "hi".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_delivery_respects_receiver_filter() {
        let feed = MemoryFeed::new();
        let (sink, mut rx) = FeedSink::channel();
        feed.subscribe(&filter_for("u1"), sink).await.unwrap();

        assert_eq!(feed.deliver(row("someone-else")), 0);
        assert_eq!(feed.deliver(row("u1")), 1);
        assert!(matches!(rx.recv().await, Some(FeedSignal::Event(_))));
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_delivery() {
        let feed = MemoryFeed::new();
        let (sink, _rx) = FeedSink::channel();
        let id = feed.subscribe(&filter_for("u1"), sink).await.unwrap();
        assert_eq!(feed.active_subscriptions(), 1);

        feed.unsubscribe(id).await.unwrap();
        assert_eq!(feed.active_subscriptions(), 0);
        assert_eq!(feed.deliver(row("u1")), 0);
    }

    #[tokio::test]
    async fn test_reject_and_auto_ack() {
        let feed = MemoryFeed::with_auto_ack();
        feed.set_reject(Some("quota".to_string()));
        let (sink, _rx) = FeedSink::channel();
        let err = feed.subscribe(&filter_for("u1"), sink).await.unwrap_err();
        assert_eq!(err.message, "quota");

        feed.set_reject(None);
        let (sink, mut rx) = FeedSink::channel();
        feed.subscribe(&filter_for("u1"), sink).await.unwrap();
        assert_eq!(
            rx.recv().await,
            Some(FeedSignal::Status(ChannelStatus::Subscribed))
        );
        assert_eq!(feed.subscribe_calls(), 2);
    }
}
