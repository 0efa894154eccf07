//! End-to-end tests for the notification pipeline over the in-memory feed.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tokio::time::Instant;

use heartline_core::config::{FeedConfig, NotificationConfig};
use heartline_core::traits::{ChannelStatus, FeedFilter, ProfileSummary};
use heartline_core::types::{IncomingMessageEvent, MessageId, PeerId};
use heartline_realtime::bridge::{MemoryFeed, NetworkMonitor, StaticProfiles};
use heartline_realtime::{ConnectionState, FeedConnector, NotificationCenter};

fn t0() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

fn msg(id: &str, from: &str, content: &str) -> IncomingMessageEvent {
    IncomingMessageEvent {
        id: MessageId::new(id),
        sender_id: PeerId::new(from),
        receiver_id: PeerId::new("u1"),
        content: content.to_string(),
        created_at: t0(),
    }
}

fn profiles() -> Arc<StaticProfiles> {
    let profiles = Arc::new(StaticProfiles::new());
    profiles.insert(
        PeerId::new("peerA"),
        ProfileSummary {
            display_name: "Alice".to_string(),
            photo_url: None,
        },
    );
    profiles
}

fn center() -> Arc<NotificationCenter> {
    NotificationCenter::new(PeerId::new("u1"), profiles(), None, NotificationConfig::default())
}

fn filter() -> FeedFilter {
    FeedFilter {
        topic: "messages-feed".to_string(),
        table: "messages".to_string(),
        receiver: PeerId::new("u1"),
    }
}

async fn next_state(rx: &mut broadcast::Receiver<ConnectionState>) -> ConnectionState {
    tokio::time::timeout(Duration::from_secs(60), rx.recv())
        .await
        .expect("state transition within a minute")
        .expect("status channel open")
}

#[tokio::test]
async fn idempotent_ingestion_matches_deduplicated_sequence() {
    let with_dupes = [
        ("m1", "peerA"),
        ("m2", "peerB"),
        ("m1", "peerA"),
        ("m3", "peerA"),
        ("m4", "peerB"),
        ("m2", "peerB"),
        ("m4", "peerB"),
    ];
    let without_dupes = [
        ("m1", "peerA"),
        ("m2", "peerB"),
        ("m3", "peerA"),
        ("m4", "peerB"),
    ];

    let first = center();
    for (id, from) in with_dupes {
        first.handle_event(msg(id, from, "x")).await;
    }
    let second = center();
    for (id, from) in without_dupes {
        second.handle_event(msg(id, from, "x")).await;
    }

    assert_eq!(first.unread_summary(), second.unread_summary());
    assert_eq!(second.unread_summary().total_unread, 4);
    assert_eq!(
        first.visible_notifications().len(),
        second.visible_notifications().len()
    );
}

#[tokio::test]
async fn focused_conversation_is_suppressed_until_closed() {
    let center = center();
    let mut toasts = center.on_notification();
    let a = PeerId::new("peerA");

    center.open_conversation(a.clone());
    assert!(center.handle_event(msg("m1", "peerA", "hi")).await.is_none());
    assert!(center.handle_event(msg("m2", "peerA", "still here")).await.is_none());

    assert_eq!(center.unread_count(&a), 0);
    assert!(center.visible_notifications().is_empty());
    assert!(toasts.try_recv().is_err());

    center.close_conversation();
    assert!(center.handle_event(msg("m3", "peerA", "bye")).await.is_some());
    assert_eq!(center.unread_count(&a), 1);
}

#[tokio::test]
async fn opening_conversation_clears_exactly_its_backlog() {
    let center = center();
    for i in 0..3 {
        center.handle_event(msg(&format!("a{i}"), "peerA", "x")).await;
    }
    center.handle_event(msg("b1", "peerB", "y")).await;
    let before = center.unread_summary().total_unread;
    let n = center.unread_count(&PeerId::new("peerA"));
    assert_eq!(n, 3);

    center.open_conversation(PeerId::new("peerA"));

    assert_eq!(center.unread_count(&PeerId::new("peerA")), 0);
    assert_eq!(center.unread_summary().total_unread, before - n);
    // Its toasts are gone, peerB's remains
    let peers: Vec<_> = center
        .visible_notifications()
        .into_iter()
        .map(|e| e.peer)
        .collect();
    assert_eq!(peers, vec![PeerId::new("peerB")]);
}

#[tokio::test]
async fn queue_overflow_keeps_latest_three_and_full_counts() {
    let center = center();
    for i in 1..=5 {
        center
            .handle_event(msg(&format!("m{i}"), "peerA", &format!("n{i}")))
            .await
            .unwrap();
    }

    let messages: Vec<_> = center
        .visible_notifications()
        .into_iter()
        .map(|e| e.message)
        .collect();
    assert_eq!(messages, vec!["n5", "n4", "n3"]);
    assert_eq!(center.unread_summary().total_unread, 5);
}

#[tokio::test(start_paused = true)]
async fn reconnect_backoff_sequence_then_gives_up() {
    let feed = Arc::new(MemoryFeed::new());
    let net = Arc::new(NetworkMonitor::new(true));
    let (connector, _events) =
        FeedConnector::start(feed.clone(), net.clone(), filter(), &FeedConfig::default());
    let mut status = connector.subscribe_status();

    assert_eq!(next_state(&mut status).await, ConnectionState::Connecting { attempt: 0 });

    let mut delays = Vec::new();
    for attempt in 1..=3u32 {
        feed.report(ChannelStatus::ChannelError {
            reason: "socket reset".to_string(),
        });
        match next_state(&mut status).await {
            ConnectionState::Reconnecting { attempt: a, delay } => {
                assert_eq!(a, attempt);
                delays.push(delay);
            }
            other => panic!("expected reconnecting, got {other:?}"),
        }
        let scheduled_at = Instant::now();
        assert_eq!(
            next_state(&mut status).await,
            ConnectionState::Connecting { attempt }
        );
        let waited = scheduled_at.elapsed();
        let delay = delays[delays.len() - 1];
        assert!(waited >= delay && waited < delay + Duration::from_millis(100));
    }
    assert_eq!(
        delays,
        vec![
            Duration::from_millis(1000),
            Duration::from_millis(2000),
            Duration::from_millis(4000)
        ]
    );

    // Fourth failure: no further retry
    feed.report(ChannelStatus::ChannelError {
        reason: "socket reset".to_string(),
    });
    assert_eq!(next_state(&mut status).await, ConnectionState::Failed);
    assert!(connector.is_degraded());

    let calls = feed.subscribe_calls();
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(feed.subscribe_calls(), calls);
    assert_eq!(feed.active_subscriptions(), 0);

    connector.close().await;
}

#[tokio::test(start_paused = true)]
async fn offline_pauses_retries_and_online_resets_attempts() {
    let feed = Arc::new(MemoryFeed::new());
    let net = Arc::new(NetworkMonitor::new(true));
    let (connector, _events) =
        FeedConnector::start(feed.clone(), net.clone(), filter(), &FeedConfig::default());
    let mut status = connector.subscribe_status();
    assert_eq!(next_state(&mut status).await, ConnectionState::Connecting { attempt: 0 });

    // Burn one attempt so the reset is observable
    feed.report(ChannelStatus::TimedOut);
    assert!(matches!(
        next_state(&mut status).await,
        ConnectionState::Reconnecting { attempt: 1, .. }
    ));

    // Going offline cancels the pending retry
    net.set_online(false);
    assert_eq!(next_state(&mut status).await, ConnectionState::Offline);

    feed.report(ChannelStatus::ChannelError {
        reason: "network down".to_string(),
    });
    let calls = feed.subscribe_calls();
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(connector.state(), ConnectionState::Offline);
    assert_eq!(feed.subscribe_calls(), calls);

    let back_online = Instant::now();
    net.set_online(true);
    assert_eq!(next_state(&mut status).await, ConnectionState::Connecting { attempt: 0 });
    assert_eq!(back_online.elapsed(), Duration::ZERO);
    assert_eq!(feed.subscribe_calls(), calls + 1);
    // The stale subscription was released before resubscribing
    assert_eq!(feed.active_subscriptions(), 1);

    connector.close().await;
}

#[tokio::test(start_paused = true)]
async fn online_event_revives_failed_feed() {
    let feed = Arc::new(MemoryFeed::new());
    feed.set_reject(Some("service unavailable".to_string()));
    let net = Arc::new(NetworkMonitor::new(true));
    let (connector, _events) =
        FeedConnector::start(feed.clone(), net.clone(), filter(), &FeedConfig::default());
    let mut status = connector.subscribe_status();

    loop {
        if next_state(&mut status).await == ConnectionState::Failed {
            break;
        }
    }
    assert_eq!(feed.subscribe_calls(), 4);

    feed.set_reject(None);
    net.set_online(false);
    assert_eq!(next_state(&mut status).await, ConnectionState::Offline);
    net.set_online(true);
    assert_eq!(next_state(&mut status).await, ConnectionState::Connecting { attempt: 0 });
    feed.acknowledge();
    assert_eq!(next_state(&mut status).await, ConnectionState::Subscribed);

    connector.close().await;
}

#[tokio::test(start_paused = true)]
async fn end_to_end_message_to_toast_to_read() {
    let center = center();
    let feed = Arc::new(MemoryFeed::with_auto_ack());
    let net = Arc::new(NetworkMonitor::new(true));
    let mut toasts = center.on_notification();

    center
        .connect(feed.clone(), net.clone(), &FeedConfig::default())
        .await
        .unwrap();
    let mut status = center.subscribe_feed_status().unwrap();
    while center.feed_state() != Some(ConnectionState::Subscribed) {
        next_state(&mut status).await;
    }

    let delivered = feed.deliver(IncomingMessageEvent {
        id: MessageId::new("m1"),
        sender_id: PeerId::new("peerA"),
        receiver_id: PeerId::new("u1"),
        content: "hi".to_string(),
        created_at: t0(),
    });
    assert_eq!(delivered, 1);

    let toast = tokio::time::timeout(Duration::from_secs(1), toasts.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(toast.message, "hi");
    assert_eq!(toast.peer, PeerId::new("peerA"));
    assert!(toasts.try_recv().is_err());

    let summary = center.unread_summary();
    assert_eq!(summary.total_unread, 1);
    assert_eq!(summary.entries.len(), 1);
    assert_eq!(summary.entries[0].peer, PeerId::new("peerA"));
    assert_eq!(summary.entries[0].unread_count, 1);

    // Redelivery of the same row is a no-op
    feed.deliver(msg("m1", "peerA", "hi"));
    for _ in 0..5 {
        tokio::task::yield_now().await;
    }
    assert_eq!(center.unread_summary().total_unread, 1);

    center.open_conversation(PeerId::new("peerA"));
    assert_eq!(center.unread_summary().total_unread, 0);
    assert_eq!(center.unread_count(&PeerId::new("peerA")), 0);

    center.close().await;
}

#[tokio::test(start_paused = true)]
async fn no_state_mutation_after_teardown() {
    let center = center();
    let feed = Arc::new(MemoryFeed::with_auto_ack());
    let net = Arc::new(NetworkMonitor::new(true));
    center
        .connect(feed.clone(), net.clone(), &FeedConfig::default())
        .await
        .unwrap();
    let mut status = center.subscribe_feed_status().unwrap();
    while center.feed_state() != Some(ConnectionState::Subscribed) {
        next_state(&mut status).await;
    }

    center.handle_event(msg("m1", "peerA", "hi")).await.unwrap();
    let visible = center.visible_notifications();
    assert_eq!(visible.len(), 1);

    center.close().await;
    assert_eq!(feed.active_subscriptions(), 0);

    // Deliveries and timers after teardown change nothing
    assert_eq!(feed.deliver(msg("m2", "peerA", "late")), 0);
    center.handle_event(msg("m3", "peerA", "later")).await;
    tokio::time::sleep(Duration::from_secs(600)).await;

    assert_eq!(center.visible_notifications(), visible);
    assert_eq!(center.unread_summary().total_unread, 1);
    assert!(center.connect(feed, net, &FeedConfig::default()).await.is_err());
}
