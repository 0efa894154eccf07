//! Feed connector — owns the change-feed subscription and keeps it alive.
//!
//! A background driver task runs the state machine:
//!
//! ```text
//! Disconnected → Connecting → Subscribed → (ChannelError | TimedOut) → Reconnecting → Connecting → ...
//! ```
//!
//! Failures are retried with [`ReconnectPolicy`] backoff while the runtime
//! is online. Going offline cancels any pending retry; coming back online
//! resets the attempt counter and resubscribes from scratch. `close()`
//! cancels everything and releases the subscription.

use std::future::pending;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Sleep;
use tokio::time::error::Elapsed;
use tokio_util::sync::CancellationToken;

use heartline_core::config::FeedConfig;
use heartline_core::result::AppResult;
use heartline_core::traits::{
    ChangeFeed, ChannelStatus, Connectivity, FeedFilter, FeedSignal, FeedSink,
};
use heartline_core::types::{IncomingMessageEvent, SubscriptionId};

use super::backoff::ReconnectPolicy;
use super::state::ConnectionState;

/// Buffered status transitions per observer.
const STATUS_BUFFER: usize = 64;

/// Handle to a running feed subscription.
///
/// Dropping the handle cancels the driver; `close()` additionally waits
/// for the subscription to be released.
#[derive(Debug)]
pub struct FeedConnector {
    /// Latest state
    state: watch::Receiver<ConnectionState>,
    /// Every transition, for observers
    status: broadcast::Sender<ConnectionState>,
    /// Stops the driver
    cancel: CancellationToken,
    /// Driver task, taken on close
    task: Mutex<Option<JoinHandle<()>>>,
}

impl FeedConnector {
    /// Start connecting immediately (or wait in `Offline` if the runtime has
    /// no connectivity).
    ///
    /// Returns the connector and the receiver of delivered events, which is
    /// the sole consumer of the feed.
    pub fn start(
        feed: Arc<dyn ChangeFeed>,
        connectivity: Arc<dyn Connectivity>,
        filter: FeedFilter,
        config: &FeedConfig,
    ) -> (Self, mpsc::UnboundedReceiver<IncomingMessageEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let (status_tx, _) = broadcast::channel(STATUS_BUFFER);
        let cancel = CancellationToken::new();

        let driver = Driver {
            feed,
            filter,
            policy: ReconnectPolicy::from_config(config),
            subscribe_timeout: config.subscribe_timeout(),
            online: connectivity.watch(),
            watching_online: true,
            events: events_tx,
            state: state_tx,
            status: status_tx.clone(),
            cancel: cancel.clone(),
            attempts: 0,
            handle: None,
            signals: None,
            retry: None,
        };

        tracing::info!(
            topic = %driver.filter.topic,
            receiver = %driver.filter.receiver,
            "Starting feed connector"
        );
        let task = tokio::spawn(driver.run());

        let connector = Self {
            state: state_rx,
            status: status_tx,
            cancel,
            task: Mutex::new(Some(task)),
        };
        (connector, events_rx)
    }

    /// Current state.
    pub fn state(&self) -> ConnectionState {
        self.state.borrow().clone()
    }

    /// Observe every state transition from now on.
    pub fn subscribe_status(&self) -> broadcast::Receiver<ConnectionState> {
        self.status.subscribe()
    }

    /// Whether reconnect attempts were exhausted.
    pub fn is_degraded(&self) -> bool {
        self.state.borrow().is_degraded()
    }

    /// Cancel timers, release the subscription and enter `Closed`. Idempotent.
    pub async fn close(&self) {
        self.cancel.cancel();
        let task = self.task.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                tracing::warn!("Feed connector task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for FeedConnector {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// How a subscribe request ended.
enum SubscribeOutcome {
    Finished(Result<AppResult<SubscriptionId>, Elapsed>),
    /// Connectivity dropped while the request was pending
    WentOffline,
    /// Connectivity was restored while the request was pending
    CameOnline,
    Cancelled,
}

/// State machine driven by feed signals, connectivity and the retry timer.
struct Driver {
    feed: Arc<dyn ChangeFeed>,
    filter: FeedFilter,
    policy: ReconnectPolicy,
    subscribe_timeout: std::time::Duration,
    online: watch::Receiver<bool>,
    /// Cleared when the connectivity source goes away
    watching_online: bool,
    events: mpsc::UnboundedSender<IncomingMessageEvent>,
    state: watch::Sender<ConnectionState>,
    status: broadcast::Sender<ConnectionState>,
    cancel: CancellationToken,
    /// Consecutive retries since the last acknowledged subscription
    attempts: u32,
    handle: Option<SubscriptionId>,
    /// Signals of the current subscription only; replaced on resubscribe
    signals: Option<mpsc::UnboundedReceiver<FeedSignal>>,
    /// Pending reconnect timer
    retry: Option<Pin<Box<Sleep>>>,
}

impl Driver {
    async fn run(mut self) {
        let online = *self.online.borrow_and_update();
        if online {
            self.connect().await;
        } else {
            self.transition(ConnectionState::Offline);
        }

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                changed = self.online.changed(), if self.watching_online => match changed {
                    Ok(()) => {
                        let online = *self.online.borrow_and_update();
                        if online {
                            self.on_online().await;
                        } else {
                            self.on_offline();
                        }
                    }
                    Err(_) => {
                        tracing::debug!("Connectivity source dropped, keeping last known value");
                        self.watching_online = false;
                    }
                },
                signal = next_signal(&mut self.signals) => match signal {
                    Some(signal) => self.on_signal(signal).await,
                    None => {
                        tracing::debug!("Feed dropped the subscription sink");
                        self.signals = None;
                    }
                },
                _ = wait_retry(&mut self.retry) => {
                    self.retry = None;
                    self.connect().await;
                }
            }
        }

        self.teardown().await;
    }

    fn transition(&self, next: ConnectionState) {
        let previous = self.state.send_replace(next.clone());
        if previous != next {
            tracing::debug!(from = %previous, to = %next, "Feed state changed");
            // No observers is fine
            let _ = self.status.send(next);
        }
    }

    fn is_online(&self) -> bool {
        *self.online.borrow()
    }

    /// Drop any stale subscription and open a fresh one.
    ///
    /// Connectivity changes are honoured while the request is pending: going
    /// offline abandons it, coming back online starts over at attempt 0.
    async fn connect(&mut self) {
        loop {
            self.retry = None;
            self.release().await;
            self.transition(ConnectionState::Connecting {
                attempt: self.attempts,
            });

            let (sink, rx) = FeedSink::channel();
            match self.request(sink).await {
                SubscribeOutcome::Cancelled => return,
                SubscribeOutcome::WentOffline => {
                    tracing::info!("Runtime offline, abandoning pending subscribe");
                    self.transition(ConnectionState::Offline);
                    return;
                }
                SubscribeOutcome::CameOnline => {
                    tracing::info!("Runtime online, restarting pending subscribe");
                    self.attempts = 0;
                }
                SubscribeOutcome::Finished(Ok(Ok(handle))) => {
                    tracing::debug!(subscription = %handle, "Subscribe request accepted");
                    self.handle = Some(handle);
                    self.signals = Some(rx);
                    return;
                }
                SubscribeOutcome::Finished(Ok(Err(e))) => {
                    tracing::warn!("Feed subscribe failed: {}", e);
                    self.on_failure(ChannelStatus::ChannelError {
                        reason: e.to_string(),
                    })
                    .await;
                    return;
                }
                SubscribeOutcome::Finished(Err(_)) => {
                    tracing::warn!(
                        "Feed subscribe did not complete within {:?}",
                        self.subscribe_timeout
                    );
                    self.on_failure(ChannelStatus::TimedOut).await;
                    return;
                }
            }
        }
    }

    /// Run one subscribe request against cancellation and connectivity.
    async fn request(&mut self, sink: FeedSink) -> SubscribeOutcome {
        let subscribe =
            tokio::time::timeout(self.subscribe_timeout, self.feed.subscribe(&self.filter, sink));
        tokio::pin!(subscribe);

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return SubscribeOutcome::Cancelled,
                changed = self.online.changed(), if self.watching_online => {
                    if changed.is_err() {
                        tracing::debug!("Connectivity source dropped, keeping last known value");
                        self.watching_online = false;
                        continue;
                    }
                    let online = *self.online.borrow_and_update();
                    return if online {
                        SubscribeOutcome::CameOnline
                    } else {
                        SubscribeOutcome::WentOffline
                    };
                }
                res = &mut subscribe => return SubscribeOutcome::Finished(res),
            }
        }
    }

    async fn on_signal(&mut self, signal: FeedSignal) {
        match signal {
            FeedSignal::Event(evt) => {
                if self.events.send(evt).is_err() {
                    tracing::trace!("Event consumer gone, dropping delivery");
                }
            }
            FeedSignal::Status(status) if status.is_failure() => self.on_failure(status).await,
            FeedSignal::Status(ChannelStatus::Subscribed) => {
                self.attempts = 0;
                self.transition(ConnectionState::Subscribed);
            }
            FeedSignal::Status(_) => {
                tracing::info!("Feed channel closed");
                self.transition(ConnectionState::Disconnected);
            }
        }
    }

    /// Apply the retry policy to a `ChannelError`/`TimedOut`.
    async fn on_failure(&mut self, status: ChannelStatus) {
        if self.retry.is_some() {
            tracing::trace!(?status, "Retry already scheduled");
            return;
        }

        if !self.is_online() {
            tracing::debug!(?status, "Feed failure while offline, waiting for connectivity");
            self.transition(ConnectionState::Offline);
            return;
        }

        if !self.policy.allows(self.attempts) {
            tracing::error!(
                ?status,
                attempts = self.attempts,
                "Feed reconnect attempts exhausted, notifications degraded"
            );
            self.release().await;
            self.transition(ConnectionState::Failed);
            return;
        }

        self.attempts += 1;
        let delay = self.policy.delay_for(self.attempts);
        tracing::warn!(
            ?status,
            attempt = self.attempts,
            delay_ms = delay.as_millis() as u64,
            "Feed failure, scheduling reconnect"
        );
        self.retry = Some(Box::pin(tokio::time::sleep(delay)));
        self.transition(ConnectionState::Reconnecting {
            attempt: self.attempts,
            delay,
        });
    }

    fn on_offline(&mut self) {
        if self.retry.take().is_some() {
            tracing::debug!("Pending reconnect cancelled by offline event");
        }
        tracing::info!("Runtime offline, pausing feed reconnects");
        self.transition(ConnectionState::Offline);
    }

    async fn on_online(&mut self) {
        tracing::info!("Runtime online, resubscribing to feed");
        self.attempts = 0;
        self.connect().await;
    }

    async fn release(&mut self) {
        self.signals = None;
        if let Some(handle) = self.handle.take() {
            if let Err(e) = self.feed.unsubscribe(handle).await {
                tracing::warn!(subscription = %handle, "Feed unsubscribe failed: {}", e);
            }
        }
    }

    async fn teardown(&mut self) {
        self.retry = None;
        self.release().await;
        self.transition(ConnectionState::Closed);
        tracing::info!(topic = %self.filter.topic, "Feed connector closed");
    }
}

async fn next_signal(
    signals: &mut Option<mpsc::UnboundedReceiver<FeedSignal>>,
) -> Option<FeedSignal> {
    match signals {
        Some(rx) => rx.recv().await,
        None => pending().await,
    }
}

async fn wait_retry(retry: &mut Option<Pin<Box<Sleep>>>) {
    match retry {
        Some(sleep) => sleep.as_mut().await,
        None => pending().await,
    }
}
