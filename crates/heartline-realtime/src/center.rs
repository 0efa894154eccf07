//! Notification center — turns feed deliveries into user-visible state.
//!
//! Owns the focus tracker, unread ledger and toast queue, consumes the
//! feed connector's events one at a time, and exposes the operations the
//! UI binds to (unread summary, open/close conversation, dismiss toasts).

use std::sync::{Arc, Mutex, Weak};

use chrono::Utc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use heartline_core::config::{FeedConfig, NotificationConfig};
use heartline_core::error::AppError;
use heartline_core::result::AppResult;
use heartline_core::traits::{
    ChangeFeed, Connectivity, FeedFilter, ProfileDirectory, ProfileSummary, SystemNotifier,
};
use heartline_core::types::{
    IncomingMessageEvent, NotificationEntry, NotificationId, PeerId, UnreadSummary,
};

use crate::connection::connector::FeedConnector;
use crate::connection::state::ConnectionState;
use crate::focus::{FocusObserver, FocusTracker};
use crate::ledger::unread::UnreadLedger;
use crate::notification::formatter::NotificationFormatter;
use crate::notification::queue::NotificationQueue;

/// Buffered toasts per `on_notification` subscriber.
const NOTIFICATION_BUFFER: usize = 32;

/// Central pipeline that coordinates the notification subsystems.
pub struct NotificationCenter {
    /// Signed-in user
    local_user: PeerId,
    /// Pipeline settings
    config: NotificationConfig,
    /// Open conversation
    focus: Arc<FocusTracker>,
    /// Unread counters
    ledger: Arc<UnreadLedger>,
    /// Visible toasts
    queue: Arc<NotificationQueue>,
    /// Sender display data
    profiles: Arc<dyn ProfileDirectory>,
    /// Platform notifications, if available
    notifier: Option<Arc<dyn SystemNotifier>>,
    /// Toast fan-out for renderers
    notifications: broadcast::Sender<NotificationEntry>,
    /// Cancels the pump, lookups and timers
    cancel: CancellationToken,
    /// Active feed connector
    connector: Mutex<Option<FeedConnector>>,
    /// Event pump task
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for NotificationCenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationCenter")
            .field("local_user", &self.local_user)
            .field("closed", &self.cancel.is_cancelled())
            .finish()
    }
}

impl NotificationCenter {
    /// Create the pipeline for `local_user`. No feed is attached yet.
    pub fn new(
        local_user: PeerId,
        profiles: Arc<dyn ProfileDirectory>,
        notifier: Option<Arc<dyn SystemNotifier>>,
        config: NotificationConfig,
    ) -> Arc<Self> {
        let focus = Arc::new(FocusTracker::new());
        let ledger = UnreadLedger::new(local_user.clone(), focus.clone(), config.dedup_window);
        let queue = Arc::new(NotificationQueue::new(config.queue_capacity));
        focus.observe(Arc::downgrade(&queue) as Weak<dyn FocusObserver>);
        let (notifications, _) = broadcast::channel(NOTIFICATION_BUFFER);

        tracing::info!(user = %local_user, "Notification center initialized");

        Arc::new(Self {
            local_user,
            config,
            focus,
            ledger,
            queue,
            profiles,
            notifier,
            notifications,
            cancel: CancellationToken::new(),
            connector: Mutex::new(None),
            pump: Mutex::new(None),
        })
    }

    /// Subscribe to the message feed for the local user and start consuming
    /// deliveries. Replaces any previously attached feed.
    pub async fn connect(
        self: &Arc<Self>,
        feed: Arc<dyn ChangeFeed>,
        connectivity: Arc<dyn Connectivity>,
        feed_config: &FeedConfig,
    ) -> AppResult<()> {
        if self.is_closed() {
            return Err(AppError::closed("Notification center already closed"));
        }
        self.detach().await;

        let filter = FeedFilter {
            topic: feed_config.topic.clone(),
            table: feed_config.table.clone(),
            receiver: self.local_user.clone(),
        };
        let (connector, mut events) = FeedConnector::start(feed, connectivity, filter, feed_config);

        let center = Arc::downgrade(self);
        let cancel = self.cancel.clone();
        let pump = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    evt = events.recv() => {
                        let Some(evt) = evt else { break };
                        let Some(center) = center.upgrade() else { break };
                        center.handle_event(evt).await;
                    }
                }
            }
            tracing::debug!("Notification pump stopped");
        });

        *self.connector.lock().unwrap_or_else(|e| e.into_inner()) = Some(connector);
        *self.pump.lock().unwrap_or_else(|e| e.into_inner()) = Some(pump);
        Ok(())
    }

    /// Process one feed delivery.
    ///
    /// The ledger is updated before any enrichment, so lookup or platform
    /// failures never lose the unread count. Returns the toast that was
    /// raised, if any.
    pub async fn handle_event(&self, evt: IncomingMessageEvent) -> Option<NotificationEntry> {
        if self.is_closed() {
            tracing::trace!(message_id = %evt.id, "Delivery after teardown ignored");
            return None;
        }
        if evt.is_from(&self.local_user) {
            tracing::trace!(message_id = %evt.id, "Own message echo ignored");
            return None;
        }

        let outcome = self.ledger.record_incoming(&evt);
        if !outcome.should_notify() {
            return None;
        }

        let profile = self.resolve_profile(&evt.sender_id).await?;

        // Focus may have moved to this peer while the lookup was pending
        if self.is_closed() || self.focus.is_active(&evt.sender_id) {
            return None;
        }

        let entry = NotificationFormatter::toast(&evt, &profile, Utc::now());
        self.queue.push(entry.clone());
        // No renderer subscribed is fine
        let _ = self.notifications.send(entry.clone());
        tracing::debug!(peer = %entry.peer, notification = %entry.id, "Toast raised");

        self.schedule_expiry(entry.id);
        self.raise_system_alert(&entry);

        Some(entry)
    }

    /// Resolve display data within the lookup timeout, falling back to the
    /// generic label. `None` only if the center was closed meanwhile.
    async fn resolve_profile(&self, peer: &PeerId) -> Option<ProfileSummary> {
        let lookup = tokio::time::timeout(
            self.config.profile_lookup_timeout(),
            self.profiles.profile_summary(peer),
        );
        let result = tokio::select! {
            _ = self.cancel.cancelled() => return None,
            res = lookup => res,
        };

        let profile = match result {
            Ok(Ok(profile)) => {
                self.ledger.apply_profile(peer, &profile);
                profile
            }
            Ok(Err(e)) => {
                tracing::warn!(peer = %peer, "Profile lookup failed: {}", e);
                self.fallback_profile()
            }
            Err(_) => {
                tracing::warn!(
                    peer = %peer,
                    "Profile lookup timed out after {:?}",
                    self.config.profile_lookup_timeout()
                );
                self.fallback_profile()
            }
        };
        Some(profile)
    }

    fn fallback_profile(&self) -> ProfileSummary {
        ProfileSummary {
            display_name: self.config.fallback_display_name.clone(),
            photo_url: None,
        }
    }

    fn schedule_expiry(&self, id: NotificationId) {
        if self.config.display_seconds == 0 {
            return;
        }
        let queue = Arc::clone(&self.queue);
        let cancel = self.cancel.clone();
        let ttl = self.config.display_duration();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(ttl) => {
                    queue.remove(id);
                }
            }
        });
    }

    /// Platform notification and sound, best-effort and off the pipeline.
    fn raise_system_alert(&self, entry: &NotificationEntry) {
        let Some(notifier) = self.notifier.clone() else {
            return;
        };
        let show = self.config.system_notifications;
        let sound = self.config.sound;
        if !show && !sound {
            return;
        }

        let title = NotificationFormatter::system_title(entry);
        let body = NotificationFormatter::system_body(entry);
        let icon = entry.display_photo.clone();
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            let alert = async {
                if show {
                    if let Err(e) = notifier.show(&title, &body, icon.as_deref()).await {
                        tracing::debug!("System notification unavailable: {}", e);
                    }
                }
                if sound {
                    if let Err(e) = notifier.play_chime().await {
                        tracing::debug!("Notification sound unavailable: {}", e);
                    }
                }
            };
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = alert => {}
            }
        });
    }

    /// Subscribe to toasts as they are raised.
    pub fn on_notification(&self) -> broadcast::Receiver<NotificationEntry> {
        self.notifications.subscribe()
    }

    /// Badge total and unread conversations.
    pub fn unread_summary(&self) -> UnreadSummary {
        self.ledger.summary()
    }

    /// The user opened the chat with `peer`: marks it read and dismisses its toasts.
    pub fn open_conversation(&self, peer: PeerId) {
        if self.is_closed() {
            return;
        }
        self.focus.set_active(Some(peer));
    }

    /// The user left the open chat.
    pub fn close_conversation(&self) {
        if self.is_closed() {
            return;
        }
        self.focus.set_active(None);
    }

    /// Dismiss one toast.
    pub fn dismiss_notification(&self, id: NotificationId) -> bool {
        !self.is_closed() && self.queue.remove(id)
    }

    /// Dismiss every toast.
    pub fn clear_all_notifications(&self) {
        if !self.is_closed() {
            self.queue.clear();
        }
    }

    /// Drop toasts older than the configured maximum age. Call periodically.
    pub fn sweep_notifications(&self) -> usize {
        if self.is_closed() {
            return 0;
        }
        self.queue.sweep(Utc::now(), self.config.max_age())
    }

    /// Visible toasts, most recent first.
    pub fn visible_notifications(&self) -> Vec<NotificationEntry> {
        self.queue.entries()
    }

    /// Unread count for one conversation.
    pub fn unread_count(&self, peer: &PeerId) -> u32 {
        self.ledger.unread_count(peer)
    }

    /// State of the attached feed, if any.
    pub fn feed_state(&self) -> Option<ConnectionState> {
        self.connector
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(FeedConnector::state)
    }

    /// Observe feed state transitions, if a feed is attached.
    pub fn subscribe_feed_status(&self) -> Option<broadcast::Receiver<ConnectionState>> {
        self.connector
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(FeedConnector::subscribe_status)
    }

    /// Whether notifications are paused because the feed gave up reconnecting.
    pub fn is_degraded(&self) -> bool {
        self.feed_state().is_some_and(|s| s.is_degraded())
    }

    /// Focus tracker.
    pub fn focus(&self) -> &Arc<FocusTracker> {
        &self.focus
    }

    /// Unread ledger.
    pub fn ledger(&self) -> &Arc<UnreadLedger> {
        &self.ledger
    }

    /// Toast queue.
    pub fn queue(&self) -> &Arc<NotificationQueue> {
        &self.queue
    }

    /// Whether `close()` was called.
    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Tear down: cancel lookups and timers, release the feed subscription.
    /// Idempotent.
    pub async fn close(&self) {
        if !self.is_closed() {
            tracing::info!(user = %self.local_user, "Closing notification center");
        }
        self.cancel.cancel();
        self.detach().await;
    }

    async fn detach(&self) {
        let connector = self.connector.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(connector) = connector {
            connector.close().await;
        }
        let pump = self.pump.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(pump) = pump {
            if let Err(e) = pump.await {
                tracing::warn!("Notification pump ended abnormally: {}", e);
            }
        }
    }
}
