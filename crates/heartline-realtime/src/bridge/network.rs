//! Connectivity signal backed by a watch channel.

use tokio::sync::watch;

use heartline_core::traits::Connectivity;

/// Holds the current online/offline value and notifies watchers on change.
#[derive(Debug)]
pub struct NetworkMonitor {
    tx: watch::Sender<bool>,
}

impl NetworkMonitor {
    /// Create a monitor with the given initial connectivity.
    pub fn new(online: bool) -> Self {
        let (tx, _) = watch::channel(online);
        Self { tx }
    }

    /// Report an `online` (`true`) or `offline` (`false`) event.
    ///
    /// Repeating the current value does not notify watchers.
    pub fn set_online(&self, online: bool) {
        let changed = self.tx.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });
        if changed {
            tracing::info!(online, "Connectivity changed");
        }
    }
}

impl Connectivity for NetworkMonitor {
    fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    fn watch(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}
