//! Runtime network connectivity signal.

use tokio::sync::watch;

/// Reports whether the runtime currently has network connectivity.
///
/// `watch` yields a receiver that observes every `online`/`offline`
/// transition; `true` means online.
pub trait Connectivity: Send + Sync + std::fmt::Debug + 'static {
    /// Current connectivity.
    fn is_online(&self) -> bool;

    /// Subscribe to connectivity changes.
    fn watch(&self) -> watch::Receiver<bool>;
}
