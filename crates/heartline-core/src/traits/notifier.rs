//! Platform-level notification surface (desktop/mobile notifications, sound).

use async_trait::async_trait;

use crate::result::AppResult;

/// Best-effort platform notifications. Any error is logged and ignored
/// by the caller.
#[async_trait]
pub trait SystemNotifier: Send + Sync + std::fmt::Debug + 'static {
    /// Show a system notification.
    async fn show(&self, title: &str, body: &str, icon_url: Option<&str>) -> AppResult<()>;

    /// Play an audible cue.
    async fn play_chime(&self) -> AppResult<()> {
        Ok(())
    }
}
