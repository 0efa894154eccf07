//! Sender profile lookup.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::result::AppResult;
use crate::types::id::PeerId;

/// Display data for a conversation peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    /// Name to show on toasts and in the inbox.
    pub display_name: String,
    /// Avatar URL.
    pub photo_url: Option<String>,
}

/// Resolves peers to display data. Implementations may fail or hang;
/// callers apply their own timeout.
#[async_trait]
pub trait ProfileDirectory: Send + Sync + std::fmt::Debug + 'static {
    /// Fetch the profile summary of `peer`.
    async fn profile_summary(&self, peer: &PeerId) -> AppResult<ProfileSummary>;
}
