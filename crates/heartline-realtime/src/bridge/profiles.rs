//! Map-backed profile directory.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use heartline_core::error::AppError;
use heartline_core::result::AppResult;
use heartline_core::traits::{ProfileDirectory, ProfileSummary};
use heartline_core::types::PeerId;

/// Profile directory serving a fixed set of profiles.
#[derive(Debug, Default)]
pub struct StaticProfiles {
    profiles: RwLock<HashMap<PeerId, ProfileSummary>>,
}

impl StaticProfiles {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a profile.
    pub fn insert(&self, peer: PeerId, profile: ProfileSummary) {
        let mut profiles = self.profiles.write().unwrap_or_else(|e| e.into_inner());
        profiles.insert(peer, profile);
    }
}

#[async_trait]
impl ProfileDirectory for StaticProfiles {
    async fn profile_summary(&self, peer: &PeerId) -> AppResult<ProfileSummary> {
        let profiles = self.profiles.read().unwrap_or_else(|e| e.into_inner());
        profiles
            .get(peer)
            .cloned()
            .ok_or_else(|| AppError::profile_lookup(format!("No profile for peer {peer}")))
    }
}
