//! Boundaries to the hosted backend and the runtime.
//!
//! These traits are implemented outside the pipeline (by the platform SDK
//! adapter in production, by in-memory adapters in tests and the replay
//! binary).

pub mod connectivity;
pub mod feed;
pub mod notifier;
pub mod profile;

pub use connectivity::Connectivity;
pub use feed::{ChangeFeed, ChannelStatus, FeedFilter, FeedSignal, FeedSink};
pub use notifier::SystemNotifier;
pub use profile::{ProfileDirectory, ProfileSummary};
