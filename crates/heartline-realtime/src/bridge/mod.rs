//! In-process adapters for the external collaborators.
//!
//! Used by the replay binary and by tests; production wires the hosted
//! backend's SDK behind the same traits.

pub mod memory_feed;
pub mod network;
pub mod profiles;

pub use memory_feed::MemoryFeed;
pub use network::NetworkMonitor;
pub use profiles::StaticProfiles;
