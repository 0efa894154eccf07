//! Change-feed subscription lifecycle: state machine, backoff, driver.

pub mod backoff;
pub mod connector;
pub mod state;

pub use backoff::ReconnectPolicy;
pub use connector::FeedConnector;
pub use state::ConnectionState;
