//! Which conversation the local user currently has open.

pub mod tracker;

pub use tracker::{FocusObserver, FocusTracker};
