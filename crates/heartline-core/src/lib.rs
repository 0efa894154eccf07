//! # heartline-core
//!
//! Core crate for the Heartline message-notification pipeline. Contains
//! configuration schemas, typed identifiers, the domain types that flow
//! through the pipeline, the traits implemented by external collaborators
//! (change feed, profile directory, connectivity, platform notifications),
//! and the unified error system.
//!
//! This crate has **no** internal dependencies on other Heartline crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
