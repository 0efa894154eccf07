//! Unified error types for Heartline.
//!
//! Collaborator failures (feed, profile lookup, platform notifications) are
//! mapped into [`AppError`] so they can travel through the `?` operator up to
//! the orchestrator, which logs and recovers from them.

use std::fmt;
use thiserror::Error;

/// Error kind categorization used across the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// The change feed rejected or failed a subscription.
    Feed,
    /// A sender profile could not be resolved.
    ProfileLookup,
    /// A bounded operation did not finish in time.
    Timeout,
    /// A platform notification could not be shown.
    Notifier,
    /// The component was already torn down.
    Closed,
    /// An internal error occurred.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Feed => write!(f, "FEED"),
            Self::ProfileLookup => write!(f, "PROFILE_LOOKUP"),
            Self::Timeout => write!(f, "TIMEOUT"),
            Self::Notifier => write!(f, "NOTIFIER"),
            Self::Closed => write!(f, "CLOSED"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The unified error used throughout Heartline.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create a feed error.
    pub fn feed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Feed, message)
    }

    /// Create a profile lookup error.
    pub fn profile_lookup(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ProfileLookup, message)
    }

    /// Create a platform notifier error.
    pub fn notifier(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Notifier, message)
    }

    /// Create an error for a call made after teardown.
    pub fn closed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Closed, message)
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorKind::Internal, format!("I/O error: {err}"), err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

impl From<tokio::time::error::Elapsed> for AppError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        Self::with_source(ErrorKind::Timeout, "Operation timed out", err)
    }
}
