//! Convenience result type alias for Heartline.

use crate::error::AppError;

/// A specialized `Result` type for Heartline operations.
pub type AppResult<T> = Result<T, AppError>;
