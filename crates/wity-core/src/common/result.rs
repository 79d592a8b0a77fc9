//! Common Result Types
//!
//! Type aliases for results produced by the core.

use super::error::AppError;
use crate::manifest::ManifestError;

/// Result of an operation that may yield a user-facing note
pub type AppResult<T> = Result<T, AppError>;

/// Result of a manifest load
pub type ManifestResult<T> = Result<T, ManifestError>;
