//! Common Utilities
//!
//! Shared error codes, result aliases, and path helpers used across the core.

pub mod error;
pub mod paths;
pub mod result;

pub use error::{AppError, ErrorCode};
pub use paths::{apps_dir, cache_dir, config_path, wity_dir, wity_path};
pub use result::{AppResult, ManifestResult};
