//! Manifest System
//!
//! Parses application descriptors and caches the resulting manifests.

pub mod cache;
pub mod loader;
pub mod parser;
pub mod store;
pub mod types;

use std::path::{Path, PathBuf};

pub use cache::{CacheStats, ManifestCache};
pub use loader::{is_valid_app_name, DescriptorSource, FsDescriptorSource};
pub use parser::{parse_manifest, ParseError};
pub use store::{CacheError, CacheStore, FsCacheStore, NoopCacheStore};
pub use types::{
    ActionSpec, AdminActionSpec, Context, Manifest, ADMIN_ALIAS_PREFIX, ADMIN_PERMISSION,
};

/// Errors raised while loading a manifest
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("The manifest of the application \"{0}\" cannot be found")]
    NotFound(String),

    #[error("Invalid application name: {0:?}")]
    InvalidName(String),

    #[error("Descriptor of {app} exceeds {limit} bytes")]
    TooLarge { app: String, limit: u64 },

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse manifest of {app}: {source}")]
    Parse {
        app: String,
        #[source]
        source: ParseError,
    },
}

impl ManifestError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Whether the application simply has no descriptor
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::InvalidName(_))
    }
}
