//! Configuration management
//!
//! Reads the core configuration from `~/.wity/config.json`. Every field has a
//! default, so a missing file or a partial document is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::common::paths;

/// Default descriptor file name inside each application directory
pub const DEFAULT_DESCRIPTOR_FILE: &str = "manifest.php";

/// Default maximum descriptor size (1MB)
pub const DEFAULT_MAX_DESCRIPTOR_BYTES: u64 = 1_000_000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Directory holding one sub-directory per installed application
    pub apps_dir: PathBuf,
    /// Directory for persisted manifest caches
    pub cache_dir: PathBuf,
    /// Descriptor file name inside each application directory
    pub descriptor_file: String,
    /// Descriptors larger than this are refused
    pub max_descriptor_bytes: u64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            apps_dir: paths::apps_dir().unwrap_or_else(|| PathBuf::from("apps")),
            cache_dir: paths::cache_dir().unwrap_or_else(|| PathBuf::from("cache")),
            descriptor_file: DEFAULT_DESCRIPTOR_FILE.to_string(),
            max_descriptor_bytes: DEFAULT_MAX_DESCRIPTOR_BYTES,
        }
    }
}

impl CoreConfig {
    /// Load configuration from `path`, falling back to defaults when the file
    /// does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config: CoreConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Load configuration from the default location (`~/.wity/config.json`)
    pub fn load_default() -> Result<Self, ConfigError> {
        match paths::config_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// Path of the persisted manifest cache directory
    pub fn manifest_cache_dir(&self) -> PathBuf {
        self.cache_dir.join("manifests")
    }
}
