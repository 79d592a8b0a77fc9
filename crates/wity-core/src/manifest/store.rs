//! Manifest Cache Store
//!
//! Persists parsed manifests between process starts. Each manifest is stored
//! as `<dir>/<app>.json`; the file's modification time is compared with the
//! descriptor's to decide freshness.

use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

use super::loader::{is_valid_app_name, modified_time};
use super::types::Manifest;

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Invalid application name: {0}")]
    InvalidName(String),

    #[error("Cache I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize manifest: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Persisted manifest storage
pub trait CacheStore: Send + Sync {
    /// Cached manifest and the time it was written, if any
    fn try_read(&self, app: &str) -> Option<(Manifest, DateTime<Utc>)>;

    fn try_write(&self, app: &str, manifest: &Manifest) -> Result<(), CacheError>;
}

/// JSON files in a directory
#[derive(Debug, Clone)]
pub struct FsCacheStore {
    dir: PathBuf,
}

impl FsCacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn entry_path(&self, app: &str) -> Option<PathBuf> {
        is_valid_app_name(app).then(|| self.dir.join(format!("{}.json", app)))
    }
}

impl CacheStore for FsCacheStore {
    fn try_read(&self, app: &str) -> Option<(Manifest, DateTime<Utc>)> {
        let path = self.entry_path(app)?;
        if !path.is_file() {
            return None;
        }

        let written_at = match modified_time(&path) {
            Ok(t) => t,
            Err(e) => {
                warn!("Failed to stat manifest cache {:?}: {}", path, e);
                return None;
            }
        };

        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                warn!("Failed to read manifest cache {:?}: {}", path, e);
                return None;
            }
        };

        match serde_json::from_str::<Manifest>(&content) {
            Ok(manifest) => Some((manifest, written_at)),
            Err(e) => {
                warn!("Ignoring corrupt manifest cache {:?}: {}", path, e);
                None
            }
        }
    }

    fn try_write(&self, app: &str, manifest: &Manifest) -> Result<(), CacheError> {
        let path = self
            .entry_path(app)
            .ok_or_else(|| CacheError::InvalidName(app.to_string()))?;

        fs::create_dir_all(&self.dir).map_err(|source| CacheError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let json = serde_json::to_string_pretty(manifest)?;

        // Write-then-rename so readers never observe a partial file
        let tmp = self.dir.join(format!(
            ".{}.{}.{}.tmp",
            app,
            std::process::id(),
            TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        if let Err(source) = fs::write(&tmp, json) {
            let _ = fs::remove_file(&tmp);
            return Err(CacheError::Io { path: tmp, source });
        }
        if let Err(source) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(CacheError::Io { path, source });
        }

        debug!("Wrote manifest cache {:?}", path);
        Ok(())
    }
}

/// Store that never persists anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCacheStore;

impl CacheStore for NoopCacheStore {
    fn try_read(&self, _app: &str) -> Option<(Manifest, DateTime<Utc>)> {
        None
    }

    fn try_write(&self, _app: &str, _manifest: &Manifest) -> Result<(), CacheError> {
        Ok(())
    }
}
