//! Descriptor Loader
//!
//! Locates application descriptors on disk and reads them for the parser.

use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::ManifestError;
use crate::config::CoreConfig;

/// Source of raw descriptor text, keyed by application name
pub trait DescriptorSource: Send + Sync {
    fn exists(&self, app: &str) -> bool;

    fn read_text(&self, app: &str) -> Result<String, ManifestError>;

    fn modified_at(&self, app: &str) -> Result<DateTime<Utc>, ManifestError>;
}

/// Reads `<apps_dir>/<app>/<descriptor_file>`
#[derive(Debug, Clone)]
pub struct FsDescriptorSource {
    apps_dir: PathBuf,
    descriptor_file: String,
    max_bytes: u64,
}

impl FsDescriptorSource {
    pub fn new(apps_dir: impl Into<PathBuf>) -> Self {
        Self {
            apps_dir: apps_dir.into(),
            descriptor_file: crate::config::DEFAULT_DESCRIPTOR_FILE.to_string(),
            max_bytes: crate::config::DEFAULT_MAX_DESCRIPTOR_BYTES,
        }
    }

    pub fn from_config(config: &CoreConfig) -> Self {
        Self {
            apps_dir: config.apps_dir.clone(),
            descriptor_file: config.descriptor_file.clone(),
            max_bytes: config.max_descriptor_bytes,
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Path of an application's descriptor, `None` for unsafe names
    pub fn descriptor_path(&self, app: &str) -> Option<PathBuf> {
        is_valid_app_name(app).then(|| self.apps_dir.join(app).join(&self.descriptor_file))
    }

    fn existing_path(&self, app: &str) -> Result<PathBuf, ManifestError> {
        let path = self
            .descriptor_path(app)
            .ok_or_else(|| ManifestError::InvalidName(app.to_string()))?;
        if !path.is_file() {
            return Err(ManifestError::NotFound(app.to_string()));
        }
        Ok(path)
    }
}

impl DescriptorSource for FsDescriptorSource {
    fn exists(&self, app: &str) -> bool {
        self.descriptor_path(app).is_some_and(|path| path.is_file())
    }

    fn read_text(&self, app: &str) -> Result<String, ManifestError> {
        let path = self.existing_path(app)?;

        let metadata = fs::metadata(&path).map_err(|e| ManifestError::io(&path, e))?;
        if metadata.len() > self.max_bytes {
            return Err(ManifestError::TooLarge {
                app: app.to_string(),
                limit: self.max_bytes,
            });
        }

        debug!("Reading descriptor {:?}", path);
        fs::read_to_string(&path).map_err(|e| ManifestError::io(&path, e))
    }

    fn modified_at(&self, app: &str) -> Result<DateTime<Utc>, ManifestError> {
        let path = self.existing_path(app)?;
        modified_time(&path)
    }
}

/// Modification time of a file
pub(crate) fn modified_time(path: &Path) -> Result<DateTime<Utc>, ManifestError> {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .map(DateTime::<Utc>::from)
        .map_err(|e| ManifestError::io(path, e))
}

/// Application names are single, visible path components
pub fn is_valid_app_name(app: &str) -> bool {
    !app.is_empty()
        && !app.starts_with('.')
        && !app.contains(['/', '\\', '\0'])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn install(dir: &Path, app: &str, content: &str) {
        let app_dir = dir.join(app);
        fs::create_dir_all(&app_dir).unwrap();
        fs::write(app_dir.join("manifest.php"), content).unwrap();
    }

    #[test]
    fn test_reads_installed_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        install(dir.path(), "news", "<app><name>News</name></app>");

        let source = FsDescriptorSource::new(dir.path());
        assert!(source.exists("news"));
        assert_eq!(
            source.read_text("news").unwrap(),
            "<app><name>News</name></app>"
        );
        assert!(source.modified_at("news").is_ok());
    }

    #[test]
    fn test_missing_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        let source = FsDescriptorSource::new(dir.path());

        assert!(!source.exists("news"));
        assert!(matches!(
            source.read_text("news"),
            Err(ManifestError::NotFound(app)) if app == "news"
        ));
    }

    #[test]
    fn test_rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        install(dir.path(), "news", "<app/>");
        let source = FsDescriptorSource::new(dir.path().join("news"));

        assert!(!source.exists(".."));
        assert!(!source.exists("../news"));
        assert!(matches!(
            source.read_text("../news"),
            Err(ManifestError::InvalidName(_))
        ));
    }

    #[test]
    fn test_size_limit() {
        let dir = tempfile::tempdir().unwrap();
        install(dir.path(), "big", &"x".repeat(64));

        let source = FsDescriptorSource::new(dir.path()).with_max_bytes(16);
        assert!(matches!(
            source.read_text("big"),
            Err(ManifestError::TooLarge { limit: 16, .. })
        ));
    }

    #[test]
    fn test_app_names() {
        assert!(is_valid_app_name("news"));
        assert!(is_valid_app_name("user_admin"));
        assert!(!is_valid_app_name(""));
        assert!(!is_valid_app_name(".hidden"));
        assert!(!is_valid_app_name("a/b"));
        assert!(!is_valid_app_name("a\\b"));
    }
}
