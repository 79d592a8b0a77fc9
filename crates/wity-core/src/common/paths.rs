//! Path Utilities
//!
//! Default locations under the Wity base directory (`~/.wity/`).

use std::path::PathBuf;

/// Get the Wity base directory (`~/.wity/`)
pub fn wity_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".wity"))
}

/// Get a path within the Wity directory
///
/// # Example
/// ```ignore
/// let apps = wity_path("apps");
/// ```
pub fn wity_path(relative_path: &str) -> Option<PathBuf> {
    wity_dir().map(|dir| dir.join(relative_path))
}

/// Get the installed applications directory
pub fn apps_dir() -> Option<PathBuf> {
    wity_path("apps")
}

/// Get the cache directory
pub fn cache_dir() -> Option<PathBuf> {
    wity_path("cache")
}

/// Get the configuration file path
pub fn config_path() -> Option<PathBuf> {
    wity_path("config.json")
}
