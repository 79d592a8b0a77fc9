//! Action routing and access control for Wity applications.
//!
//! Each application ships a descriptor listing its front and admin actions,
//! their requirements and aliases. This crate parses and caches those
//! descriptors, maps request tokens onto actions, and checks a session's
//! authorization before dispatching to the application's handlers.

pub mod access;
pub mod common;
pub mod config;
pub mod manifest;
pub mod router;
pub mod session;

use std::sync::Arc;

pub use access::{evaluate_access, AccessDecision};
pub use common::{AppError, ErrorCode};
pub use config::CoreConfig;
pub use manifest::{Context, Manifest, ManifestCache, ManifestError};
pub use router::{resolve_action, DispatchOutcome, Dispatcher, HandlerRegistry};
pub use session::{AdminScope, AuthorizationState};

/// Build a manifest cache backed by the filesystem locations in `config`
pub fn filesystem_cache(config: &CoreConfig) -> ManifestCache {
    ManifestCache::new(
        Arc::new(manifest::FsDescriptorSource::from_config(config)),
        Arc::new(manifest::FsCacheStore::new(config.manifest_cache_dir())),
    )
}
