//! Manifest Cache
//!
//! Process-wide manifest lookup. A manifest is loaded once per application:
//! from the persisted cache when that entry is newer than the descriptor,
//! otherwise by parsing the descriptor and persisting the result.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::loader::DescriptorSource;
use super::parser::parse_manifest;
use super::store::CacheStore;
use super::types::Manifest;
use super::ManifestError;
use crate::common::ManifestResult;

type Slot = Arc<OnceCell<Arc<Manifest>>>;

/// Load counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Lookups served from memory
    pub memory_hits: u64,
    /// Cold loads served by the persisted cache
    pub persisted_hits: u64,
    /// Cold loads that invoked the parser
    pub parses: u64,
}

/// Shared manifest cache
pub struct ManifestCache {
    source: Arc<dyn DescriptorSource>,
    store: Arc<dyn CacheStore>,
    /// One slot per application; the slot serializes the first load
    slots: Mutex<HashMap<String, Slot>>,
    memory_hits: AtomicU64,
    persisted_hits: AtomicU64,
    parses: AtomicU64,
}

impl ManifestCache {
    pub fn new(source: Arc<dyn DescriptorSource>, store: Arc<dyn CacheStore>) -> Self {
        Self {
            source,
            store,
            slots: Mutex::new(HashMap::new()),
            memory_hits: AtomicU64::new(0),
            persisted_hits: AtomicU64::new(0),
            parses: AtomicU64::new(0),
        }
    }

    /// Load the manifest of `app`
    pub fn load(&self, app: &str) -> ManifestResult<Arc<Manifest>> {
        let slot = self.slot(app);

        if let Some(manifest) = slot.get() {
            self.memory_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Arc::clone(manifest));
        }

        match slot.get_or_try_init(|| self.load_cold(app)) {
            Ok(manifest) => Ok(Arc::clone(manifest)),
            Err(e) => {
                // Failed loads are retried on the next lookup
                let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
                if slots.get(app).is_some_and(|s| s.get().is_none()) {
                    slots.remove(app);
                }
                Err(e)
            }
        }
    }

    /// Manifest of `app` if it is already loaded in memory
    pub fn get(&self, app: &str) -> Option<Arc<Manifest>> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.get(app).and_then(|slot| slot.get().cloned())
    }

    /// Drop the in-memory entry of `app`; the next load goes back to disk.
    pub fn forget(&self, app: &str) -> bool {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.remove(app).is_some()
    }

    /// Drop every in-memory entry
    pub fn clear(&self) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.clear();
    }

    /// Names of the applications currently loaded in memory
    pub fn loaded_apps(&self) -> Vec<String> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let mut apps: Vec<String> = slots
            .iter()
            .filter(|(_, slot)| slot.get().is_some())
            .map(|(app, _)| app.clone())
            .collect();
        apps.sort();
        apps
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            memory_hits: self.memory_hits.load(Ordering::Relaxed),
            persisted_hits: self.persisted_hits.load(Ordering::Relaxed),
            parses: self.parses.load(Ordering::Relaxed),
        }
    }

    fn slot(&self, app: &str) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(app.to_string()).or_default())
    }

    fn load_cold(&self, app: &str) -> ManifestResult<Arc<Manifest>> {
        if !self.source.exists(app) {
            debug!("No descriptor for application {}", app);
            return Err(ManifestError::NotFound(app.to_string()));
        }

        let descriptor_time = self.source.modified_at(app)?;

        match self.store.try_read(app) {
            Some((manifest, written_at)) if written_at > descriptor_time => {
                self.persisted_hits.fetch_add(1, Ordering::Relaxed);
                debug!("Using persisted manifest for {}", app);
                return Ok(Arc::new(manifest));
            }
            Some(_) => debug!("Persisted manifest for {} is stale", app),
            None => {}
        }

        let text = self.source.read_text(app)?;
        self.parses.fetch_add(1, Ordering::Relaxed);
        let manifest = parse_manifest(&text, app)
            .map_err(|source| ManifestError::Parse {
                app: app.to_string(),
                source,
            })?
            .with_source_version(descriptor_time);

        info!(
            "Parsed manifest {} ({} front, {} admin actions)",
            app,
            manifest.front_actions.len(),
            manifest.admin_actions.len()
        );

        if let Err(e) = self.store.try_write(app, &manifest) {
            warn!("Failed to persist manifest cache for {}: {}", app, e);
        }

        Ok(Arc::new(manifest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::store::CacheError;
    use chrono::{DateTime, Duration, Utc};
    use std::sync::atomic::AtomicUsize;

    const NEWS: &str = r#"<?php defined('IN_WITY') or die('Access denied'); ?>
<app>
    <name>News</name>
    <action default="default">listing</action>
    <action>detail</action>
</app>"#;

    struct FakeSource {
        text: Mutex<Option<String>>,
        modified: DateTime<Utc>,
        reads: AtomicUsize,
    }

    impl FakeSource {
        fn new(text: Option<&str>, modified: DateTime<Utc>) -> Arc<Self> {
            Arc::new(Self {
                text: Mutex::new(text.map(str::to_string)),
                modified,
                reads: AtomicUsize::new(0),
            })
        }
    }

    impl DescriptorSource for FakeSource {
        fn exists(&self, _app: &str) -> bool {
            self.text.lock().unwrap().is_some()
        }

        fn read_text(&self, app: &str) -> Result<String, ManifestError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.text
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| ManifestError::NotFound(app.to_string()))
        }

        fn modified_at(&self, _app: &str) -> Result<DateTime<Utc>, ManifestError> {
            Ok(self.modified)
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        entry: Mutex<Option<(Manifest, DateTime<Utc>)>>,
        reads: AtomicUsize,
        writes: AtomicUsize,
        fail_writes: bool,
    }

    impl CacheStore for MemoryStore {
        fn try_read(&self, _app: &str) -> Option<(Manifest, DateTime<Utc>)> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.entry.lock().unwrap().clone()
        }

        fn try_write(&self, app: &str, manifest: &Manifest) -> Result<(), CacheError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            if self.fail_writes {
                return Err(CacheError::InvalidName(app.to_string()));
            }
            *self.entry.lock().unwrap() = Some((manifest.clone(), Utc::now()));
            Ok(())
        }
    }

    fn cached(name: &str) -> Manifest {
        Manifest {
            name: name.to_string(),
            ..Manifest::default()
        }
    }

    #[test]
    fn test_cold_load_parses_and_persists() {
        let modified = Utc::now() - Duration::hours(1);
        let source = FakeSource::new(Some(NEWS), modified);
        let store = Arc::new(MemoryStore::default());
        let cache = ManifestCache::new(source.clone(), store.clone());

        let manifest = cache.load("news").unwrap();
        assert_eq!(manifest.name, "News");
        assert_eq!(manifest.default_front_action.as_deref(), Some("listing"));
        assert_eq!(manifest.source_version, Some(modified));
        assert_eq!(cache.stats().parses, 1);
        assert_eq!(store.writes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_stale_persisted_entry_is_reparsed() {
        let modified = Utc::now();
        let source = FakeSource::new(Some(NEWS), modified);
        let store = Arc::new(MemoryStore::default());
        *store.entry.lock().unwrap() = Some((cached("Stale"), modified - Duration::minutes(5)));
        let cache = ManifestCache::new(source.clone(), store);

        let manifest = cache.load("news").unwrap();
        assert_eq!(manifest.name, "News");
        assert_eq!(cache.stats().parses, 1);
        assert_eq!(cache.stats().persisted_hits, 0);
    }

    #[test]
    fn test_equal_timestamps_are_stale() {
        let modified = Utc::now();
        let source = FakeSource::new(Some(NEWS), modified);
        let store = Arc::new(MemoryStore::default());
        *store.entry.lock().unwrap() = Some((cached("Same"), modified));
        let cache = ManifestCache::new(source, store);

        assert_eq!(cache.load("news").unwrap().name, "News");
        assert_eq!(cache.stats().parses, 1);
    }

    #[test]
    fn test_fresh_persisted_entry_skips_parser() {
        let modified = Utc::now() - Duration::hours(1);
        let source = FakeSource::new(Some(NEWS), modified);
        let store = Arc::new(MemoryStore::default());
        *store.entry.lock().unwrap() = Some((cached("Cached"), Utc::now()));
        let cache = ManifestCache::new(source.clone(), store.clone());

        let manifest = cache.load("news").unwrap();
        assert_eq!(manifest.name, "Cached");
        assert_eq!(cache.stats().parses, 0);
        assert_eq!(cache.stats().persisted_hits, 1);
        assert_eq!(source.reads.load(Ordering::SeqCst), 0);
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_missing_descriptor_touches_nothing() {
        let source = FakeSource::new(None, Utc::now());
        let store = Arc::new(MemoryStore::default());
        let cache = ManifestCache::new(source.clone(), store.clone());

        assert!(matches!(
            cache.load("ghost"),
            Err(ManifestError::NotFound(app)) if app == "ghost"
        ));
        assert_eq!(source.reads.load(Ordering::SeqCst), 0);
        assert_eq!(store.reads.load(Ordering::SeqCst), 0);
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
        assert!(cache.loaded_apps().is_empty());
    }

    #[test]
    fn test_persist_failure_is_not_fatal() {
        let source = FakeSource::new(Some(NEWS), Utc::now());
        let store = Arc::new(MemoryStore {
            fail_writes: true,
            ..MemoryStore::default()
        });
        let cache = ManifestCache::new(source, store.clone());

        assert_eq!(cache.load("news").unwrap().name, "News");
        assert_eq!(store.writes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_malformed_descriptor_is_not_memoized() {
        let source = FakeSource::new(Some("<app><action>x</app>"), Utc::now());
        let store = Arc::new(MemoryStore::default());
        let cache = ManifestCache::new(source.clone(), store.clone());

        assert!(matches!(cache.load("bad"), Err(ManifestError::Parse { .. })));
        assert!(matches!(cache.load("bad"), Err(ManifestError::Parse { .. })));
        assert_eq!(cache.stats().parses, 2);
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_first_lookup_wins_for_process() {
        let source = FakeSource::new(Some(NEWS), Utc::now());
        let cache = ManifestCache::new(source.clone(), Arc::new(MemoryStore::default()));

        let first = cache.load("news").unwrap();
        *source.text.lock().unwrap() = Some("<app><name>Changed</name></app>".to_string());
        let second = cache.load("news").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.stats().memory_hits, 1);
        assert_eq!(cache.loaded_apps(), vec!["news".to_string()]);

        assert!(cache.forget("news"));
        assert!(cache.get("news").is_none());
    }

    #[test]
    fn test_concurrent_first_access_parses_once() {
        let source = FakeSource::new(Some(NEWS), Utc::now());
        let store = Arc::new(MemoryStore::default());
        let cache = ManifestCache::new(source.clone(), store.clone());

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    assert_eq!(cache.load("news").unwrap().name, "News");
                });
            }
        });

        assert_eq!(cache.stats().parses, 1);
        assert_eq!(source.reads.load(Ordering::SeqCst), 1);
        assert_eq!(store.writes.load(Ordering::SeqCst), 1);
    }
}
