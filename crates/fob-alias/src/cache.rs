//! Per-config-path memoization of alias tables.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use path_clean::PathClean;

use crate::error::ConfigError;
use crate::table::AliasTable;

/// Terminal state of one config path.
#[derive(Debug, Clone)]
pub enum CacheEntry {
    /// The config exported nothing; every request yields no match.
    Empty,
    Ready(Arc<AliasTable>),
    /// Loading failed; the error is reported for every request.
    Failed(ConfigError),
}

/// Cache of normalized alias tables keyed by config path.
///
/// Each path is loaded at most once even when the cache is shared between
/// threads: concurrent requests for the same path wait on a per-key cell,
/// while unrelated paths load independently.
#[derive(Debug, Default)]
pub struct ConfigCache {
    entries: DashMap<PathBuf, Arc<OnceCell<CacheEntry>>>,
}

impl ConfigCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the entry for `path`, running `load` if it has never been
    /// loaded.
    pub fn get_or_load<F>(&self, path: &Path, load: F) -> CacheEntry
    where
        F: FnOnce() -> Result<Option<AliasTable>, ConfigError>,
    {
        let key = path.clean();
        // Clone the cell out so the shard lock is not held while loading.
        let cell = self.entries.entry(key).or_default().value().clone();

        if let Some(entry) = cell.get() {
            tracing::trace!("Alias config cache hit: {}", path.display());
            return entry.clone();
        }

        cell.get_or_init(|| match load() {
            Ok(Some(table)) => CacheEntry::Ready(Arc::new(table)),
            Ok(None) => CacheEntry::Empty,
            Err(err) => CacheEntry::Failed(err),
        })
        .clone()
    }

    /// Cached entry for `path`, if it has been loaded.
    pub fn get(&self, path: &Path) -> Option<CacheEntry> {
        self.entries
            .get(&path.clean())
            .and_then(|cell| cell.get().cloned())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every cached entry.
    pub fn clear(&self) {
        self.entries.clear();
    }
}
