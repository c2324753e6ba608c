//! Hot-reloadable template store shared by all watchers.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::config::FileStamp;

use super::{MessageKey, TemplateError, TemplateMap};

/// Shared, swap-on-reload holder of the current [`TemplateMap`].
///
/// Readers take an `Arc` snapshot and keep using it for as long as they
/// need; a reload builds the new map completely before swapping the
/// reference, so nobody ever sees a half-updated mapping.
#[derive(Debug)]
pub struct TemplateStore {
    path: PathBuf,
    current: RwLock<Arc<TemplateMap>>,
    /// Serializes reloads; also holds the last observed timestamp.
    stamp: Mutex<FileStamp>,
}

impl TemplateStore {
    /// Create a store for `path` holding an empty mapping.
    ///
    /// Call [`reload`](Self::reload) to read the source.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            stamp: Mutex::new(FileStamp::observe(&path)),
            current: RwLock::new(Arc::new(TemplateMap::empty())),
            path,
        }
    }

    /// Create a store and load the source, degrading to an empty mapping
    /// if it cannot be read.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let store = Self::new(path);
        if let Err(e) = store.reload() {
            tracing::warn!(error = %e, "Using built-in message templates");
        }
        store
    }

    /// Template source path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Point-in-time view of the mapping.
    #[must_use]
    pub fn snapshot(&self) -> Arc<TemplateMap> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Look up `key` in the current mapping, falling back to `default`.
    #[must_use]
    pub fn get(&self, key: &str, default: &str) -> String {
        self.snapshot().get(key, default).to_string()
    }

    /// Current template for a known key.
    #[must_use]
    pub fn template(&self, key: MessageKey) -> String {
        self.snapshot().template(key).to_string()
    }

    /// Whether the source's timestamp differs from the last one observed.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.stamp
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_stale()
    }

    /// Re-read the whole source and install it.
    ///
    /// A missing or malformed source installs the empty mapping, so lookups
    /// fall back to defaults, and the error is returned for reporting.
    ///
    /// # Errors
    ///
    /// Returns the read or parse error that caused the fallback.
    pub fn reload(&self) -> Result<Arc<TemplateMap>, TemplateError> {
        let mut stamp = self.stamp.lock().unwrap_or_else(PoisonError::into_inner);
        stamp.refresh();
        self.reload_locked()
    }

    /// Reload only if the source changed since the last observation.
    ///
    /// Returns `None` when nothing changed. Concurrent callers are
    /// serialized; only the first to notice a change performs the reload.
    pub fn reload_if_stale(&self) -> Option<Result<Arc<TemplateMap>, TemplateError>> {
        let mut stamp = self.stamp.lock().unwrap_or_else(PoisonError::into_inner);
        if !stamp.refresh() {
            return None;
        }
        Some(self.reload_locked())
    }

    fn reload_locked(&self) -> Result<Arc<TemplateMap>, TemplateError> {
        let (map, result) = match TemplateMap::load(&self.path) {
            Ok(map) => {
                let map = Arc::new(map);
                (Arc::clone(&map), Ok(map))
            }
            Err(e) => (Arc::new(TemplateMap::empty()), Err(e)),
        };

        *self.current.write().unwrap_or_else(PoisonError::into_inner) = map;
        tracing::debug!(path = %self.path.display(), ok = result.is_ok(), "Templates reloaded");
        result
    }
}
