//! Modification-timestamp tracking for hot-reloadable files.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Read the modification time of `path`, or `None` if it cannot be read.
#[must_use]
pub fn modified_at(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Last observed modification timestamp of a file.
///
/// A missing file is recorded as `None`, so a file disappearing or
/// reappearing is a change like any other.
#[derive(Debug, Clone)]
pub struct FileStamp {
    path: PathBuf,
    last: Option<SystemTime>,
}

impl FileStamp {
    /// Record the current timestamp of `path`.
    #[must_use]
    pub fn observe(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let last = modified_at(&path);
        Self { path, last }
    }

    /// Path being tracked.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last recorded timestamp.
    #[must_use]
    pub fn last(&self) -> Option<SystemTime> {
        self.last
    }

    /// Whether the on-disk timestamp differs from the recorded one.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        modified_at(&self.path) != self.last
    }

    /// Record the current timestamp, returning `true` if it changed.
    pub fn refresh(&mut self) -> bool {
        let current = modified_at(&self.path);
        if current == self.last {
            return false;
        }
        self.last = current;
        true
    }
}
