//! Watcher error types.

use std::path::PathBuf;

/// Errors that can occur while tailing a log file.
#[derive(thiserror::Error, Debug)]
pub enum WatcherError {
    /// The log file does not exist.
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Permission denied accessing file.
    #[error("Permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
