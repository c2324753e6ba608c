//! Incremental line tailer.
//!
//! Reads complete lines appended to a file after it was opened.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader};

use super::error::WatcherError;

/// Line reader positioned at the end of a growing file.
///
/// Pre-existing content is never returned. Bytes after the last newline are
/// buffered until a later append completes the line.
#[derive(Debug)]
pub struct LineTailer {
    path: PathBuf,
    reader: BufReader<File>,
    /// Bytes of an incomplete trailing line.
    pending: Vec<u8>,
    /// Byte offset of the next unread byte.
    offset: u64,
}

impl LineTailer {
    /// Open `path` and seek to its current end.
    ///
    /// # Errors
    ///
    /// Returns `FileNotFound` or `PermissionDenied` for the corresponding
    /// open failures, `Io` for anything else.
    pub async fn open_at_end(path: impl Into<PathBuf>) -> Result<Self, WatcherError> {
        let path = path.into();
        let mut file = match File::open(&path).await {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(WatcherError::FileNotFound(path));
            }
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                return Err(WatcherError::PermissionDenied(path));
            }
            Err(e) => return Err(WatcherError::Io(e)),
        };

        let offset = file.seek(SeekFrom::End(0)).await?;
        tracing::debug!(path = %path.display(), offset, "Tailer positioned at end of file");

        Ok(Self {
            path,
            reader: BufReader::new(file),
            pending: Vec::new(),
            offset,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Byte offset of the next unread byte.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Read the next complete line, with surrounding whitespace trimmed.
    ///
    /// Returns `Ok(None)` when no complete line is available yet.
    ///
    /// # Errors
    ///
    /// Returns `WatcherError::Io` if reading fails.
    pub async fn next_line(&mut self) -> Result<Option<Vec<u8>>, WatcherError> {
        let read = self.reader.read_until(b'\n', &mut self.pending).await?;
        self.offset += read as u64;

        if self.pending.last() != Some(&b'\n') {
            return Ok(None);
        }

        let raw = std::mem::take(&mut self.pending);
        Ok(Some(raw.trim_ascii().to_vec()))
    }
}
