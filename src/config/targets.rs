//! Watch-target list: which log file feeds which webhook.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

/// One (log file, webhook) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WatchTarget {
    logfile: PathBuf,
    webhook: Url,
}

impl WatchTarget {
    /// Build a target, validating both fields.
    ///
    /// The log file does not have to exist; a missing file is reported by its
    /// watcher, not here.
    ///
    /// # Errors
    ///
    /// Returns `TargetsError::InvalidTarget` if either field is empty or the
    /// webhook is not an absolute http(s) URL.
    pub fn new(logfile: impl Into<PathBuf>, webhook: &str) -> Result<Self, TargetsError> {
        let logfile = logfile.into();
        if logfile.as_os_str().is_empty() {
            return Err(TargetsError::InvalidTarget("logfile is empty".to_string()));
        }
        let webhook = webhook.trim();
        if webhook.is_empty() {
            return Err(TargetsError::InvalidTarget("webhook is empty".to_string()));
        }
        let webhook = Url::parse(webhook)
            .map_err(|e| TargetsError::InvalidTarget(format!("webhook {webhook}: {e}")))?;
        if !matches!(webhook.scheme(), "http" | "https") {
            return Err(TargetsError::InvalidTarget(format!(
                "webhook {webhook}: unsupported scheme {}",
                webhook.scheme()
            )));
        }
        Ok(Self { logfile, webhook })
    }

    #[must_use]
    pub fn logfile(&self) -> &Path {
        &self.logfile
    }

    #[must_use]
    pub fn webhook(&self) -> &Url {
        &self.webhook
    }
}

impl fmt::Display for WatchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.logfile.display(), self.webhook)
    }
}

/// On-disk record shape: `{ "logfile": "...", "webhook": "..." }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetRecord {
    pub logfile: String,
    pub webhook: String,
}

/// A record that was rejected while loading the list.
#[derive(Debug, Clone)]
pub struct SkippedTarget {
    /// Position in the source array.
    pub index: usize,
    /// Why it was rejected.
    pub reason: String,
}

/// Result of loading a target list.
#[derive(Debug, Clone, Default)]
pub struct TargetList {
    /// Valid targets, in source order.
    pub targets: Vec<WatchTarget>,
    /// Records that failed validation.
    pub skipped: Vec<SkippedTarget>,
}

impl TargetList {
    /// Validate raw records, keeping the good ones.
    #[must_use]
    pub fn from_records(records: Vec<TargetRecord>) -> Self {
        let mut list = Self::default();
        for (index, record) in records.into_iter().enumerate() {
            match WatchTarget::new(record.logfile, &record.webhook) {
                Ok(target) => list.targets.push(target),
                Err(e) => {
                    tracing::warn!(index, error = %e, "Skipping invalid watch target");
                    list.skipped.push(SkippedTarget {
                        index,
                        reason: e.to_string(),
                    });
                }
            }
        }
        list
    }

    /// Parse a JSON array of target records.
    ///
    /// # Errors
    ///
    /// Returns `TargetsError::Parse` if the text is not a JSON array of objects.
    pub fn from_json(json: &str) -> Result<Self, TargetsError> {
        let records: Vec<TargetRecord> = serde_json::from_str(json)?;
        Ok(Self::from_records(records))
    }

    /// Load the target list from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable or not valid JSON.
    pub fn load(path: &Path) -> Result<Self, TargetsError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TargetsError::NotFound(path.to_path_buf())
            } else {
                TargetsError::Read {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;
        let list = Self::from_json(&content)?;
        tracing::debug!(
            path = %path.display(),
            targets = list.targets.len(),
            skipped = list.skipped.len(),
            "Loaded watch targets"
        );
        Ok(list)
    }
}

/// Errors from loading or validating watch targets.
#[derive(Debug, thiserror::Error)]
pub enum TargetsError {
    #[error("Target list not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read target list {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed target list: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid watch target: {0}")]
    InvalidTarget(String),
}
