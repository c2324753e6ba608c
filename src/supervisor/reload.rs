//! Service mode: restart watchers when the target list changes.

use std::path::PathBuf;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::FileStamp;

use super::Supervisor;

/// Polls the target list's timestamp and restarts the supervisor's
/// watchers with the new list whenever it changes.
#[derive(Debug)]
pub struct TargetReloader {
    stamp: FileStamp,
    interval: Duration,
}

impl TargetReloader {
    /// Track `path` from its current state; the list already running is
    /// assumed to match it.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, interval: Duration) -> Self {
        Self {
            stamp: FileStamp::observe(path),
            interval,
        }
    }

    /// Reload now if the list changed. Returns `true` if watchers were
    /// restarted.
    pub fn check(&mut self, supervisor: &mut Supervisor) -> bool {
        supervisor.reap();
        if !self.stamp.refresh() {
            return false;
        }

        tracing::info!(path = %self.stamp.path().display(), "Target list changed, restarting watchers");
        let targets = supervisor.load_targets(self.stamp.path());
        supervisor.start_all(&targets);
        true
    }

    /// Check every interval until `shutdown` is cancelled.
    pub async fn run(mut self, supervisor: &mut Supervisor, shutdown: &CancellationToken) {
        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                () = tokio::time::sleep(self.interval) => {
                    self.check(supervisor);
                }
            }
        }
    }
}
