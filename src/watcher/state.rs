//! Watcher lifecycle states and counters.

/// Lifecycle state of a watcher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WatcherState {
    #[default]
    Starting,
    Tailing,
    Stopped,
    /// The target file did not exist at start. Terminal.
    FileMissing,
    /// Reading failed mid-poll; followed by `Stopped`.
    Faulted,
}

impl WatcherState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Stopped | Self::FileMissing)
    }
}

/// Why a watcher's run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherExit {
    /// Its cancellation signal was set.
    Cancelled,
    /// The file did not exist at start.
    FileMissing,
    /// An unrecoverable read error occurred.
    Faulted,
}

/// Per-watcher counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatcherStats {
    /// Non-empty lines read.
    pub lines: usize,
    /// Lines that produced a notification.
    pub matched: usize,
    /// Notifications accepted by the webhook.
    pub delivered: usize,
    /// Rejected or undeliverable notifications.
    pub failed_deliveries: usize,
    /// Lines that could not be processed.
    pub line_errors: usize,
}

impl WatcherStats {
    pub fn record_line(&mut self) {
        self.lines = self.lines.saturating_add(1);
    }

    pub fn record_match(&mut self) {
        self.matched = self.matched.saturating_add(1);
    }

    pub fn record_delivery(&mut self, delivered: bool) {
        if delivered {
            self.delivered = self.delivered.saturating_add(1);
        } else {
            self.failed_deliveries = self.failed_deliveries.saturating_add(1);
        }
    }

    pub fn record_line_error(&mut self) {
        self.line_errors = self.line_errors.saturating_add(1);
    }
}

/// Final outcome of a watcher run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatcherReport {
    pub exit: WatcherExit,
    pub stats: WatcherStats,
}
