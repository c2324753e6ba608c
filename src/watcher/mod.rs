//! Watcher module: one tailing worker per (log file, webhook) target.

mod error;
mod state;
mod tailer;
mod worker;

pub use error::WatcherError;
pub use state::{WatcherExit, WatcherReport, WatcherState, WatcherStats};
pub use tailer::LineTailer;
pub use worker::{WatchContext, Watcher, DEFAULT_POLL_INTERVAL};
