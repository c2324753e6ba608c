//! Status channel: human-readable lines from watchers and the supervisor.
//!
//! Status lines are what an operator sees (console, GUI text panel, log
//! file). They are separate from `tracing` diagnostics.

use std::fmt;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use chrono::Utc;
use owo_colors::OwoColorize;
use tokio::sync::mpsc;

/// Prefix used on watcher status lines.
pub const APP_TAG: &str = "[GhostMonitor]";

/// How serious a status line is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A status notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEvent {
    /// Supervisor spawned a watcher for this file.
    MonitorStarted { path: PathBuf },
    /// Watcher is positioned at end of file and tailing.
    Monitoring { path: PathBuf },
    /// Watcher's file does not exist; the watcher is done.
    FileNotFound { path: PathBuf },
    /// Template source changed and was reloaded.
    TemplatesReloaded,
    /// Template source could not be loaded; defaults are in use.
    TemplatesInvalid { error: String },
    /// A message was accepted by the webhook.
    Delivered { message: String },
    /// The webhook answered with a non-success status.
    Rejected { status: u16, body: String },
    /// The webhook could not be reached.
    TransportFailure { error: String },
    /// A line could not be processed.
    LineFailed { path: PathBuf, error: String },
    /// Reading the file failed; the watcher stopped.
    ReadFault { path: PathBuf, error: String },
    /// Watch targets were loaded.
    TargetsLoaded { count: usize },
    /// A watch target record was rejected.
    TargetSkipped { index: usize, reason: String },
    /// The watch target list could not be loaded.
    TargetsInvalid { error: String },
    /// The supervisor signalled its watchers to stop.
    WatchersStopped { count: usize },
}

impl StatusEvent {
    #[must_use]
    pub fn severity(&self) -> Severity {
        match self {
            Self::MonitorStarted { .. }
            | Self::Monitoring { .. }
            | Self::TemplatesReloaded
            | Self::Delivered { .. }
            | Self::TargetsLoaded { .. }
            | Self::WatchersStopped { .. } => Severity::Info,
            Self::FileNotFound { .. }
            | Self::TemplatesInvalid { .. }
            | Self::TargetSkipped { .. }
            | Self::TargetsInvalid { .. } => Severity::Warning,
            Self::Rejected { .. }
            | Self::TransportFailure { .. }
            | Self::LineFailed { .. }
            | Self::ReadFault { .. } => Severity::Error,
        }
    }

    /// Whether this event reports a delivery attempt.
    #[must_use]
    pub fn is_delivery(&self) -> bool {
        matches!(
            self,
            Self::Delivered { .. } | Self::Rejected { .. } | Self::TransportFailure { .. }
        )
    }
}

impl fmt::Display for StatusEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MonitorStarted { path } => {
                write!(f, "Monitor started for: {}", path.display())
            }
            Self::Monitoring { path } => write!(f, "{APP_TAG} Monitoring: {}", path.display()),
            Self::FileNotFound { path } => {
                write!(f, "{APP_TAG} File not found: {}", path.display())
            }
            Self::TemplatesReloaded => write!(f, "[Monitor] Message templates reloaded"),
            Self::TemplatesInvalid { error } => {
                write!(f, "[Monitor] Using default templates: {error}")
            }
            Self::Delivered { message } => write!(f, "[Webhook OK] {message}"),
            Self::Rejected { status, body } => write!(f, "[Webhook Error {status}] {body}"),
            Self::TransportFailure { error } => write!(f, "[Webhook Error] {error}"),
            Self::LineFailed { path, error } => {
                write!(f, "Error processing line from {}: {error}", path.display())
            }
            Self::ReadFault { path, error } => {
                write!(f, "Error monitoring {}: {error}", path.display())
            }
            Self::TargetsLoaded { count } => write!(f, "Loaded {count} watch target(s)"),
            Self::TargetSkipped { index, reason } => {
                write!(f, "Skipping watch target #{index}: {reason}")
            }
            Self::TargetsInvalid { error } => write!(f, "No watch targets loaded: {error}"),
            Self::WatchersStopped { count } => write!(f, "Stopped {count} monitor(s)"),
        }
    }
}

/// Receiver of status lines.
pub trait StatusSink: Send + Sync {
    fn emit(&self, event: StatusEvent);
}

/// Prints timestamped, colored status lines to stdout and mirrors them to
/// `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleStatus {
    /// Disable colors (for piping to files).
    pub plain: bool,
}

impl ConsoleStatus {
    #[must_use]
    pub fn new(plain: bool) -> Self {
        Self { plain }
    }
}

fn timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

impl StatusSink for ConsoleStatus {
    fn emit(&self, event: StatusEvent) {
        let severity = event.severity();
        match severity {
            Severity::Info => tracing::info!(status = %event, "Status"),
            Severity::Warning => tracing::warn!(status = %event, "Status"),
            Severity::Error => tracing::error!(status = %event, "Status"),
        }

        let ts = timestamp();
        let line = event.to_string();
        if self.plain {
            println!("{ts} {line}");
        } else {
            match severity {
                Severity::Info => println!("{} {}", ts.dimmed(), line),
                Severity::Warning => println!("{} {}", ts.dimmed(), line.yellow()),
                Severity::Error => println!("{} {}", ts.dimmed(), line.red().bold()),
            }
        }
        let _ = io::stdout().flush();
    }
}

/// Forwards status events over an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelStatus {
    tx: mpsc::UnboundedSender<StatusEvent>,
}

impl ChannelStatus {
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<StatusEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl StatusSink for ChannelStatus {
    fn emit(&self, event: StatusEvent) {
        // A dropped receiver just means nobody is listening any more.
        let _ = self.tx.send(event);
    }
}

/// Keeps every status event in memory.
#[derive(Debug, Default)]
pub struct CollectingStatus {
    events: Mutex<Vec<StatusEvent>>,
}

impl CollectingStatus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all events so far.
    #[must_use]
    pub fn events(&self) -> Vec<StatusEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// All events rendered as lines.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.events().iter().map(ToString::to_string).collect()
    }
}

impl StatusSink for CollectingStatus {
    fn emit(&self, event: StatusEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
