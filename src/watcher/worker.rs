//! Per-target watcher: tails one file and forwards matched events.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::WatchTarget;
use crate::extract::{EventExtractor, RenderedEvent};
use crate::sink::{DeliveryResult, NotificationSink};
use crate::status::{StatusEvent, StatusSink};
use crate::templates::{TemplateError, TemplateMap, TemplateStore};

use super::error::WatcherError;
use super::state::{WatcherExit, WatcherReport, WatcherState, WatcherStats};
use super::tailer::LineTailer;

/// Default idle wait between polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Collaborators shared by every watcher.
#[derive(Clone)]
pub struct WatchContext {
    /// Shared, hot-reloadable templates.
    pub templates: Arc<TemplateStore>,
    pub extractor: Arc<EventExtractor>,
    pub sink: Arc<dyn NotificationSink>,
    pub status: Arc<dyn StatusSink>,
    pub poll_interval: Duration,
}

impl WatchContext {
    #[must_use]
    pub fn new(
        templates: Arc<TemplateStore>,
        sink: Arc<dyn NotificationSink>,
        status: Arc<dyn StatusSink>,
    ) -> Self {
        Self {
            templates,
            extractor: Arc::new(EventExtractor::default()),
            sink,
            status,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    #[must_use]
    pub fn with_extractor(mut self, extractor: EventExtractor) -> Self {
        self.extractor = Arc::new(extractor);
        self
    }

    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

impl fmt::Debug for WatchContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchContext")
            .field("templates", &self.templates.path())
            .field("rules", &self.extractor.rules().len())
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

/// Tails one target file until cancelled.
#[derive(Debug)]
pub struct Watcher {
    target: WatchTarget,
    ctx: WatchContext,
    cancel: CancellationToken,
    state: WatcherState,
    stats: WatcherStats,
}

impl Watcher {
    #[must_use]
    pub fn new(target: WatchTarget, ctx: WatchContext, cancel: CancellationToken) -> Self {
        Self {
            target,
            ctx,
            cancel,
            state: WatcherState::Starting,
            stats: WatcherStats::default(),
        }
    }

    #[must_use]
    pub fn target(&self) -> &WatchTarget {
        &self.target
    }

    #[must_use]
    pub fn state(&self) -> WatcherState {
        self.state
    }

    fn transition(&mut self, new_state: WatcherState) {
        debug_assert!(
            !self.state.is_terminal(),
            "transition out of terminal state {:?}",
            self.state
        );
        tracing::debug!(
            path = %self.target.logfile().display(),
            from = ?self.state,
            to = ?new_state,
            "Watcher state transition"
        );
        self.state = new_state;
    }

    fn emit(&self, event: StatusEvent) {
        self.ctx.status.emit(event);
    }

    /// Run until cancelled, the file is missing, or reading fails.
    ///
    /// Only newly appended lines are processed, strictly in file order.
    pub async fn run(mut self) -> WatcherReport {
        let path = self.target.logfile().to_path_buf();

        let mut tailer = match LineTailer::open_at_end(&path).await {
            Ok(tailer) => tailer,
            Err(WatcherError::FileNotFound(path)) => {
                self.transition(WatcherState::FileMissing);
                self.emit(StatusEvent::FileNotFound { path });
                return self.report(WatcherExit::FileMissing);
            }
            Err(e) => return self.fault(&e),
        };

        self.transition(WatcherState::Tailing);
        self.emit(StatusEvent::Monitoring { path: path.clone() });

        let exit = loop {
            if self.cancel.is_cancelled() {
                break WatcherExit::Cancelled;
            }

            match tailer.next_line().await {
                Ok(Some(line)) => {
                    // A line read after cancellation belongs to the next
                    // generation of watchers.
                    if self.cancel.is_cancelled() {
                        break WatcherExit::Cancelled;
                    }
                    if !line.is_empty() {
                        self.process_line(&line).await;
                    }
                }
                Ok(None) => {
                    tokio::select! {
                        () = self.cancel.cancelled() => {}
                        () = tokio::time::sleep(self.ctx.poll_interval) => {}
                    }
                }
                Err(e) => {
                    drop(tailer);
                    return self.fault(&e);
                }
            }
        };

        drop(tailer);
        self.transition(WatcherState::Stopped);
        self.report(exit)
    }

    fn fault(mut self, error: &WatcherError) -> WatcherReport {
        tracing::warn!(
            path = %self.target.logfile().display(),
            error = %error,
            "Watcher faulted"
        );
        self.transition(WatcherState::Faulted);
        self.emit(StatusEvent::ReadFault {
            path: self.target.logfile().to_path_buf(),
            error: error.to_string(),
        });
        self.transition(WatcherState::Stopped);
        self.report(WatcherExit::Faulted)
    }

    fn report(&self, exit: WatcherExit) -> WatcherReport {
        WatcherReport {
            exit,
            stats: self.stats,
        }
    }

    async fn process_line(&mut self, line: &[u8]) {
        self.stats.record_line();

        match self.reload_templates_if_stale().await {
            Some(Ok(_)) => self.emit(StatusEvent::TemplatesReloaded),
            Some(Err(e)) => self.emit(StatusEvent::TemplatesInvalid {
                error: e.to_string(),
            }),
            None => {}
        }

        let templates = self.ctx.templates.snapshot();
        match self.ctx.extractor.extract_bytes(line, &templates) {
            Ok(Some(event)) => {
                self.stats.record_match();
                self.deliver(event).await;
            }
            Ok(None) => {}
            Err(e) => {
                self.stats.record_line_error();
                self.emit(StatusEvent::LineFailed {
                    path: self.target.logfile().to_path_buf(),
                    error: e.to_string(),
                });
            }
        }
    }

    /// Staleness check and reload touch the filesystem synchronously, so
    /// they run on the blocking pool.
    async fn reload_templates_if_stale(
        &self,
    ) -> Option<Result<Arc<TemplateMap>, TemplateError>> {
        let store = Arc::clone(&self.ctx.templates);
        match tokio::task::spawn_blocking(move || store.reload_if_stale()).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(error = %e, "Template reload task failed");
                None
            }
        }
    }

    async fn deliver(&mut self, event: RenderedEvent) {
        let result = self
            .ctx
            .sink
            .deliver(self.target.webhook(), &event.message)
            .await;
        self.stats.record_delivery(result.is_delivered());

        let status = match result {
            DeliveryResult::Delivered { .. } => StatusEvent::Delivered {
                message: event.into_message(),
            },
            DeliveryResult::Rejected { status, body } => StatusEvent::Rejected { status, body },
            DeliveryResult::TransportFailure(error) => StatusEvent::TransportFailure { error },
        };
        self.emit(status);
    }
}
