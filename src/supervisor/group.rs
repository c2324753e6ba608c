//! Supervisor owning the active generation of watchers.

use std::path::Path;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::config::{TargetList, WatchTarget};
use crate::status::StatusEvent;
use crate::watcher::{WatchContext, Watcher, WatcherReport};

/// A spawned watcher of the current generation.
#[derive(Debug, Clone)]
pub struct ActiveWatcher {
    target: WatchTarget,
    cancel: CancellationToken,
}

impl ActiveWatcher {
    #[must_use]
    pub fn target(&self) -> &WatchTarget {
        &self.target
    }

    /// Check if this watcher has been told to stop.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// A watcher task that has finished.
#[derive(Debug, Clone)]
pub struct FinishedWatcher {
    pub target: WatchTarget,
    pub report: WatcherReport,
}

/// Starts and stops watchers as a group.
///
/// At most one watcher per target is active at a time: every
/// [`start_all`](Self::start_all) first stops the previous generation.
#[derive(Debug)]
pub struct Supervisor {
    ctx: WatchContext,
    /// Parent of every watcher's token; cancelled on shutdown.
    root: CancellationToken,
    active: Vec<ActiveWatcher>,
    /// Tasks of all generations that have not been reaped yet.
    tasks: JoinSet<FinishedWatcher>,
}

impl Supervisor {
    #[must_use]
    pub fn new(ctx: WatchContext) -> Self {
        Self {
            ctx,
            root: CancellationToken::new(),
            active: Vec::new(),
            tasks: JoinSet::new(),
        }
    }

    #[must_use]
    pub fn context(&self) -> &WatchContext {
        &self.ctx
    }

    /// Number of watchers in the current generation.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    #[must_use]
    pub fn active_watchers(&self) -> &[ActiveWatcher] {
        &self.active
    }

    /// Number of spawned tasks that have not been reaped, across generations.
    #[must_use]
    pub fn pending_tasks(&self) -> usize {
        self.tasks.len()
    }

    /// Load a target list, reporting problems on the status channel.
    ///
    /// A missing or malformed list yields no targets.
    #[must_use]
    pub fn load_targets(&self, path: &Path) -> Vec<WatchTarget> {
        let status = &self.ctx.status;
        match TargetList::load(path) {
            Ok(list) => {
                for skipped in list.skipped {
                    status.emit(StatusEvent::TargetSkipped {
                        index: skipped.index,
                        reason: skipped.reason,
                    });
                }
                status.emit(StatusEvent::TargetsLoaded {
                    count: list.targets.len(),
                });
                list.targets
            }
            Err(e) => {
                status.emit(StatusEvent::TargetsInvalid {
                    error: e.to_string(),
                });
                Vec::new()
            }
        }
    }

    /// Stop the current generation and spawn one watcher per target.
    ///
    /// Tasks of earlier generations that already finished are reaped first.
    /// Must be called from within a tokio runtime.
    pub fn start_all(&mut self, targets: &[WatchTarget]) {
        self.reap();
        self.stop_all();

        for target in targets {
            let cancel = self.root.child_token();
            let watcher = Watcher::new(target.clone(), self.ctx.clone(), cancel.clone());
            let task_target = target.clone();
            self.tasks.spawn(async move {
                let report = watcher.run().await;
                FinishedWatcher {
                    target: task_target,
                    report,
                }
            });

            tracing::info!(watch = %target, "Watcher spawned");
            self.ctx.status.emit(StatusEvent::MonitorStarted {
                path: target.logfile().to_path_buf(),
            });
            self.active.push(ActiveWatcher {
                target: target.clone(),
                cancel,
            });
        }
    }

    /// Signal every active watcher to stop and forget them.
    ///
    /// Does not wait for the tasks to finish; see [`shutdown`](Self::shutdown).
    /// Returns the number of watchers signalled.
    pub fn stop_all(&mut self) -> usize {
        let count = self.active.len();
        if count == 0 {
            return 0;
        }

        for watcher in self.active.drain(..) {
            watcher.cancel.cancel();
        }
        tracing::info!(count, "Watchers signalled to stop");
        self.ctx.status.emit(StatusEvent::WatchersStopped { count });
        count
    }

    /// Collect tasks that have already finished, without waiting.
    pub fn reap(&mut self) -> Vec<FinishedWatcher> {
        let mut finished = Vec::new();
        while let Some(result) = self.tasks.try_join_next() {
            if let Some(done) = Self::log_finished(result) {
                finished.push(done);
            }
        }
        finished
    }

    /// Stop everything and wait for every task to finish.
    ///
    /// The supervisor can be started again afterwards.
    pub async fn shutdown(&mut self) -> Vec<FinishedWatcher> {
        self.stop_all();
        std::mem::replace(&mut self.root, CancellationToken::new()).cancel();

        let mut finished = Vec::new();
        while let Some(result) = self.tasks.join_next().await {
            if let Some(done) = Self::log_finished(result) {
                finished.push(done);
            }
        }
        finished
    }

    fn log_finished(
        result: Result<FinishedWatcher, tokio::task::JoinError>,
    ) -> Option<FinishedWatcher> {
        match result {
            Ok(done) => {
                tracing::debug!(
                    watch = %done.target,
                    exit = ?done.report.exit,
                    lines = done.report.stats.lines,
                    delivered = done.report.stats.delivered,
                    "Watcher finished"
                );
                Some(done)
            }
            Err(e) => {
                tracing::error!(error = %e, "Watcher task failed");
                None
            }
        }
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        self.root.cancel();
    }
}
