//! Directory watch orchestration.
//!
//! Validates the base directory, prepares the output layout, subscribes to
//! filesystem notifications and feeds matching files into the process
//! queue until the shutdown token fires.

pub mod events;
pub mod filter;
pub mod layout;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::services::process_queue::{self, EnqueueError, ProcessContext, QueueHandle};
use crate::services::relocate::{FileRelocator, FsRelocator};

pub use crate::services::process_queue::RunSummary;
pub use filter::FileFilter;
pub use layout::{DONE_DIR, ORIGINAL_DIR, OutputLayout};

/// Lifecycle of a watch session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Uninitialized,
    Validating,
    Watching,
    Stopped,
}

/// What to watch and how to transform it. Fixed for the whole session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchTarget {
    pub base_directory: PathBuf,
    pub file_filter: FileFilter,
    pub corner_radius: u32,
}

/// Tuning knobs for the process queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchOptions {
    pub worker_count: usize,
    pub queue_capacity: usize,
    /// Longest wait for a new file's size to stop changing.
    pub settle_timeout: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            worker_count: 2,
            queue_capacity: 100,
            settle_timeout: Duration::from_millis(2000),
        }
    }
}

/// Fatal watch errors. Per-file failures are logged by the workers instead.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Failed to create directory {path}: {source}")]
    SubdirectoryCreation {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to subscribe to directory changes: {0}")]
    Subscribe(#[from] notify::Error),
}

impl WatchError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

/// Runs one watch session from validation to shutdown.
pub struct WatchOrchestrator {
    target: WatchTarget,
    options: WatchOptions,
    relocator: Arc<dyn FileRelocator>,
    state: watch::Sender<WatchState>,
}

impl WatchOrchestrator {
    pub fn new(target: WatchTarget, options: WatchOptions) -> Self {
        let (state, _) = watch::channel(WatchState::Uninitialized);
        Self {
            target,
            options,
            relocator: Arc::new(FsRelocator),
            state,
        }
    }

    /// Replace the filesystem relocator.
    pub fn with_relocator(mut self, relocator: Arc<dyn FileRelocator>) -> Self {
        self.relocator = relocator;
        self
    }

    pub fn subscribe_state(&self) -> watch::Receiver<WatchState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> WatchState {
        *self.state.borrow()
    }

    /// Watch until `shutdown` is cancelled.
    ///
    /// Files already queued or being processed when shutdown begins are
    /// finished before this returns. The state ends at
    /// [`WatchState::Stopped`] on every path.
    pub async fn run(self, shutdown: CancellationToken) -> Result<RunSummary, WatchError> {
        self.set_state(WatchState::Validating);
        let result = self.watch(&shutdown).await;
        self.set_state(WatchState::Stopped);

        match &result {
            Ok(summary) => tracing::info!(
                received = summary.received,
                saved = summary.saved,
                transform_failed = summary.transform_failed,
                relocated = summary.relocated,
                relocation_failed = summary.relocation_failed,
                dropped = summary.dropped,
                "Bye bye"
            ),
            Err(e) => tracing::error!(error = %e, "Watcher stopped"),
        }
        result
    }

    async fn watch(&self, shutdown: &CancellationToken) -> Result<RunSummary, WatchError> {
        let base = validate_base(&self.target.base_directory)?;
        let layout = OutputLayout::for_base(&base);
        layout
            .ensure()
            .map_err(|(path, source)| WatchError::SubdirectoryCreation { path, source })?;

        let ctx = Arc::new(ProcessContext::new(
            self.target.corner_radius,
            layout,
            self.relocator.clone(),
            self.options.settle_timeout,
        ));
        let stop = CancellationToken::new();
        let (queue, dispatcher) = process_queue::start(
            ctx.clone(),
            self.options.worker_count,
            self.options.queue_capacity,
            stop.clone(),
        );

        let watcher = match subscribe(&base, self.target.file_filter.clone(), queue) {
            Ok(watcher) => watcher,
            Err(e) => {
                stop.cancel();
                finish_queue(dispatcher).await;
                return Err(e);
            }
        };

        self.set_state(WatchState::Watching);
        tracing::info!(
            "Watching '{}' for new '{}' images. Press 'q' to quit.",
            base.display(),
            self.target.file_filter
        );

        shutdown.cancelled().await;
        tracing::info!("Shutdown requested, finishing queued files");

        drop(watcher);
        stop.cancel();
        finish_queue(dispatcher).await;

        Ok(ctx.stats.snapshot())
    }

    fn set_state(&self, state: WatchState) {
        tracing::debug!(?state, "Watch state changed");
        self.state.send_replace(state);
    }
}

/// Wait for the dispatcher to drain. A failed task is logged, not raised.
async fn finish_queue(dispatcher: JoinHandle<()>) -> bool {
    match dispatcher.await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(error = %e, "Process queue task failed");
            false
        }
    }
}

/// Check the base directory and return its canonical form.
fn validate_base(dir: &Path) -> Result<PathBuf, WatchError> {
    let meta = std::fs::metadata(dir).map_err(|e| {
        WatchError::Configuration(format!("base directory {} is not accessible: {e}", dir.display()))
    })?;
    if !meta.is_dir() {
        return Err(WatchError::Configuration(format!(
            "base directory {} is not a directory",
            dir.display()
        )));
    }
    dir.canonicalize().map_err(|e| {
        WatchError::Configuration(format!("cannot resolve base directory {}: {e}", dir.display()))
    })
}

fn subscribe(
    base: &Path,
    filter: FileFilter,
    queue: QueueHandle,
) -> Result<RecommendedWatcher, WatchError> {
    let watched = base.to_path_buf();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) => {
            for path in events::created_paths(&event) {
                if !is_candidate(&watched, &filter, &path) {
                    continue;
                }
                let shown = path.display().to_string();
                match queue.enqueue(path) {
                    Ok(()) => tracing::info!(path = %shown, "New file detected"),
                    Err(e @ EnqueueError::AlreadyQueued(_)) => {
                        tracing::debug!(error = %e, "Repeated notification ignored");
                    }
                    Err(e) => tracing::warn!(error = %e, "File not queued"),
                }
            }
        }
        Err(e) => tracing::warn!(error = %e, "Watch notification error"),
    })?;
    watcher.watch(base, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}

/// A regular file directly inside `base` whose name passes the filter.
fn is_candidate(base: &Path, filter: &FileFilter, path: &Path) -> bool {
    path.parent() == Some(base) && filter.matches(path) && path.is_file()
}
