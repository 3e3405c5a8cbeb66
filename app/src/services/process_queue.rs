//! Process queue and worker dispatch.
//!
//! Detected files are queued on a bounded channel. A dispatcher task pulls
//! them off and runs each one on the blocking pool, with a semaphore
//! capping how many transforms run at once. Every item is transformed into
//! `done` and then moved into `original`, whatever the transform outcome.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use image_processor::{TransformError, TransformOutput};
use tokio::sync::{Semaphore, mpsc};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;

use crate::services::relocate::{FileRelocator, RelocationError};
use crate::watcher::layout::OutputLayout;

/// Interval between file size checks while waiting for a write to finish.
pub const STABILITY_CHECK_INTERVAL: Duration = Duration::from_millis(100);

/// A detected file waiting to be processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessJob {
    pub path: PathBuf,
}

/// Counters for one watch session.
#[derive(Debug, Default)]
pub struct RunStats {
    received: AtomicU64,
    saved: AtomicU64,
    transform_failed: AtomicU64,
    relocated: AtomicU64,
    relocation_failed: AtomicU64,
    dropped: AtomicU64,
}

/// Totals reported when a watch session stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub received: u64,
    pub saved: u64,
    pub transform_failed: u64,
    pub relocated: u64,
    pub relocation_failed: u64,
    pub dropped: u64,
}

impl RunStats {
    pub fn snapshot(&self) -> RunSummary {
        RunSummary {
            received: self.received.load(Ordering::Relaxed),
            saved: self.saved.load(Ordering::Relaxed),
            transform_failed: self.transform_failed.load(Ordering::Relaxed),
            relocated: self.relocated.load(Ordering::Relaxed),
            relocation_failed: self.relocation_failed.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }

    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// State shared by every handler.
pub struct ProcessContext {
    pub corner_radius: u32,
    pub layout: OutputLayout,
    pub relocator: Arc<dyn FileRelocator>,
    pub settle_timeout: Duration,
    pub stats: RunStats,
    /// Paths queued or being processed. A path is listed at most once.
    pending: Mutex<HashSet<PathBuf>>,
}

impl ProcessContext {
    pub fn new(
        corner_radius: u32,
        layout: OutputLayout,
        relocator: Arc<dyn FileRelocator>,
        settle_timeout: Duration,
    ) -> Self {
        Self {
            corner_radius,
            layout,
            relocator,
            settle_timeout,
            stats: RunStats::default(),
            pending: Mutex::new(HashSet::new()),
        }
    }

    fn release(&self, path: &Path) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.remove(path);
        }
    }
}

/// What happened to one file.
#[derive(Debug)]
pub struct ProcessOutcome {
    pub path: PathBuf,
    pub transform: Result<TransformOutput, TransformError>,
    pub relocation: Result<PathBuf, RelocationError>,
}

/// Errors raised when a job cannot be queued.
#[derive(Debug, thiserror::Error)]
pub enum EnqueueError {
    #[error("Process queue full, skipping {0}")]
    Full(PathBuf),

    #[error("Process queue closed, skipping {0}")]
    Closed(PathBuf),

    #[error("Already queued: {0}")]
    AlreadyQueued(PathBuf),

    #[error("Pending set lock poisoned")]
    LockPoisoned,
}

/// Sending side of the process queue. Cheap to clone.
#[derive(Clone)]
pub struct QueueHandle {
    tx: mpsc::Sender<ProcessJob>,
    ctx: Arc<ProcessContext>,
}

impl QueueHandle {
    /// Queue a file without waiting. Rejected files are counted as dropped.
    ///
    /// A path that is already queued or being processed is refused without
    /// being counted, so repeated notifications for one file run it once.
    pub fn enqueue(&self, path: PathBuf) -> Result<(), EnqueueError> {
        {
            let mut pending = self
                .ctx
                .pending
                .lock()
                .map_err(|_| EnqueueError::LockPoisoned)?;
            if !pending.insert(path.clone()) {
                return Err(EnqueueError::AlreadyQueued(path));
            }
        }

        RunStats::bump(&self.ctx.stats.received);
        self.tx.try_send(ProcessJob { path }).map_err(|e| {
            RunStats::bump(&self.ctx.stats.dropped);
            let err = match e {
                mpsc::error::TrySendError::Full(job) => EnqueueError::Full(job.path),
                mpsc::error::TrySendError::Closed(job) => EnqueueError::Closed(job.path),
            };
            if let EnqueueError::Full(path) | EnqueueError::Closed(path) = &err {
                self.ctx.release(path);
            }
            err
        })
    }
}

/// Start the dispatcher.
///
/// Once `stop` is cancelled the queue refuses new jobs, drains what is
/// already queued and waits for running handlers before the returned task
/// completes.
pub fn start(
    ctx: Arc<ProcessContext>,
    worker_count: usize,
    capacity: usize,
    stop: CancellationToken,
) -> (QueueHandle, JoinHandle<()>) {
    let (handle, rx) = channel(ctx.clone(), capacity);
    let task = tokio::spawn(dispatch_loop(ctx, rx, worker_count, stop));
    tracing::info!("Process queue started (workers={worker_count}, capacity={capacity})");
    (handle, task)
}

fn channel(
    ctx: Arc<ProcessContext>,
    capacity: usize,
) -> (QueueHandle, mpsc::Receiver<ProcessJob>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (QueueHandle { tx, ctx }, rx)
}

async fn dispatch_loop(
    ctx: Arc<ProcessContext>,
    mut rx: mpsc::Receiver<ProcessJob>,
    worker_count: usize,
    stop: CancellationToken,
) {
    let limit = Arc::new(Semaphore::new(worker_count.max(1)));
    let mut running = JoinSet::new();
    let mut closing = false;

    loop {
        let job = tokio::select! {
            job = rx.recv() => job,
            () = stop.cancelled(), if !closing => {
                rx.close();
                closing = true;
                tracing::info!("Process queue closed, draining {} queued item(s)", rx.len());
                continue;
            }
        };
        let Some(job) = job else { break };

        let Ok(permit) = limit.clone().acquire_owned().await else {
            break;
        };
        let ctx = ctx.clone();
        running.spawn_blocking(move || {
            let _permit = permit;
            process_file(&ctx, &job);
        });

        while let Some(result) = running.try_join_next() {
            log_join(result);
        }
    }

    while let Some(result) = running.join_next().await {
        log_join(result);
    }
    tracing::info!("Process queue stopped");
}

fn log_join(result: Result<(), JoinError>) {
    if let Err(e) = result {
        tracing::error!(error = %e, "Process handler panicked");
    }
}

/// Transform one file into `done`, then move it into `original`.
///
/// Both steps always run and failures are logged, never propagated.
pub fn process_file(ctx: &ProcessContext, job: &ProcessJob) -> ProcessOutcome {
    let path = job.path.as_path();
    if !wait_for_settle(path, ctx.settle_timeout) {
        tracing::debug!(path = %path.display(), "File did not settle, processing anyway");
    }

    let transform =
        image_processor::transform_and_save(path, ctx.layout.done(), ctx.corner_radius);
    match &transform {
        Ok(output) => {
            RunStats::bump(&ctx.stats.saved);
            tracing::info!(
                path = %output.path.display(),
                width = output.canvas.width,
                height = output.canvas.height,
                "Saved rounded image"
            );
        }
        Err(e) => {
            RunStats::bump(&ctx.stats.transform_failed);
            tracing::error!(path = %path.display(), error = %e, "Transform failed");
        }
    }

    let relocation = ctx.relocator.relocate(path, ctx.layout.original());
    match &relocation {
        Ok(moved) => {
            RunStats::bump(&ctx.stats.relocated);
            tracing::info!(path = %moved.display(), "Moved original");
        }
        Err(e) => {
            RunStats::bump(&ctx.stats.relocation_failed);
            tracing::error!(path = %path.display(), error = %e, "Relocation failed");
        }
    }

    ctx.release(path);
    ProcessOutcome {
        path: job.path.clone(),
        transform,
        relocation,
    }
}

/// Block until the size of `path` is the same on two consecutive checks.
///
/// Returns `false` if `timeout` elapses first or the file disappears.
/// A zero timeout skips the wait.
pub fn wait_for_settle(path: &Path, timeout: Duration) -> bool {
    if timeout.is_zero() {
        return true;
    }
    let deadline = Instant::now() + timeout;
    let mut last = file_len(path);

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() || last.is_none() {
            return false;
        }
        std::thread::sleep(STABILITY_CHECK_INTERVAL.min(remaining));
        let current = file_len(path);
        if current.is_some() && current == last {
            return true;
        }
        last = current;
    }
}

fn file_len(path: &Path) -> Option<u64> {
    std::fs::metadata(path).ok().map(|m| m.len())
}
