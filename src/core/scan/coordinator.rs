//! Ingest coordinator - bounded worker pool over the candidate list
//!
//! A dispatcher feeds paths into a bounded queue; `max_workers` workers pull
//! from it, and each runs decode → normalize → upsert for one file under a
//! per-task timeout. A failing file is logged and counted, never propagated.

use crate::adapters::database::traits::{DuplicatePolicy, RecordStore, UpsertOutcome};
use crate::config::schema::ScanConfig;
use crate::core::extract::RecordNormalizer;
use crate::core::scan::summary::{IngestFailure, IngestSummary};
use crate::domain::{IndexerError, Result};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, info, warn, Instrument};

/// Runtime knobs for one ingest run
#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub max_workers: usize,
    pub queue_capacity: usize,
    pub task_timeout: Duration,
    pub duplicate_policy: DuplicatePolicy,
    pub dry_run: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            max_workers: 8,
            queue_capacity: 256,
            task_timeout: Duration::from_secs(120),
            duplicate_policy: DuplicatePolicy::Update,
            dry_run: false,
        }
    }
}

impl IngestOptions {
    pub fn from_config(scan: &ScanConfig, dry_run: bool) -> Self {
        Self {
            max_workers: scan.max_workers,
            queue_capacity: scan.queue_capacity,
            task_timeout: Duration::from_secs(scan.task_timeout_seconds),
            duplicate_policy: scan.on_duplicate,
            dry_run,
        }
    }
}

/// What a successful task did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskOutcome {
    Stored(UpsertOutcome),
    Normalized,
}

#[derive(Default)]
struct WorkerStats {
    successful: AtomicUsize,
    failed: AtomicUsize,
    inserted: AtomicUsize,
    updated: AtomicUsize,
    skipped_duplicates: AtomicUsize,
    timed_out: AtomicUsize,
    failures: Mutex<Vec<IngestFailure>>,
}

struct WorkerContext {
    normalizer: RecordNormalizer,
    store: Arc<dyn RecordStore>,
    options: IngestOptions,
    stats: Arc<WorkerStats>,
}

/// Ingest coordinator
pub struct IngestCoordinator {
    normalizer: RecordNormalizer,
    store: Arc<dyn RecordStore>,
    options: IngestOptions,
    shutdown: watch::Receiver<bool>,
}

impl IngestCoordinator {
    /// Create a new coordinator
    ///
    /// Setting the `shutdown` channel to `true` stops dispatch; tasks already
    /// queued or running finish normally.
    pub fn new(
        normalizer: RecordNormalizer,
        store: Arc<dyn RecordStore>,
        options: IngestOptions,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            normalizer,
            store,
            options,
            shutdown,
        }
    }

    /// Ingest every path and return the aggregate result
    ///
    /// The summary's `success_count()` is the number of files that decoded,
    /// normalized and persisted without error, independent of worker count.
    pub async fn run(&self, paths: Vec<PathBuf>) -> IngestSummary {
        let run_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("ingest", run_id = %run_id, backend = self.store.backend_name());
        self.run_inner(paths).instrument(span).await
    }

    async fn run_inner(&self, paths: Vec<PathBuf>) -> IngestSummary {
        let start_time = Instant::now();
        let total = paths.len();
        let worker_count = self.options.max_workers.clamp(1, total.max(1));

        info!(
            files = total,
            workers = worker_count,
            on_duplicate = %self.options.duplicate_policy,
            dry_run = self.options.dry_run,
            "Starting ingest"
        );

        let (sender, receiver) = mpsc::channel(self.options.queue_capacity.max(1));
        let stats = Arc::new(WorkerStats::default());
        let context = Arc::new(WorkerContext {
            normalizer: self.normalizer.clone(),
            store: Arc::clone(&self.store),
            options: self.options.clone(),
            stats: Arc::clone(&stats),
        });

        let mut join_set = spawn_workers(receiver, worker_count, context);

        let dispatched = self.dispatch(paths, sender).await;
        let interrupted = dispatched < total;

        while let Some(result) = join_set.join_next().await {
            if let Err(join_err) = result {
                warn!(error = %join_err, "Ingest worker terminated abnormally");
            }
        }

        let mut summary = IngestSummary::new(total);
        summary.successful = stats.successful.load(Ordering::Relaxed);
        summary.failed = stats.failed.load(Ordering::Relaxed);
        summary.inserted = stats.inserted.load(Ordering::Relaxed);
        summary.updated = stats.updated.load(Ordering::Relaxed);
        summary.skipped_duplicates = stats.skipped_duplicates.load(Ordering::Relaxed);
        summary.timed_out = stats.timed_out.load(Ordering::Relaxed);
        summary.not_dispatched = total - dispatched;
        summary.interrupted = interrupted;
        summary.dry_run = self.options.dry_run;
        summary.failures = std::mem::take(&mut *stats.failures.lock().await);

        let summary = summary.with_duration(start_time.elapsed());
        summary.log_summary();
        summary
    }

    /// Feed paths to the workers until done or shutdown; returns how many were queued
    async fn dispatch(&self, paths: Vec<PathBuf>, sender: mpsc::Sender<PathBuf>) -> usize {
        let mut shutdown = self.shutdown.clone();
        let mut dispatched = 0;

        'dispatch: for path in paths {
            loop {
                if *shutdown.borrow() {
                    warn!(dispatched, "Shutdown requested, stopping dispatch");
                    break 'dispatch;
                }

                tokio::select! {
                    permit = sender.reserve() => match permit {
                        Ok(permit) => {
                            permit.send(path);
                            dispatched += 1;
                            continue 'dispatch;
                        }
                        Err(_) => {
                            warn!("All ingest workers exited, stopping dispatch");
                            break 'dispatch;
                        }
                    },
                    Ok(()) = shutdown.changed() => {}
                }
            }
        }

        dispatched
    }
}

fn spawn_workers(
    receiver: mpsc::Receiver<PathBuf>,
    worker_count: usize,
    context: Arc<WorkerContext>,
) -> JoinSet<()> {
    let shared_receiver = Arc::new(Mutex::new(receiver));

    let mut join_set = JoinSet::new();
    for worker_idx in 0..worker_count {
        let rx = Arc::clone(&shared_receiver);
        let context = Arc::clone(&context);

        join_set.spawn(
            async move { run_worker(worker_idx, rx, context).await }.in_current_span(),
        );
    }

    join_set
}

async fn run_worker(
    worker_idx: usize,
    receiver: Arc<Mutex<mpsc::Receiver<PathBuf>>>,
    context: Arc<WorkerContext>,
) {
    while let Some(path) = receive_task(&receiver).await {
        process_worker_task(worker_idx, &context, path).await;
    }
    debug!(worker = worker_idx, "Worker terminating (queue closed)");
}

async fn receive_task(receiver: &Arc<Mutex<mpsc::Receiver<PathBuf>>>) -> Option<PathBuf> {
    let mut guard = receiver.lock().await;
    guard.recv().await
}

async fn process_worker_task(worker_idx: usize, context: &WorkerContext, path: PathBuf) {
    let stats = &context.stats;
    let timeout = context.options.task_timeout;

    let result = match tokio::time::timeout(timeout, ingest_file(context, path.clone())).await {
        Ok(result) => result,
        Err(_) => {
            stats.timed_out.fetch_add(1, Ordering::Relaxed);
            Err(IndexerError::Timeout {
                seconds: timeout.as_secs(),
                context: path.display().to_string(),
            })
        }
    };

    match result {
        Ok(outcome) => {
            stats.successful.fetch_add(1, Ordering::Relaxed);
            match outcome {
                TaskOutcome::Stored(UpsertOutcome::Inserted) => {
                    stats.inserted.fetch_add(1, Ordering::Relaxed);
                }
                TaskOutcome::Stored(UpsertOutcome::Updated) => {
                    stats.updated.fetch_add(1, Ordering::Relaxed);
                }
                TaskOutcome::Stored(UpsertOutcome::SkippedDuplicate) => {
                    stats.skipped_duplicates.fetch_add(1, Ordering::Relaxed);
                }
                TaskOutcome::Normalized => {}
            }
            debug!(worker = worker_idx, path = %path.display(), outcome = ?outcome, "File ingested");
        }
        Err(e) => {
            stats.failed.fetch_add(1, Ordering::Relaxed);
            warn!(worker = worker_idx, path = %path.display(), error = %e, "Failed to ingest file");
            stats
                .failures
                .lock()
                .await
                .push(IngestFailure::new(path, e.to_string()));
        }
    }
}

/// Full pipeline for one file
async fn ingest_file(context: &WorkerContext, path: PathBuf) -> Result<TaskOutcome> {
    let normalizer = context.normalizer.clone();
    let record = tokio::task::spawn_blocking(move || normalizer.extract(&path))
        .await
        .map_err(|e| IndexerError::Other(format!("Decode task failed: {e}")))??;

    if context.options.dry_run {
        return Ok(TaskOutcome::Normalized);
    }

    let outcome = context
        .store
        .upsert(&record, context.options.duplicate_policy)
        .await?;
    Ok(TaskOutcome::Stored(outcome))
}
