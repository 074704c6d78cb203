//! Worker pool: the dequeue side of the shared task queue.
//!
//! Each worker pulls tasks, runs the pipeline with the configured retry
//! policy, and handles deletions.  Workers share no mutable state beyond
//! the job store and the [`InFlight`] guard — all progress coordination
//! happens through the persisted job record.

use std::sync::Arc;

use crate::dispatch::dispatcher::{InFlight, RetryPolicy, SharedTaskReceiver, TaskDispatcher};
use crate::dispatch::task::Task;
use crate::pipeline::{remove_artifact, PipelineRunner};
use crate::store::{JobStore, StoreError};

/// How long a deferred delete waits before being re-enqueued.
const DELETE_RETRY_DELAY: std::time::Duration = std::time::Duration::from_millis(250);

// ---------------------------------------------------------------------------
// WorkerPool
// ---------------------------------------------------------------------------

/// Spawns and owns the worker tasks.
pub struct WorkerPool;

impl WorkerPool {
    /// Spawn `count` workers onto the current tokio runtime.
    ///
    /// Workers run until the task queue closes.  The returned handles are
    /// only needed for tests and shutdown bookkeeping; the workers
    /// themselves keep the queue alive through their dispatcher clone.
    pub fn spawn(
        count: usize,
        runner: Arc<PipelineRunner>,
        store: Arc<JobStore>,
        dispatcher: TaskDispatcher,
        rx: SharedTaskReceiver,
        in_flight: InFlight,
        policy: RetryPolicy,
    ) -> Vec<tokio::task::JoinHandle<()>> {
        (0..count.max(1))
            .map(|worker_id| {
                let runner = Arc::clone(&runner);
                let store = Arc::clone(&store);
                let dispatcher = dispatcher.clone();
                let rx = Arc::clone(&rx);
                let in_flight = in_flight.clone();
                let policy = policy.clone();

                tokio::spawn(async move {
                    worker_loop(worker_id, runner, store, dispatcher, rx, in_flight, policy)
                        .await;
                })
            })
            .collect()
    }
}

async fn worker_loop(
    worker_id: usize,
    runner: Arc<PipelineRunner>,
    store: Arc<JobStore>,
    dispatcher: TaskDispatcher,
    rx: SharedTaskReceiver,
    in_flight: InFlight,
    policy: RetryPolicy,
) {
    loop {
        // Hold the receiver lock only for the dequeue itself so other
        // workers can pull while this one is busy.
        let task = { rx.lock().await.recv().await };

        let Some(task) = task else {
            log::info!("worker {worker_id}: task queue closed, shutting down");
            break;
        };

        match task {
            Task::Process { job_id } => {
                process_task(&runner, &in_flight, &policy, &job_id).await;
            }
            Task::Delete { job_id } => {
                handle_delete(&store, &dispatcher, &in_flight, &job_id).await;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Process
// ---------------------------------------------------------------------------

/// Run the pipeline for one job, applying the retry policy.
///
/// The in-flight guard makes a concurrently delivered duplicate a no-op;
/// the claim guard inside the runner covers re-delivery after completion.
pub(crate) async fn process_task(
    runner: &PipelineRunner,
    in_flight: &InFlight,
    policy: &RetryPolicy,
    job_id: &str,
) {
    if !in_flight.begin(job_id) {
        log::debug!("worker: job {job_id} already in flight, dropping duplicate");
        return;
    }

    run_with_retries(runner, policy, job_id).await;

    in_flight.end(job_id);
}

async fn run_with_retries(runner: &PipelineRunner, policy: &RetryPolicy, job_id: &str) {
    let job = match runner.claim(job_id) {
        Ok(Some(job)) => job,
        Ok(None) => return,
        Err(e) => {
            // Leave the job for the reconciliation sweep rather than guess.
            log::error!("worker: claim failed for job {job_id}: {e}");
            return;
        }
    };

    let mut retries = 0u32;
    loop {
        match runner.execute(&job).await {
            Ok(_) => return,
            Err(e) if e.is_retryable() && retries + 1 < policy.max_attempts => {
                let delay = policy.delay_for(retries);
                retries += 1;
                log::warn!(
                    "worker: job {} attempt {}/{} failed transiently ({e}); retrying in {:?}",
                    job.id,
                    retries,
                    policy.max_attempts,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                log::error!("worker: job {} failed: {e}", job.id);
                runner.mark_failed(&job.id);
                return;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

/// Delete a job, its segments, and its audio artifact.
///
/// A job whose execution is still in flight is not touched: the delete is
/// re-enqueued and tried again once the execution has finished, so an
/// in-progress commit is never corrupted.  Row removal happens before file
/// removal — a crash in between leaves an orphaned file, never a dangling
/// database reference.
pub(crate) async fn handle_delete(
    store: &JobStore,
    dispatcher: &TaskDispatcher,
    in_flight: &InFlight,
    job_id: &str,
) {
    if in_flight.contains(job_id) {
        log::debug!("worker: job {job_id} still in flight, deferring delete");
        tokio::time::sleep(DELETE_RETRY_DELAY).await;
        if dispatcher.dispatch_delete(job_id).await.is_err() {
            log::warn!("worker: queue closed, dropping deferred delete for job {job_id}");
        }
        return;
    }

    match store.delete(job_id) {
        Ok(path) => {
            remove_artifact(&path);
            log::info!("worker: job {job_id} deleted");
        }
        Err(StoreError::NotFound(_)) => {
            log::info!("worker: delete requested for unknown job {job_id}");
        }
        Err(e) => {
            log::error!("worker: delete failed for job {job_id}: {e}");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
