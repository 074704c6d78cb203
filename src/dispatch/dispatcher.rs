//! Task dispatcher: enqueue side of the shared work queue.
//!
//! [`TaskDispatcher`] is the handle the submission path calls exactly once
//! per job (`dispatch`) or per deletion request (`dispatch_delete`).  It is
//! fire-and-forget: the returned [`DispatchAck`] only confirms enqueueing —
//! progress is observed through the job record, never through the ack.
//!
//! [`InFlight`] is the at-most-one-execution-per-job guard shared between
//! the dispatcher and the workers.  [`RetryPolicy`] bounds how often a
//! transient failure is retried and how long each backoff sleeps.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::config::WorkerConfig;
use crate::dispatch::task::{DispatchAck, Task};

// ---------------------------------------------------------------------------
// DispatchError
// ---------------------------------------------------------------------------

/// Errors surfaced by the dispatcher.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The worker pool shut down and the queue is closed.
    #[error("task queue is closed")]
    QueueClosed,
}

// ---------------------------------------------------------------------------
// InFlight
// ---------------------------------------------------------------------------

/// Set of job ids with an execution currently running on some worker.
///
/// Cheap to clone.  Lock scope is a single insert/remove/lookup; never held
/// across `.await` points.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    ids: Arc<Mutex<HashSet<String>>>,
}

impl InFlight {
    /// Create an empty guard set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to begin an execution for `job_id`.  Returns `false` when one is
    /// already running — the caller must drop the task.
    pub fn begin(&self, job_id: &str) -> bool {
        self.ids.lock().unwrap().insert(job_id.to_string())
    }

    /// End the execution for `job_id`.
    pub fn end(&self, job_id: &str) {
        self.ids.lock().unwrap().remove(job_id);
    }

    /// Whether an execution for `job_id` is currently running.
    pub fn contains(&self, job_id: &str) -> bool {
        self.ids.lock().unwrap().contains(job_id)
    }
}

// ---------------------------------------------------------------------------
// TaskDispatcher
// ---------------------------------------------------------------------------

/// Enqueue handle for the shared task queue.  Cheap to clone.
#[derive(Debug, Clone)]
pub struct TaskDispatcher {
    tx: mpsc::Sender<Task>,
}

/// Receive side of the task queue, shared by all workers in the pool.
pub type SharedTaskReceiver = Arc<tokio::sync::Mutex<mpsc::Receiver<Task>>>;

/// Create the task queue and return its two ends.
pub fn task_queue(depth: usize) -> (TaskDispatcher, SharedTaskReceiver) {
    let (tx, rx) = mpsc::channel(depth.max(1));
    (
        TaskDispatcher { tx },
        Arc::new(tokio::sync::Mutex::new(rx)),
    )
}

impl TaskDispatcher {
    /// Enqueue a pipeline execution for `job_id`.
    ///
    /// Called exactly once per job by the submission path.  Re-delivery is
    /// harmless: the in-flight guard and the store's claim guard make a
    /// duplicate execution a no-op.
    pub async fn dispatch(&self, job_id: &str) -> Result<DispatchAck, DispatchError> {
        self.send(Task::Process {
            job_id: job_id.to_string(),
        })
        .await
    }

    /// Enqueue a deletion for `job_id`.
    pub async fn dispatch_delete(&self, job_id: &str) -> Result<DispatchAck, DispatchError> {
        self.send(Task::Delete {
            job_id: job_id.to_string(),
        })
        .await
    }

    async fn send(&self, task: Task) -> Result<DispatchAck, DispatchError> {
        let job_id = task.job_id().to_string();
        self.tx
            .send(task)
            .await
            .map_err(|_| DispatchError::QueueClosed)?;
        log::debug!("dispatch: enqueued task for job {job_id}");
        Ok(DispatchAck { job_id })
    }
}

// ---------------------------------------------------------------------------
// RetryPolicy
// ---------------------------------------------------------------------------

/// Bounded exponential backoff for transient pipeline failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts (first run + retries).  1 disables retries.
    pub max_attempts: u32,
    /// Backoff before retry `n` (0-based) is `base_backoff * 2^n`.
    pub base_backoff: Duration,
}

impl RetryPolicy {
    /// Build the policy from worker configuration.
    pub fn from_config(config: &WorkerConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }

    /// Backoff to sleep before the retry with 0-based index `retry`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_backoff * 2_u32.saturating_pow(retry)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&WorkerConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
