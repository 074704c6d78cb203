//! Reconciliation sweep for orphaned jobs.
//!
//! A `queued` job whose execution was lost (daemon restart before dispatch)
//! or a `processing` job whose worker died without reporting would sit in a
//! non-terminal state forever.  The reconciler periodically force-fails any
//! non-terminal job older than the orphan timeout, so the job record never
//! lies about work that will not happen.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::config::WorkerConfig;
use crate::store::JobStore;

// ---------------------------------------------------------------------------
// Reconciler
// ---------------------------------------------------------------------------

/// Periodic sweep that force-fails orphaned jobs.
pub struct Reconciler {
    store: Arc<JobStore>,
    orphan_timeout: chrono::Duration,
    interval: Duration,
}

impl Reconciler {
    /// Build a reconciler from worker configuration.
    ///
    /// The orphan timeout should be comfortably larger than the adapter
    /// timeout bound, so a legitimately slow job is never swept mid-run.
    pub fn new(store: Arc<JobStore>, config: &WorkerConfig) -> Self {
        Self {
            store,
            orphan_timeout: chrono::Duration::seconds(config.orphan_timeout_secs as i64),
            interval: Duration::from_secs(config.reconcile_interval_secs.max(1)),
        }
    }

    /// Run one sweep: force-fail every non-terminal job older than the
    /// orphan timeout.  Returns the number of jobs transitioned.
    pub fn sweep(&self) -> usize {
        let cutoff = Utc::now() - self.orphan_timeout;

        let stale = match self.store.stale_jobs(cutoff) {
            Ok(ids) => ids,
            Err(e) => {
                log::error!("reconcile: sweep query failed: {e}");
                return 0;
            }
        };

        let mut failed = 0;
        for id in stale {
            match self.store.fail(&id) {
                Ok(true) => {
                    log::warn!("reconcile: job {id} orphaned → failed");
                    failed += 1;
                }
                // Lost a race with a worker that just finished it.
                Ok(false) => {}
                Err(e) => log::error!("reconcile: could not fail orphaned job {id}: {e}"),
            }
        }
        failed
    }

    /// Sweep forever at the configured interval.  Spawn as a tokio task.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        // The first tick fires immediately; skip it so a restart does not
        // sweep before the startup re-dispatch has had a chance to run.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let failed = self.sweep();
            if failed > 0 {
                log::info!("reconcile: force-failed {failed} orphaned job(s)");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::JobStatus;
    use rusqlite::{params, Connection};
    use tempfile::tempdir;

    fn insert_job(store: &JobStore, id: &str, status: &str, created_at: &str) {
        let conn = Connection::open(store.path()).unwrap();
        conn.execute(
            "INSERT INTO job (id, filename, source_path, status, created_at, model, speaker_count)
             VALUES (?1, 'f.wav', '/tmp/f', ?2, ?3, 'base', 0)",
            params![id, status, created_at],
        )
        .unwrap();
    }

    fn make_reconciler(store: Arc<JobStore>, orphan_timeout_secs: u64) -> Reconciler {
        let mut config = WorkerConfig::default();
        config.orphan_timeout_secs = orphan_timeout_secs;
        Reconciler::new(store, &config)
    }

    #[test]
    fn sweep_fails_old_non_terminal_jobs() {
        let dir = tempdir().unwrap();
        let store = Arc::new(JobStore::open(dir.path().join("jobs.db")).unwrap());

        insert_job(&store, "old-queued", "queued", "2020-01-01T00:00:00+00:00");
        insert_job(
            &store,
            "old-processing",
            "processing",
            "2020-01-01T00:00:00+00:00",
        );
        insert_job(
            &store,
            "old-completed",
            "completed",
            "2020-01-01T00:00:00+00:00",
        );

        let reconciler = make_reconciler(Arc::clone(&store), 3_600);
        assert_eq!(reconciler.sweep(), 2);

        assert_eq!(
            store.job("old-queued").unwrap().unwrap().status,
            JobStatus::Failed
        );
        assert_eq!(
            store.job("old-processing").unwrap().unwrap().status,
            JobStatus::Failed
        );
        assert_eq!(
            store.job("old-completed").unwrap().unwrap().status,
            JobStatus::Completed
        );
    }

    #[test]
    fn sweep_leaves_fresh_jobs_alone() {
        let dir = tempdir().unwrap();
        let store = Arc::new(JobStore::open(dir.path().join("jobs.db")).unwrap());

        let job = store
            .create_job("f.wav", std::path::Path::new("/tmp/f.wav"), "base", None)
            .unwrap();

        let reconciler = make_reconciler(Arc::clone(&store), 3_600);
        assert_eq!(reconciler.sweep(), 0);
        assert_eq!(
            store.job(&job.id).unwrap().unwrap().status,
            JobStatus::Queued
        );
    }

    #[test]
    fn repeated_sweeps_are_idempotent() {
        let dir = tempdir().unwrap();
        let store = Arc::new(JobStore::open(dir.path().join("jobs.db")).unwrap());

        insert_job(&store, "old-queued", "queued", "2020-01-01T00:00:00+00:00");

        let reconciler = make_reconciler(Arc::clone(&store), 3_600);
        assert_eq!(reconciler.sweep(), 1);
        // Already failed; the guard refuses a second transition.
        assert_eq!(reconciler.sweep(), 0);
    }
}
