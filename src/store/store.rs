//! SQLite-backed job store.
//!
//! The store is the single source of truth and the synchronisation point
//! between workers: every state transition goes through a guarded `UPDATE`,
//! and the commit of segments + `completed` status is one transaction, so a
//! crash between the two can never leave a completed job with partial
//! segments.
//!
//! Each call opens its own connection (`foreign_keys=ON`); SQLite's file
//! locking arbitrates between concurrent workers.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use thiserror::Error;

use crate::align::AlignedSegment;
use crate::store::job::{Job, JobStatus, Segment};

// ---------------------------------------------------------------------------
// StoreError
// ---------------------------------------------------------------------------

/// Errors surfaced by the job store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No job with the given id exists.
    #[error("job not found: {0}")]
    NotFound(String),

    /// A guarded transition was refused because the job is not in the
    /// required state (e.g. completing a job that is not `processing`).
    #[error("job {id} is {found}, refusing transition")]
    WrongState {
        /// Job id the transition was attempted on.
        id: String,
        /// State the job was actually in.
        found: JobStatus,
    },

    /// Underlying SQLite failure.
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),
}

// ---------------------------------------------------------------------------
// JobStore
// ---------------------------------------------------------------------------

/// Handle to the job database.  Cheap to clone the path; connections are
/// per-call.
#[derive(Debug, Clone)]
pub struct JobStore {
    db_path: PathBuf,
}

impl JobStore {
    /// Open or create the database at `db_path` and ensure the schema
    /// exists.
    pub fn open(db_path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let this = Self {
            db_path: db_path.into(),
        };
        this.init()?;
        Ok(this)
    }

    /// Path to the underlying database file.
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn conn(&self) -> Result<Connection, StoreError> {
        let conn = Connection::open_with_flags(
            &self.db_path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        )?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        Ok(conn)
    }

    fn init(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.db_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS job (
                id TEXT PRIMARY KEY,
                filename TEXT NOT NULL,
                source_path TEXT NOT NULL,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL,
                completed_at TEXT NULL,
                model TEXT NOT NULL,
                language TEXT NULL,
                speaker_count INTEGER NOT NULL DEFAULT 0,
                duration REAL NULL
            );
            CREATE INDEX IF NOT EXISTS idx_job_status ON job(status);
            CREATE INDEX IF NOT EXISTS idx_job_created_at ON job(created_at);

            CREATE TABLE IF NOT EXISTS segment (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                job_id TEXT NOT NULL,
                start_time REAL NOT NULL,
                end_time REAL NOT NULL,
                text TEXT NOT NULL,
                speaker TEXT NOT NULL,
                confidence REAL NOT NULL,
                FOREIGN KEY(job_id) REFERENCES job(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_segment_job_id ON segment(job_id);
            CREATE UNIQUE INDEX IF NOT EXISTS idx_segment_dedup
                ON segment(job_id, start_time, end_time, text);
            "#,
        )?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Creation and lookup
    // -----------------------------------------------------------------------

    /// Create a new job in `queued` state and return its row.
    pub fn create_job(
        &self,
        filename: &str,
        source_path: &Path,
        model: &str,
        language: Option<&str>,
    ) -> Result<Job, StoreError> {
        let id = uuid::Uuid::new_v4().to_string();
        let created_at = Utc::now();

        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO job (id, filename, source_path, status, created_at, completed_at,
                             model, language, speaker_count, duration)
            VALUES (?1, ?2, ?3, ?4, ?5, NULL, ?6, ?7, 0, NULL)
            "#,
            params![
                id,
                filename,
                source_path.display().to_string(),
                JobStatus::Queued.as_str(),
                created_at.to_rfc3339(),
                model,
                language,
            ],
        )?;

        Ok(Job {
            id,
            filename: filename.to_string(),
            source_path: source_path.display().to_string(),
            status: JobStatus::Queued,
            created_at,
            completed_at: None,
            model: model.to_string(),
            language: language.map(String::from),
            speaker_count: 0,
            duration: None,
        })
    }

    /// Fetch a job by id.
    pub fn job(&self, id: &str) -> Result<Option<Job>, StoreError> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT id, filename, source_path, status, created_at, completed_at,
                        model, language, speaker_count, duration
                 FROM job WHERE id = ?1",
                params![id],
                map_job,
            )
            .optional()?;
        Ok(row)
    }

    /// List jobs ordered by creation time, newest first.
    pub fn history(&self, limit: u32, offset: u32) -> Result<Vec<Job>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, filename, source_path, status, created_at, completed_at,
                    model, language, speaker_count, duration
             FROM job ORDER BY created_at DESC LIMIT ?1 OFFSET ?2",
        )?;
        let rows = stmt
            .query_map(params![limit, offset], map_job)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Segments for a job, ordered by start time.
    pub fn segments(&self, job_id: &str) -> Result<Vec<Segment>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, job_id, start_time, end_time, text, speaker, confidence
             FROM segment WHERE job_id = ?1 ORDER BY start_time ASC, id ASC",
        )?;
        let rows = stmt
            .query_map(params![job_id], |r| {
                Ok(Segment {
                    id: r.get(0)?,
                    job_id: r.get(1)?,
                    start_time: r.get(2)?,
                    end_time: r.get(3)?,
                    text: r.get(4)?,
                    speaker: r.get(5)?,
                    confidence: r.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Full transcript text for a job: segment texts joined with spaces.
    pub fn transcript_text(&self, job_id: &str) -> Result<String, StoreError> {
        let segments = self.segments(job_id)?;
        Ok(segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" "))
    }

    /// Ids of all jobs currently in `queued` state (startup re-dispatch).
    pub fn queued_jobs(&self) -> Result<Vec<String>, StoreError> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT id FROM job WHERE status = ?1 ORDER BY created_at ASC")?;
        let rows = stmt
            .query_map(params![JobStatus::Queued.as_str()], |r| r.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Ids of non-terminal jobs created before `cutoff` — candidates for
    /// the reconciliation sweep.
    pub fn stale_jobs(&self, cutoff: DateTime<Utc>) -> Result<Vec<String>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id FROM job
             WHERE status IN (?1, ?2) AND created_at < ?3
             ORDER BY created_at ASC",
        )?;
        let rows = stmt
            .query_map(
                params![
                    JobStatus::Queued.as_str(),
                    JobStatus::Processing.as_str(),
                    cutoff.to_rfc3339(),
                ],
                |r| r.get(0),
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // -----------------------------------------------------------------------
    // Guarded transitions
    // -----------------------------------------------------------------------

    /// Claim a queued job for processing (`queued → processing`).
    ///
    /// Returns `false` when the job is missing, already claimed, or
    /// terminal — a re-delivered task finds the guard closed and does
    /// nothing, which is what makes delivery idempotent.
    pub fn claim(&self, id: &str) -> Result<bool, StoreError> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE job SET status = ?1 WHERE id = ?2 AND status = ?3",
            params![
                JobStatus::Processing.as_str(),
                id,
                JobStatus::Queued.as_str()
            ],
        )?;
        Ok(changed == 1)
    }

    /// Commit a finished pipeline run (`processing → completed`).
    ///
    /// Segment inserts and the status update are one transaction; if the
    /// guard finds the job outside `processing` nothing is written and
    /// [`StoreError::WrongState`] (or [`StoreError::NotFound`]) is returned.
    pub fn complete(
        &self,
        id: &str,
        segments: &[AlignedSegment],
        speaker_count: i64,
        duration: f64,
    ) -> Result<(), StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let status: Option<String> = tx
            .query_row("SELECT status FROM job WHERE id = ?1", params![id], |r| {
                r.get(0)
            })
            .optional()?;

        match status.as_deref().and_then(JobStatus::parse) {
            None => return Err(StoreError::NotFound(id.to_string())),
            Some(JobStatus::Processing) => {}
            Some(found) => {
                return Err(StoreError::WrongState {
                    id: id.to_string(),
                    found,
                })
            }
        }

        {
            let mut stmt = tx.prepare(
                "INSERT INTO segment (job_id, start_time, end_time, text, speaker, confidence)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for seg in segments {
                stmt.execute(params![
                    id,
                    seg.start,
                    seg.end,
                    seg.text,
                    seg.speaker,
                    seg.confidence,
                ])?;
            }
        }

        tx.execute(
            "UPDATE job SET status = ?1, completed_at = ?2, speaker_count = ?3, duration = ?4
             WHERE id = ?5",
            params![
                JobStatus::Completed.as_str(),
                Utc::now().to_rfc3339(),
                speaker_count,
                duration,
                id,
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    /// Mark a job failed, discarding any partially written segments in the
    /// same transaction.
    ///
    /// Returns `true` when the job moved to `failed`; `false` when the job
    /// is missing or already terminal (the guard refuses to touch it).
    pub fn fail(&self, id: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM segment WHERE job_id = ?1", params![id])?;
        let changed = tx.execute(
            "UPDATE job SET status = ?1, completed_at = ?2
             WHERE id = ?3 AND status IN (?4, ?5)",
            params![
                JobStatus::Failed.as_str(),
                Utc::now().to_rfc3339(),
                id,
                JobStatus::Queued.as_str(),
                JobStatus::Processing.as_str(),
            ],
        )?;

        if changed == 1 {
            tx.commit()?;
            Ok(true)
        } else {
            // Nothing transitioned; leave terminal jobs (and their
            // segments) untouched.
            Ok(false)
        }
    }

    // -----------------------------------------------------------------------
    // Deletion
    // -----------------------------------------------------------------------

    /// Delete a job and all its segments, returning the audio artifact path
    /// so the caller can remove the file as the LAST step.
    ///
    /// Returns [`StoreError::NotFound`] when no such job exists.  A crash
    /// after this call leaves an orphaned file, never a dangling database
    /// reference.
    pub fn delete(&self, id: &str) -> Result<PathBuf, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let source_path: Option<String> = tx
            .query_row(
                "SELECT source_path FROM job WHERE id = ?1",
                params![id],
                |r| r.get(0),
            )
            .optional()?;

        let Some(source_path) = source_path else {
            return Err(StoreError::NotFound(id.to_string()));
        };

        tx.execute("DELETE FROM segment WHERE job_id = ?1", params![id])?;
        tx.execute("DELETE FROM job WHERE id = ?1", params![id])?;
        tx.commit()?;

        Ok(PathBuf::from(source_path))
    }
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

fn map_job(r: &rusqlite::Row<'_>) -> rusqlite::Result<Job> {
    let status_text: String = r.get(3)?;
    let status = JobStatus::parse(&status_text).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("unknown job status: {status_text}").into(),
        )
    })?;

    let created_at: String = r.get(4)?;
    let created_at = parse_ts(&created_at, 4)?;

    let completed_at: Option<String> = r.get(5)?;
    let completed_at = completed_at.map(|s| parse_ts(&s, 5)).transpose()?;

    Ok(Job {
        id: r.get(0)?,
        filename: r.get(1)?,
        source_path: r.get(2)?,
        status,
        created_at,
        completed_at,
        model: r.get(6)?,
        language: r.get(7)?,
        speaker_count: r.get(8)?,
        duration: r.get(9)?,
    })
}

fn parse_ts(s: &str, col: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(col, rusqlite::types::Type::Text, e.into())
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn open_store(dir: &tempfile::TempDir) -> JobStore {
        JobStore::open(dir.path().join("jobs.db")).expect("open store")
    }

    fn seg(start: f64, end: f64, text: &str, speaker: &str) -> AlignedSegment {
        AlignedSegment {
            start,
            end,
            text: text.into(),
            speaker: speaker.into(),
            confidence: 0.95,
        }
    }

    // ---- creation / lookup -------------------------------------------------

    #[test]
    fn create_and_fetch_job() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);

        let job = store
            .create_job("meeting.wav", Path::new("/tmp/t/meeting.wav"), "base", None)
            .unwrap();

        let fetched = store.job(&job.id).unwrap().expect("job exists");
        assert_eq!(fetched.id, job.id);
        assert_eq!(fetched.filename, "meeting.wav");
        assert_eq!(fetched.status, JobStatus::Queued);
        assert_eq!(fetched.speaker_count, 0);
        assert!(fetched.completed_at.is_none());
        assert!(fetched.duration.is_none());
    }

    #[test]
    fn fetch_missing_job_is_none() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);
        assert!(store.job("no-such-id").unwrap().is_none());
    }

    #[test]
    fn history_is_newest_first_and_paginated() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);

        // Distinct created_at values via explicit inserts.
        let conn = Connection::open(store.path()).unwrap();
        for (i, name) in ["a.wav", "b.wav", "c.wav"].iter().enumerate() {
            conn.execute(
                "INSERT INTO job (id, filename, source_path, status, created_at, model, speaker_count)
                 VALUES (?1, ?2, '/tmp/x', 'queued', ?3, 'base', 0)",
                params![format!("job-{i}"), name, format!("2026-01-0{}T00:00:00+00:00", i + 1)],
            )
            .unwrap();
        }

        let page = store.history(2, 0).unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].filename, "c.wav");
        assert_eq!(page[1].filename, "b.wav");

        let rest = store.history(2, 2).unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].filename, "a.wav");
    }

    // ---- claim -------------------------------------------------------------

    #[test]
    fn claim_moves_queued_to_processing() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);
        let job = store
            .create_job("a.wav", Path::new("/tmp/a.wav"), "base", None)
            .unwrap();

        assert!(store.claim(&job.id).unwrap());
        assert_eq!(store.job(&job.id).unwrap().unwrap().status, JobStatus::Processing);
    }

    #[test]
    fn second_claim_is_refused() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);
        let job = store
            .create_job("a.wav", Path::new("/tmp/a.wav"), "base", None)
            .unwrap();

        assert!(store.claim(&job.id).unwrap());
        assert!(!store.claim(&job.id).unwrap());
    }

    #[test]
    fn claim_of_missing_job_is_refused() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);
        assert!(!store.claim("ghost").unwrap());
    }

    // ---- complete ----------------------------------------------------------

    #[test]
    fn complete_writes_segments_and_metadata_atomically() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);
        let job = store
            .create_job("a.wav", Path::new("/tmp/a.wav"), "base", None)
            .unwrap();
        store.claim(&job.id).unwrap();

        let segments = vec![
            seg(0.0, 2.0, "hello", "S1"),
            seg(2.0, 4.0, "there", "S2"),
        ];
        store.complete(&job.id, &segments, 2, 4.0).unwrap();

        let fetched = store.job(&job.id).unwrap().unwrap();
        assert_eq!(fetched.status, JobStatus::Completed);
        assert_eq!(fetched.speaker_count, 2);
        assert_eq!(fetched.duration, Some(4.0));
        assert!(fetched.completed_at.is_some());

        let stored = store.segments(&job.id).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].text, "hello");
        assert_eq!(stored[1].speaker, "S2");
        assert_eq!(store.transcript_text(&job.id).unwrap(), "hello there");
    }

    #[test]
    fn complete_with_no_segments_still_completes() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);
        let job = store
            .create_job("silent.wav", Path::new("/tmp/s.wav"), "base", None)
            .unwrap();
        store.claim(&job.id).unwrap();

        store.complete(&job.id, &[], 0, 1.5).unwrap();

        let fetched = store.job(&job.id).unwrap().unwrap();
        assert_eq!(fetched.status, JobStatus::Completed);
        assert_eq!(fetched.speaker_count, 0);
        assert!(store.segments(&job.id).unwrap().is_empty());
    }

    /// Completing a job that is not `processing` must refuse and write
    /// nothing — re-running a finished job cannot double-append segments.
    #[test]
    fn complete_refuses_wrong_state_without_writing() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);
        let job = store
            .create_job("a.wav", Path::new("/tmp/a.wav"), "base", None)
            .unwrap();
        store.claim(&job.id).unwrap();
        store.complete(&job.id, &[seg(0.0, 1.0, "x", "S1")], 1, 1.0).unwrap();

        // Second commit attempt: refused, and the segment count is unchanged.
        let err = store
            .complete(&job.id, &[seg(0.0, 1.0, "x", "S1")], 1, 1.0)
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::WrongState {
                found: JobStatus::Completed,
                ..
            }
        ));
        assert_eq!(store.segments(&job.id).unwrap().len(), 1);
    }

    #[test]
    fn complete_of_queued_job_is_refused() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);
        let job = store
            .create_job("a.wav", Path::new("/tmp/a.wav"), "base", None)
            .unwrap();

        let err = store.complete(&job.id, &[], 0, 1.0).unwrap_err();
        assert!(matches!(
            err,
            StoreError::WrongState {
                found: JobStatus::Queued,
                ..
            }
        ));
    }

    #[test]
    fn complete_of_missing_job_is_not_found() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);
        let err = store.complete("ghost", &[], 0, 1.0).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    /// Duplicate `(start, end, text)` segments within one commit violate
    /// the uniqueness index and roll the whole transaction back.
    #[test]
    fn duplicate_segments_roll_back_the_commit() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);
        let job = store
            .create_job("a.wav", Path::new("/tmp/a.wav"), "base", None)
            .unwrap();
        store.claim(&job.id).unwrap();

        let dup = vec![seg(0.0, 1.0, "same", "S1"), seg(0.0, 1.0, "same", "S2")];
        assert!(store.complete(&job.id, &dup, 2, 1.0).is_err());

        // Nothing was written and the job is still processing.
        let fetched = store.job(&job.id).unwrap().unwrap();
        assert_eq!(fetched.status, JobStatus::Processing);
        assert!(store.segments(&job.id).unwrap().is_empty());
    }

    // ---- fail --------------------------------------------------------------

    #[test]
    fn fail_discards_partial_segments() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);
        let job = store
            .create_job("a.wav", Path::new("/tmp/a.wav"), "base", None)
            .unwrap();
        store.claim(&job.id).unwrap();

        // Simulate a partial write from a crashed commit attempt.
        let conn = Connection::open(store.path()).unwrap();
        conn.execute(
            "INSERT INTO segment (job_id, start_time, end_time, text, speaker, confidence)
             VALUES (?1, 0.0, 1.0, 'partial', 'S1', 0.9)",
            params![job.id],
        )
        .unwrap();

        assert!(store.fail(&job.id).unwrap());

        let fetched = store.job(&job.id).unwrap().unwrap();
        assert_eq!(fetched.status, JobStatus::Failed);
        assert!(fetched.completed_at.is_some());
        assert!(store.segments(&job.id).unwrap().is_empty());
    }

    #[test]
    fn fail_of_completed_job_is_refused_and_keeps_segments() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);
        let job = store
            .create_job("a.wav", Path::new("/tmp/a.wav"), "base", None)
            .unwrap();
        store.claim(&job.id).unwrap();
        store.complete(&job.id, &[seg(0.0, 1.0, "x", "S1")], 1, 1.0).unwrap();

        assert!(!store.fail(&job.id).unwrap());
        assert_eq!(store.job(&job.id).unwrap().unwrap().status, JobStatus::Completed);
        assert_eq!(store.segments(&job.id).unwrap().len(), 1);
    }

    #[test]
    fn fail_of_queued_job_is_allowed_for_reconciliation() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);
        let job = store
            .create_job("a.wav", Path::new("/tmp/a.wav"), "base", None)
            .unwrap();

        assert!(store.fail(&job.id).unwrap());
        assert_eq!(store.job(&job.id).unwrap().unwrap().status, JobStatus::Failed);
    }

    // ---- delete ------------------------------------------------------------

    #[test]
    fn delete_removes_job_and_all_segments() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);
        let job = store
            .create_job("a.wav", Path::new("/tmp/audio/a.wav"), "base", None)
            .unwrap();
        store.claim(&job.id).unwrap();
        let segments: Vec<AlignedSegment> = (0..5)
            .map(|i| seg(i as f64, i as f64 + 1.0, &format!("s{i}"), "S1"))
            .collect();
        store.complete(&job.id, &segments, 1, 5.0).unwrap();

        let path = store.delete(&job.id).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/audio/a.wav"));

        assert!(store.job(&job.id).unwrap().is_none());
        assert!(store.segments(&job.id).unwrap().is_empty());
    }

    #[test]
    fn delete_missing_job_reports_not_found() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);
        let err = store.delete("ghost").unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    // ---- sweeps ------------------------------------------------------------

    #[test]
    fn stale_jobs_finds_only_old_non_terminal_jobs() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);

        let conn = Connection::open(store.path()).unwrap();
        let mut insert = |id: &str, status: &str, created: &str| {
            conn.execute(
                "INSERT INTO job (id, filename, source_path, status, created_at, model, speaker_count)
                 VALUES (?1, 'f.wav', '/tmp/f', ?2, ?3, 'base', 0)",
                params![id, status, created],
            )
            .unwrap();
        };
        insert("old-queued", "queued", "2026-01-01T00:00:00+00:00");
        insert("old-processing", "processing", "2026-01-01T00:00:00+00:00");
        insert("old-completed", "completed", "2026-01-01T00:00:00+00:00");
        insert("fresh-queued", "queued", "2026-12-01T00:00:00+00:00");

        let cutoff = DateTime::parse_from_rfc3339("2026-06-01T00:00:00+00:00")
            .unwrap()
            .with_timezone(&Utc);
        let stale = store.stale_jobs(cutoff).unwrap();

        assert_eq!(stale, vec!["old-queued".to_string(), "old-processing".to_string()]);
    }

    #[test]
    fn queued_jobs_lists_only_queued() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);
        let a = store
            .create_job("a.wav", Path::new("/tmp/a.wav"), "base", None)
            .unwrap();
        let b = store
            .create_job("b.wav", Path::new("/tmp/b.wav"), "base", None)
            .unwrap();
        store.claim(&b.id).unwrap();

        let queued = store.queued_jobs().unwrap();
        assert_eq!(queued, vec![a.id]);
    }
}
