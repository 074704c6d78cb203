//! Job and segment data model, including the job state machine.
//!
//! [`JobStatus`] drives the pipeline's state machine.  The transitions are:
//!
//! ```text
//! Queued ──worker claims──────▶ Processing
//!                               ──atomic commit──▶ Completed
//!                               ──failure────────▶ Failed
//! Queued ──reconciler sweep───▶ Failed   (orphaned job, never dispatched)
//! ```
//!
//! `Completed` and `Failed` are terminal: no transition leaves them.
//! Re-processing a terminal job requires submitting a *new* job.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// JobStatus
// ---------------------------------------------------------------------------

/// Lifecycle states of a transcription job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Created by the submission path; waiting for a worker.
    Queued,
    /// A worker's pipeline runner has claimed the job and is executing it.
    Processing,
    /// Both adapters returned, alignment ran, and segments were committed.
    Completed,
    /// The pipeline gave up: deterministic input error, exhausted retries,
    /// commit failure, or the reconciler declared the job orphaned.
    Failed,
}

impl JobStatus {
    /// Database / wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Parse the database representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "queued" => Some(JobStatus::Queued),
            "processing" => Some(JobStatus::Processing),
            "completed" => Some(JobStatus::Completed),
            "failed" => Some(JobStatus::Failed),
            _ => None,
        }
    }

    /// Returns `true` for states no transition may leave.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Whether the state machine permits moving from `self` to `next`.
    ///
    /// `Queued → Failed` is legal only for the reconciliation sweep (an
    /// orphaned job that never reached a worker); the normal path always
    /// goes through `Processing`.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Queued, JobStatus::Processing)
                | (JobStatus::Queued, JobStatus::Failed)
                | (JobStatus::Processing, JobStatus::Completed)
                | (JobStatus::Processing, JobStatus::Failed)
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// One end-to-end transcription + diarization run for one audio artifact.
///
/// `model` and `language` are immutable configuration chosen at submission.
/// `speaker_count` and `duration` are written exactly once, on the
/// transition into `Completed`.
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    /// Opaque unique identifier, assigned at creation.
    pub id: String,
    /// Original filename supplied at upload.
    pub filename: String,
    /// Path to the audio artifact this job owns.
    pub source_path: String,
    /// Current state-machine position.
    pub status: JobStatus,
    /// Set at creation, immutable.
    pub created_at: DateTime<Utc>,
    /// Set exactly once, on transition into a terminal state.
    pub completed_at: Option<DateTime<Utc>>,
    /// Whisper model name chosen at submission.
    pub model: String,
    /// Language hint chosen at submission; `None` means auto-detect.
    pub language: Option<String>,
    /// Distinct speaker labels in the committed segments; 0 until completed.
    pub speaker_count: i64,
    /// Audio duration in seconds; set on completion.
    pub duration: Option<f64>,
}

// ---------------------------------------------------------------------------
// Segment
// ---------------------------------------------------------------------------

/// One persisted speaker-attributed span of text, owned by a job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    /// Row id.
    pub id: i64,
    /// Owning job.
    pub job_id: String,
    /// Start time in seconds.
    pub start_time: f64,
    /// End time in seconds; always greater than `start_time`.
    pub end_time: f64,
    /// Transcribed text.
    pub text: String,
    /// Speaker label from alignment.
    pub speaker: String,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
