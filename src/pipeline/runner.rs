//! Pipeline runner — one dispatched execution of the audio → transcript flow.
//!
//! [`PipelineRunner`] composes the two inference adapters and the alignment
//! engine, then commits the result through the job store:
//!
//! ```text
//! claim (queued → processing)
//!   ├─▶ spawn_blocking(asr.transcribe)   ┐ concurrent, each under a
//!   └─▶ diarizer.diarize (async)         ┘ bounded timeout
//!         └─▶ align(spans, speakers)       synchronous join point
//!               └─▶ store.complete(...)    one transaction
//! ```
//!
//! All capabilities are injected at construction, so tests substitute fake
//! adapters and a temporary store deterministically.  Re-invoking the
//! runner for a job that is already terminal is a no-op: the claim guard
//! refuses and nothing is written.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::align::{align, distinct_speaker_count};
use crate::asr::{TranscriptionEngine, TranscriptionOutput};
use crate::diarize::{DiarizationEngine, DiarizationOutput};
use crate::store::{Job, JobStore};

use super::error::PipelineError;

// ---------------------------------------------------------------------------
// ExecutionSummary
// ---------------------------------------------------------------------------

/// What a successful execution committed.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionSummary {
    /// Number of segments written.
    pub segments: usize,
    /// Distinct speaker labels in the committed segments.
    pub speaker_count: i64,
    /// Audio duration in seconds.
    pub duration: f64,
}

// ---------------------------------------------------------------------------
// PipelineRunner
// ---------------------------------------------------------------------------

/// Drives one job through transcription, diarization, alignment and commit.
///
/// Shared across workers behind an `Arc`; holds no per-job state.
pub struct PipelineRunner {
    store: Arc<JobStore>,
    asr: Arc<dyn TranscriptionEngine>,
    diarizer: Arc<dyn DiarizationEngine>,
    adapter_timeout: Duration,
}

impl PipelineRunner {
    /// Create a runner with injected adapter handles.
    ///
    /// # Arguments
    ///
    /// * `store`           — job database, the source of truth for progress.
    /// * `asr`             — transcription adapter (blocking inference).
    /// * `diarizer`        — diarization adapter (async inference).
    /// * `adapter_timeout` — upper bound for each adapter call.
    pub fn new(
        store: Arc<JobStore>,
        asr: Arc<dyn TranscriptionEngine>,
        diarizer: Arc<dyn DiarizationEngine>,
        adapter_timeout: Duration,
    ) -> Self {
        Self {
            store,
            asr,
            diarizer,
            adapter_timeout,
        }
    }

    // -----------------------------------------------------------------------
    // Claim
    // -----------------------------------------------------------------------

    /// Claim the job for this execution (`queued → processing`).
    ///
    /// Returns `Ok(None)` when there is nothing to do: the job is missing,
    /// already terminal, or another worker holds it.  Re-delivery of an
    /// already-finished job lands here and never touches its segments.
    pub fn claim(&self, job_id: &str) -> Result<Option<Job>, PipelineError> {
        let Some(job) = self
            .store
            .job(job_id)
            .map_err(|e| PipelineError::Internal(e.to_string()))?
        else {
            log::warn!("pipeline: job {job_id} no longer exists, skipping");
            return Ok(None);
        };

        if job.status.is_terminal() {
            log::info!("pipeline: job {job_id} is already {}, skipping", job.status);
            return Ok(None);
        }

        if !self
            .store
            .claim(job_id)
            .map_err(|e| PipelineError::Internal(e.to_string()))?
        {
            log::info!("pipeline: job {job_id} claimed elsewhere, skipping");
            return Ok(None);
        }

        log::info!("pipeline: job {job_id} → processing");
        Ok(Some(job))
    }

    // -----------------------------------------------------------------------
    // Execute
    // -----------------------------------------------------------------------

    /// Run both adapters, align, and commit.  One attempt; the worker loop
    /// applies the retry policy around this call.
    pub async fn execute(&self, job: &Job) -> Result<ExecutionSummary, PipelineError> {
        let audio = PathBuf::from(&job.source_path);

        // ── 1. Both adapters, concurrently ───────────────────────────────
        // Transcription is CPU-bound → blocking thread pool; diarization is
        // an async call.  Both are bounded by the adapter timeout.  Segment
        // order later comes from the transcription output, not from which
        // adapter finishes first.
        let asr = Arc::clone(&self.asr);
        let asr_audio = audio.clone();
        let language = job.language.clone();

        let transcription_task = tokio::time::timeout(
            self.adapter_timeout,
            tokio::task::spawn_blocking(move || asr.transcribe(&asr_audio, language.as_deref())),
        );
        let diarization_task =
            tokio::time::timeout(self.adapter_timeout, self.diarizer.diarize(&audio));

        let (transcription_result, diarization_result) =
            tokio::join!(transcription_task, diarization_task);

        let transcription: TranscriptionOutput = match transcription_result {
            Err(_) => {
                return Err(PipelineError::Transient(
                    "transcription timed out".to_string(),
                ))
            }
            Ok(Err(join_err)) => return Err(PipelineError::Internal(join_err.to_string())),
            Ok(Ok(Err(asr_err))) => return Err(asr_err.into()),
            Ok(Ok(Ok(output))) => output,
        };

        let diarization: DiarizationOutput = match diarization_result {
            Err(_) => {
                return Err(PipelineError::Transient(
                    "diarization timed out".to_string(),
                ))
            }
            Ok(Err(diarize_err)) => return Err(diarize_err.into()),
            Ok(Ok(output)) => output,
        };

        log::debug!(
            "pipeline: job {} adapters done ({} spans, {} turns)",
            job.id,
            transcription.spans.len(),
            diarization.spans.len()
        );

        // ── 2. Alignment (pure join point) ───────────────────────────────
        let segments = align(&transcription.spans, &diarization.spans);
        let speaker_count = distinct_speaker_count(&segments) as i64;
        let duration = transcription.duration;

        // ── 3. Atomic commit (processing → completed) ────────────────────
        self.store
            .complete(&job.id, &segments, speaker_count, duration)?;

        log::info!(
            "pipeline: job {} → completed ({} segments, {} speakers, {:.1}s)",
            job.id,
            segments.len(),
            speaker_count,
            duration
        );

        Ok(ExecutionSummary {
            segments: segments.len(),
            speaker_count,
            duration,
        })
    }

    // -----------------------------------------------------------------------
    // Failure path
    // -----------------------------------------------------------------------

    /// Move the job to `failed`, discarding any partial segments.
    pub fn mark_failed(&self, job_id: &str) {
        match self.store.fail(job_id) {
            Ok(true) => log::info!("pipeline: job {job_id} → failed"),
            Ok(false) => {
                log::warn!("pipeline: job {job_id} already terminal, not marking failed")
            }
            Err(e) => log::error!("pipeline: could not mark job {job_id} failed: {e}"),
        }
    }
}

/// Remove an audio artifact from disk, tolerating a file that is already
/// gone.
pub fn remove_artifact(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => log::info!("removed audio artifact {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => log::warn!("could not remove audio artifact {}: {e}", path.display()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
