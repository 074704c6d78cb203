//! Core transcription engine trait and error taxonomy.
//!
//! # Overview
//!
//! [`TranscriptionEngine`] is the adapter seam the pipeline runs speech
//! recognition through.  It is object-safe and `Send + Sync` so it can be
//! held behind an `Arc<dyn TranscriptionEngine>` and injected into the
//! pipeline runner at construction time.
//!
//! [`WhisperEngine`](crate::asr::WhisperEngine) is the production
//! implementation.  [`MockTranscriptionEngine`] (available under
//! `#[cfg(test)]`) returns a pre-configured response — useful for
//! unit-testing the pipeline without a GGML model file.

use std::path::Path;

use thiserror::Error;

use crate::asr::types::TranscriptionOutput;

// ---------------------------------------------------------------------------
// AsrError
// ---------------------------------------------------------------------------

/// All errors that can arise from the transcription subsystem.
///
/// The pipeline classifies these into deterministic failures (fail fast,
/// no retry) and transient failures (bounded retry): see
/// [`AsrError::is_transient`].
#[derive(Debug, Clone, Error)]
pub enum AsrError {
    /// The GGML model file was not found at the given path.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// The audio file has an extension outside the supported set.
    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),

    /// The audio file exists but could not be decoded.
    #[error("corrupt or unreadable audio: {0}")]
    CorruptAudio(String),

    /// The engine ran out of memory or another bounded resource.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    /// An error occurred during the inference pass.
    #[error("transcription error: {0}")]
    Inference(String),
}

impl AsrError {
    /// Whether a retry could plausibly succeed.
    ///
    /// Unsupported or corrupt input is deterministic; resource exhaustion
    /// is not.
    pub fn is_transient(&self) -> bool {
        matches!(self, AsrError::ResourceExhausted(_))
    }
}

// ---------------------------------------------------------------------------
// Supported formats
// ---------------------------------------------------------------------------

/// Audio file extensions the service accepts for submission.
pub const SUPPORTED_EXTENSIONS: [&str; 6] = ["mp3", "wav", "mp4", "mov", "m4a", "flac"];

/// Returns `true` when `path` carries one of the supported audio extensions
/// (case-insensitive).
pub fn is_supported_format(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .is_some_and(|e| SUPPORTED_EXTENSIONS.contains(&e.as_str()))
}

// ---------------------------------------------------------------------------
// TranscriptionEngine trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe interface for transcription engines.
///
/// Implementations must be `Send + Sync` so that they can be held behind an
/// `Arc<dyn TranscriptionEngine>` and called from any worker.
///
/// # Contract
///
/// - `audio` is a path to a finished audio artifact owned by the job.
/// - `language` is an optional ISO-639-1 hint; `None` means auto-detect.
/// - Spans in the output are in chronological order.
/// - Calls may block for the length of the inference pass; the pipeline
///   wraps them in `tokio::task::spawn_blocking` with a bounded timeout.
pub trait TranscriptionEngine: Send + Sync {
    /// Transcribe the audio artifact at `audio`.
    fn transcribe(
        &self,
        audio: &Path,
        language: Option<&str>,
    ) -> Result<TranscriptionOutput, AsrError>;
}

// Compile-time assertion: Box<dyn TranscriptionEngine> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn TranscriptionEngine>) {}
};

// ---------------------------------------------------------------------------
// MockTranscriptionEngine  (test-only)
// ---------------------------------------------------------------------------

/// A test double that returns a pre-configured response without loading any
/// model file.
#[cfg(test)]
pub struct MockTranscriptionEngine {
    response: Result<TranscriptionOutput, AsrError>,
}

#[cfg(test)]
impl MockTranscriptionEngine {
    /// Create a mock that always returns `Ok` with the given spans and
    /// duration.
    pub fn ok(spans: Vec<crate::asr::TranscriptSpan>, duration: f64) -> Self {
        Self {
            response: Ok(TranscriptionOutput {
                spans,
                duration,
                language: Some("en".into()),
            }),
        }
    }

    /// Create a mock that always returns `Err(error)`.
    pub fn err(error: AsrError) -> Self {
        Self {
            response: Err(error),
        }
    }
}

#[cfg(test)]
impl TranscriptionEngine for MockTranscriptionEngine {
    fn transcribe(
        &self,
        _audio: &Path,
        _language: Option<&str>,
    ) -> Result<TranscriptionOutput, AsrError> {
        self.response.clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
