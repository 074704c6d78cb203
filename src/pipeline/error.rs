//! Pipeline error taxonomy.
//!
//! Adapter errors are classified here and never reach the job record: a
//! failed job exposes only its `failed` status, not adapter internals.
//! The variant decides the retry policy — only [`PipelineError::Transient`]
//! is worth another attempt.

use thiserror::Error;

use crate::asr::AsrError;
use crate::diarize::DiarizeError;
use crate::store::StoreError;

// ---------------------------------------------------------------------------
// PipelineError
// ---------------------------------------------------------------------------

/// Errors that can surface inside one pipeline execution.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Deterministic input rejection (unsupported or corrupt audio).
    /// Fails fast; a retry would reproduce the same result.
    #[error("rejected input: {0}")]
    Input(String),

    /// Timeout or resource exhaustion in an adapter.  Retried with bounded
    /// backoff; the job stays `processing` until retries are exhausted.
    #[error("transient inference failure: {0}")]
    Transient(String),

    /// Failure while atomically committing segments + status.  Any partial
    /// writes were rolled back by the store.
    #[error("commit failed: {0}")]
    Commit(String),

    /// Unexpected internal failure (task join, model misconfiguration,
    /// malformed sidecar response).  Treated as deterministic.
    #[error("internal pipeline error: {0}")]
    Internal(String),
}

impl PipelineError {
    /// Whether the retry policy should attempt this execution again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PipelineError::Transient(_))
    }
}

// ---------------------------------------------------------------------------
// Classification from adapter / store errors
// ---------------------------------------------------------------------------

impl From<AsrError> for PipelineError {
    fn from(e: AsrError) -> Self {
        match e {
            AsrError::UnsupportedFormat(_) | AsrError::CorruptAudio(_) => {
                PipelineError::Input(e.to_string())
            }
            AsrError::ResourceExhausted(_) => PipelineError::Transient(e.to_string()),
            AsrError::ModelNotFound(_) | AsrError::Inference(_) => {
                PipelineError::Internal(e.to_string())
            }
        }
    }
}

impl From<DiarizeError> for PipelineError {
    fn from(e: DiarizeError) -> Self {
        match e {
            DiarizeError::Request(_) | DiarizeError::Timeout => {
                PipelineError::Transient(e.to_string())
            }
            DiarizeError::Rejected(_) => PipelineError::Input(e.to_string()),
            DiarizeError::Parse(_) => PipelineError::Internal(e.to_string()),
        }
    }
}

impl From<StoreError> for PipelineError {
    fn from(e: StoreError) -> Self {
        PipelineError::Commit(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_is_retryable() {
        assert!(PipelineError::Transient("timeout".into()).is_retryable());
        assert!(!PipelineError::Input("bad".into()).is_retryable());
        assert!(!PipelineError::Commit("locked".into()).is_retryable());
        assert!(!PipelineError::Internal("join".into()).is_retryable());
    }

    #[test]
    fn asr_errors_classify_by_cause() {
        assert!(matches!(
            PipelineError::from(AsrError::UnsupportedFormat("ogg".into())),
            PipelineError::Input(_)
        ));
        assert!(matches!(
            PipelineError::from(AsrError::CorruptAudio("truncated".into())),
            PipelineError::Input(_)
        ));
        assert!(matches!(
            PipelineError::from(AsrError::ResourceExhausted("oom".into())),
            PipelineError::Transient(_)
        ));
        assert!(matches!(
            PipelineError::from(AsrError::ModelNotFound("/m.bin".into())),
            PipelineError::Internal(_)
        ));
    }

    #[test]
    fn diarize_errors_classify_by_cause() {
        assert!(matches!(
            PipelineError::from(DiarizeError::Timeout),
            PipelineError::Transient(_)
        ));
        assert!(matches!(
            PipelineError::from(DiarizeError::Request("refused".into())),
            PipelineError::Transient(_)
        ));
        assert!(matches!(
            PipelineError::from(DiarizeError::Rejected("bad wav".into())),
            PipelineError::Input(_)
        ));
        assert!(matches!(
            PipelineError::from(DiarizeError::Parse("json".into())),
            PipelineError::Internal(_)
        ));
    }
}
