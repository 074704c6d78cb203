//! Core diarization engine trait and error taxonomy.
//!
//! [`DiarizationEngine`] is the adapter seam the pipeline runs speaker
//! diarization through.  The production implementation
//! ([`SidecarDiarizer`](crate::diarize::SidecarDiarizer)) talks to a
//! colocated inference sidecar over HTTP; tests inject
//! [`MockDiarizationEngine`] instead.

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

use crate::diarize::types::DiarizationOutput;

// ---------------------------------------------------------------------------
// DiarizeError
// ---------------------------------------------------------------------------

/// Errors that can occur during a diarization pass.
#[derive(Debug, Error)]
pub enum DiarizeError {
    /// HTTP transport or connection error.
    #[error("diarization request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("diarization request timed out")]
    Timeout,

    /// The response could not be parsed as expected JSON.
    #[error("failed to parse diarization response: {0}")]
    Parse(String),

    /// The sidecar rejected the input (unsupported or corrupt audio).
    #[error("diarization rejected input: {0}")]
    Rejected(String),
}

impl DiarizeError {
    /// Whether a retry could plausibly succeed.
    ///
    /// Transport failures and timeouts are transient; a rejected input or
    /// a malformed response is deterministic.
    pub fn is_transient(&self) -> bool {
        matches!(self, DiarizeError::Request(_) | DiarizeError::Timeout)
    }
}

impl From<reqwest::Error> for DiarizeError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            DiarizeError::Timeout
        } else {
            DiarizeError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// DiarizationEngine trait
// ---------------------------------------------------------------------------

/// Async trait for speaker diarization engines.
///
/// Implementors must be `Send + Sync` so they can be shared across workers
/// behind an `Arc<dyn DiarizationEngine>`.
///
/// # Contract
///
/// - `audio` is a path to the same artifact handed to the transcription
///   adapter.
/// - Spans in the output are ordered by start time.
#[async_trait]
pub trait DiarizationEngine: Send + Sync {
    /// Diarize the audio artifact at `audio`.
    async fn diarize(&self, audio: &Path) -> Result<DiarizationOutput, DiarizeError>;
}

// ---------------------------------------------------------------------------
// MockDiarizationEngine  (test-only)
// ---------------------------------------------------------------------------

/// A test double that returns a pre-configured response without any sidecar.
#[cfg(test)]
pub struct MockDiarizationEngine {
    spans: Option<Vec<crate::diarize::SpeakerSpan>>,
    error: Option<fn() -> DiarizeError>,
}

#[cfg(test)]
impl MockDiarizationEngine {
    /// Create a mock that always returns `Ok` with the given spans.
    pub fn ok(spans: Vec<crate::diarize::SpeakerSpan>) -> Self {
        Self {
            spans: Some(spans),
            error: None,
        }
    }

    /// Create a mock that always returns the error built by `make`.
    pub fn err(make: fn() -> DiarizeError) -> Self {
        Self {
            spans: None,
            error: Some(make),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl DiarizationEngine for MockDiarizationEngine {
    async fn diarize(&self, _audio: &Path) -> Result<DiarizationOutput, DiarizeError> {
        if let Some(make) = self.error {
            return Err(make());
        }
        Ok(DiarizationOutput::from_spans(
            self.spans.clone().unwrap_or_default(),
        ))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diarize::SpeakerSpan;

    // --- DiarizeError classification ---

    #[test]
    fn timeout_and_transport_are_transient() {
        assert!(DiarizeError::Timeout.is_transient());
        assert!(DiarizeError::Request("connection refused".into()).is_transient());
    }

    #[test]
    fn rejection_and_parse_are_deterministic() {
        assert!(!DiarizeError::Rejected("bad audio".into()).is_transient());
        assert!(!DiarizeError::Parse("unexpected json".into()).is_transient());
    }

    // --- MockDiarizationEngine ---

    #[tokio::test]
    async fn mock_ok_returns_spans_and_speaker_count() {
        let mock = MockDiarizationEngine::ok(vec![
            SpeakerSpan {
                start: 0.0,
                end: 2.0,
                speaker: "S1".into(),
            },
            SpeakerSpan {
                start: 2.0,
                end: 4.0,
                speaker: "S2".into(),
            },
        ]);
        let out = mock.diarize(Path::new("a.wav")).await.unwrap();
        assert_eq!(out.spans.len(), 2);
        assert_eq!(out.num_speakers, 2);
    }

    #[tokio::test]
    async fn mock_err_returns_configured_error() {
        let mock = MockDiarizationEngine::err(|| DiarizeError::Timeout);
        let err = mock.diarize(Path::new("a.wav")).await.unwrap_err();
        assert!(matches!(err, DiarizeError::Timeout));
    }
}
