//! Transcription adapter output types.
//!
//! [`TranscriptSpan`] is the raw timestamped text unit produced by the
//! speech-recognition adapter, before any speaker has been attached.
//! [`TranscriptionOutput`] is the full result of one inference pass.

// ---------------------------------------------------------------------------
// TranscriptSpan
// ---------------------------------------------------------------------------

/// A single time-aligned text chunk produced by the transcription adapter.
///
/// Spans are emitted in chronological order; the alignment step preserves
/// that order verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptSpan {
    /// Span start time in seconds from the start of the audio.
    pub start: f64,
    /// Span end time in seconds from the start of the audio.
    pub end: f64,
    /// Span text (may include punctuation inserted by the model).
    pub text: String,
    /// Per-span confidence in `[0, 1]`, when the adapter supplies one.
    ///
    /// Whisper does not report per-segment confidence, so the production
    /// engine leaves this `None` and the alignment step substitutes its
    /// default.
    pub confidence: Option<f64>,
}

// ---------------------------------------------------------------------------
// TranscriptionOutput
// ---------------------------------------------------------------------------

/// The output of a successful transcription pass.
#[derive(Debug, Clone)]
pub struct TranscriptionOutput {
    /// Individual time-aligned spans, in chronological order.
    pub spans: Vec<TranscriptSpan>,
    /// Total audio duration in seconds.
    pub duration: f64,
    /// Language the adapter detected (or was told to use), when known.
    pub language: Option<String>,
}

impl TranscriptionOutput {
    /// Full transcript text: span texts joined with single spaces, trimmed.
    pub fn text(&self) -> String {
        self.spans
            .iter()
            .map(|s| s.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(start: f64, end: f64, text: &str) -> TranscriptSpan {
        TranscriptSpan {
            start,
            end,
            text: text.into(),
            confidence: None,
        }
    }

    #[test]
    fn text_joins_spans_with_spaces() {
        let out = TranscriptionOutput {
            spans: vec![span(0.0, 1.0, " hello"), span(1.0, 2.0, "world ")],
            duration: 2.0,
            language: None,
        };
        assert_eq!(out.text(), "hello world");
    }

    #[test]
    fn text_skips_empty_spans() {
        let out = TranscriptionOutput {
            spans: vec![span(0.0, 1.0, "hello"), span(1.0, 2.0, "  ")],
            duration: 2.0,
            language: None,
        };
        assert_eq!(out.text(), "hello");
    }

    #[test]
    fn text_of_empty_output_is_empty() {
        let out = TranscriptionOutput {
            spans: vec![],
            duration: 0.0,
            language: None,
        };
        assert_eq!(out.text(), "");
    }
}
