//! Diarization adapter output types.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SpeakerSpan
// ---------------------------------------------------------------------------

/// A single speaker turn produced by the diarization adapter.
///
/// Spans arrive ordered by start time; the speaker label set is whatever
/// the model emits (e.g. `"SPEAKER_00"`, `"SPEAKER_01"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakerSpan {
    /// Turn start time in seconds from the start of the audio.
    pub start: f64,
    /// Turn end time in seconds from the start of the audio.
    pub end: f64,
    /// Speaker label assigned by the model.
    pub speaker: String,
}

// ---------------------------------------------------------------------------
// DiarizationOutput
// ---------------------------------------------------------------------------

/// The output of a successful diarization pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiarizationOutput {
    /// Speaker turns, ordered by start time.
    #[serde(rename = "segments")]
    pub spans: Vec<SpeakerSpan>,
    /// Number of distinct speakers the model found.
    pub num_speakers: usize,
}

impl DiarizationOutput {
    /// Build an output from spans, deriving `num_speakers` from the
    /// distinct labels present.
    pub fn from_spans(spans: Vec<SpeakerSpan>) -> Self {
        let num_speakers = {
            let mut labels: Vec<&str> = spans.iter().map(|s| s.speaker.as_str()).collect();
            labels.sort_unstable();
            labels.dedup();
            labels.len()
        };
        Self { spans, num_speakers }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(start: f64, end: f64, speaker: &str) -> SpeakerSpan {
        SpeakerSpan {
            start,
            end,
            speaker: speaker.into(),
        }
    }

    #[test]
    fn from_spans_counts_distinct_speakers() {
        let out = DiarizationOutput::from_spans(vec![
            span(0.0, 2.0, "SPEAKER_00"),
            span(2.0, 4.0, "SPEAKER_01"),
            span(4.0, 6.0, "SPEAKER_00"),
        ]);
        assert_eq!(out.num_speakers, 2);
        assert_eq!(out.spans.len(), 3);
    }

    #[test]
    fn from_empty_spans_counts_zero() {
        let out = DiarizationOutput::from_spans(vec![]);
        assert_eq!(out.num_speakers, 0);
    }

    #[test]
    fn wire_format_uses_segments_key() {
        let out = DiarizationOutput::from_spans(vec![span(0.0, 1.5, "SPEAKER_00")]);
        let json = serde_json::to_value(&out).unwrap();
        assert!(json.get("segments").is_some());
        assert_eq!(json["segments"][0]["speaker"], "SPEAKER_00");
    }
}
