//! Alignment engine — fuses transcription spans with diarization spans.
//!
//! [`align`] walks the transcription spans in their given order and attaches
//! to each the speaker whose diarization turn overlaps it the most.  It is a
//! pure function: no I/O, no shared state, and it never merges, splits or
//! reorders transcription spans — alignment only attaches a label.
//!
//! # Selection rule
//!
//! For a transcription span `T` and a diarization span `D`,
//! `overlap(T, D) = max(0, min(T.end, D.end) - max(T.start, D.start))`.
//! The span with the strictly greatest positive overlap wins; on a tie the
//! earlier diarization span (first in the start-ordered input) keeps the
//! label.  When nothing overlaps, [`FALLBACK_SPEAKER`] is used.

use crate::asr::TranscriptSpan;
use crate::diarize::SpeakerSpan;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Label assigned when no diarization span overlaps a transcription span.
pub const FALLBACK_SPEAKER: &str = "SPEAKER_00";

/// Confidence recorded when the transcription adapter supplies none.
pub const DEFAULT_CONFIDENCE: f64 = 0.95;

// ---------------------------------------------------------------------------
// AlignedSegment
// ---------------------------------------------------------------------------

/// One speaker-attributed span of text — the alignment engine's output unit.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedSegment {
    /// Start time in seconds, copied verbatim from the transcription span.
    pub start: f64,
    /// End time in seconds, copied verbatim from the transcription span.
    pub end: f64,
    /// Text, copied verbatim from the transcription span.
    pub text: String,
    /// Speaker label from the diarization output, or [`FALLBACK_SPEAKER`].
    pub speaker: String,
    /// Per-span confidence, or [`DEFAULT_CONFIDENCE`] when the adapter
    /// supplied none.
    pub confidence: f64,
}

// ---------------------------------------------------------------------------
// align
// ---------------------------------------------------------------------------

/// Attach a speaker label to every transcription span.
///
/// Output order equals input transcription order regardless of diarization
/// order.  Empty transcription input yields an empty output; empty
/// diarization input yields all-fallback labels.
pub fn align(spans: &[TranscriptSpan], speakers: &[SpeakerSpan]) -> Vec<AlignedSegment> {
    spans
        .iter()
        .map(|t| AlignedSegment {
            start: t.start,
            end: t.end,
            text: t.text.clone(),
            speaker: dominant_speaker(t.start, t.end, speakers)
                .unwrap_or(FALLBACK_SPEAKER)
                .to_string(),
            confidence: t.confidence.unwrap_or(DEFAULT_CONFIDENCE),
        })
        .collect()
}

/// Find the speaker whose turn overlaps `[start, end)` the most.
///
/// Returns `None` when no turn has positive overlap.  Iterating in the
/// given (start-ordered) order and replacing only on a strictly greater
/// overlap makes the earliest-start span win every tie.
fn dominant_speaker<'a>(start: f64, end: f64, speakers: &'a [SpeakerSpan]) -> Option<&'a str> {
    let mut best: Option<&'a str> = None;
    let mut best_overlap = 0.0_f64;

    for d in speakers {
        let overlap = (end.min(d.end) - start.max(d.start)).max(0.0);
        if overlap > best_overlap {
            best_overlap = overlap;
            best = Some(&d.speaker);
        }
    }

    best
}

// ---------------------------------------------------------------------------
// distinct_speaker_count
// ---------------------------------------------------------------------------

/// Number of distinct speaker labels actually used in `segments`.
///
/// An all-fallback alignment therefore reports `1`, and an empty alignment
/// reports `0` — this is the value persisted as the job's `speaker_count`.
pub fn distinct_speaker_count(segments: &[AlignedSegment]) -> usize {
    let mut labels: Vec<&str> = segments.iter().map(|s| s.speaker.as_str()).collect();
    labels.sort_unstable();
    labels.dedup();
    labels.len()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
