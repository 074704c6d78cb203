//! Transcription adapter: the speech-to-text seam of the pipeline.
//!
//! [`TranscriptionEngine`] is the object-safe trait the pipeline runner
//! calls; [`WhisperEngine`] is the production implementation backed by
//! `whisper_rs`; [`TranscriptSpan`] / [`TranscriptionOutput`] are the wire
//! types handed to the alignment step.

pub mod decode;
pub mod engine;
pub mod types;
pub mod whisper;

pub use engine::{is_supported_format, AsrError, TranscriptionEngine, SUPPORTED_EXTENSIONS};
pub use types::{TranscriptSpan, TranscriptionOutput};
pub use whisper::WhisperEngine;

#[cfg(test)]
pub use engine::MockTranscriptionEngine;
