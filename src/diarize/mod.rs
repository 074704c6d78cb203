//! Diarization adapter: the speaker-labelling seam of the pipeline.
//!
//! [`DiarizationEngine`] is the async trait the pipeline runner calls;
//! [`SidecarDiarizer`] is the production implementation (HTTP client for a
//! colocated pyannote sidecar); [`SpeakerSpan`] / [`DiarizationOutput`] are
//! the wire types handed to the alignment step.

pub mod engine;
pub mod sidecar;
pub mod types;

pub use engine::{DiarizationEngine, DiarizeError};
pub use sidecar::SidecarDiarizer;
pub use types::{DiarizationOutput, SpeakerSpan};

#[cfg(test)]
pub use engine::MockDiarizationEngine;
