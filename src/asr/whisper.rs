//! Production transcription engine backed by `whisper_rs`.
//!
//! A new `WhisperState` is created for every [`transcribe`] call so the
//! engine can be shared across workers without any locking.
//!
//! [`transcribe`]: crate::asr::TranscriptionEngine::transcribe

use std::path::Path;

use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::asr::decode::load_wav_16k_mono;
use crate::asr::engine::{is_supported_format, AsrError, TranscriptionEngine};
use crate::asr::types::{TranscriptSpan, TranscriptionOutput};

/// Whisper input sample rate; spans and durations are derived from it.
const SAMPLE_RATE: f64 = 16_000.0;

// ---------------------------------------------------------------------------
// WhisperEngine
// ---------------------------------------------------------------------------

/// Production transcription engine that wraps a `whisper_rs::WhisperContext`.
///
/// Construct with [`WhisperEngine::load`]; inject into the pipeline runner
/// as an `Arc<dyn TranscriptionEngine>`.
pub struct WhisperEngine {
    ctx: WhisperContext,
    n_threads: i32,
}

impl std::fmt::Debug for WhisperEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperEngine")
            .field("n_threads", &self.n_threads)
            .finish_non_exhaustive()
    }
}

// `WhisperContext` holds a raw pointer internally but declares
// `unsafe impl Send` and `unsafe impl Sync` in whisper-rs — the model
// weights are read-only after loading.
// SAFETY: WhisperContext is Send+Sync as declared by whisper-rs.
unsafe impl Send for WhisperEngine {}
unsafe impl Sync for WhisperEngine {}

impl WhisperEngine {
    /// Load a GGML model from `model_path` and prepare it for inference.
    ///
    /// # Errors
    ///
    /// - [`AsrError::ModelNotFound`] — `model_path` does not exist.
    /// - [`AsrError::Inference`]     — whisper-rs failed to load the file.
    pub fn load(model_path: impl AsRef<Path>, n_threads: i32) -> Result<Self, AsrError> {
        let path = model_path.as_ref();

        if !path.exists() {
            return Err(AsrError::ModelNotFound(path.display().to_string()));
        }

        let path_str = path.to_str().ok_or_else(|| {
            AsrError::ModelNotFound(format!(
                "model path contains non-UTF-8 characters: {}",
                path.display()
            ))
        })?;

        let ctx_params = WhisperContextParameters::default();
        let ctx = WhisperContext::new_with_params(path_str, ctx_params)
            .map_err(|e| AsrError::Inference(e.to_string()))?;

        Ok(Self { ctx, n_threads })
    }
}

impl TranscriptionEngine for WhisperEngine {
    fn transcribe(
        &self,
        audio: &Path,
        language: Option<&str>,
    ) -> Result<TranscriptionOutput, AsrError> {
        // ── Input guards ──────────────────────────────────────────────────
        if !is_supported_format(audio) {
            return Err(AsrError::UnsupportedFormat(audio.display().to_string()));
        }

        let samples = load_wav_16k_mono(audio)?;
        if samples.is_empty() {
            return Err(AsrError::CorruptAudio(format!(
                "no samples decoded from {}",
                audio.display()
            )));
        }
        let duration = samples.len() as f64 / SAMPLE_RATE;

        // ── Build FullParams ──────────────────────────────────────────────
        let mut fp = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });

        // set_language takes an Option<&str> whose lifetime is tied to fp.
        // The borrow of `language` remains alive until state.full() returns.
        fp.set_language(language);
        fp.set_n_threads(self.n_threads);
        fp.set_print_progress(false);
        fp.set_print_realtime(false);

        // ── Create per-call state and run inference ───────────────────────
        let mut state = self
            .ctx
            .create_state()
            .map_err(|e| AsrError::Inference(e.to_string()))?;

        state
            .full(fp, &samples)
            .map_err(|e| AsrError::Inference(e.to_string()))?;

        // ── Collect spans ─────────────────────────────────────────────────
        let n_segments = state
            .full_n_segments()
            .map_err(|e| AsrError::Inference(e.to_string()))?;

        let mut spans: Vec<TranscriptSpan> = Vec::with_capacity(n_segments as usize);

        for i in 0..n_segments {
            let text = state
                .full_get_segment_text(i)
                .map_err(|e| AsrError::Inference(format!("segment {i}: {e}")))?;

            // Timestamps are in centiseconds.
            let t0 = state.full_get_segment_t0(i).unwrap_or(0).max(0) as f64 / 100.0;
            let t1 = state.full_get_segment_t1(i).unwrap_or(0).max(0) as f64 / 100.0;

            spans.push(TranscriptSpan {
                start: t0,
                end: t1,
                text: text.trim().to_string(),
                // Whisper reports no per-segment confidence.
                confidence: None,
            });
        }

        Ok(TranscriptionOutput {
            spans,
            duration,
            language: language.map(String::from),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
