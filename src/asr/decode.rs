//! WAV decoding and sample-rate conversion for the Whisper engine.
//!
//! Whisper requires **16 kHz mono `f32`** input.  [`load_wav_16k_mono`]
//! decodes a WAV artifact with `hound` and performs the two conversion
//! steps: downmix interleaved channels to mono, then resample to 16 kHz
//! with linear interpolation.

use std::path::Path;

use crate::asr::engine::AsrError;

/// Target sample rate required by Whisper.
const TARGET_RATE: u32 = 16_000;

// ---------------------------------------------------------------------------
// load_wav_16k_mono
// ---------------------------------------------------------------------------

/// Decode the WAV file at `path` into 16 kHz mono f32 samples.
///
/// # Errors
///
/// - [`AsrError::CorruptAudio`] — the file cannot be opened or decoded.
pub fn load_wav_16k_mono(path: &Path) -> Result<Vec<f32>, AsrError> {
    let mut reader = hound::WavReader::open(path)
        .map_err(|e| AsrError::CorruptAudio(format!("{}: {e}", path.display())))?;

    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| AsrError::CorruptAudio(e.to_string()))?,
        hound::SampleFormat::Int => {
            let scale = (1_i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()
                .map_err(|e| AsrError::CorruptAudio(e.to_string()))?
        }
    };

    let mono = downmix_to_mono(&samples, spec.channels);
    Ok(resample_to_16k(&mono, spec.sample_rate))
}

// ---------------------------------------------------------------------------
// downmix_to_mono
// ---------------------------------------------------------------------------

/// Mix interleaved multi-channel audio down to mono by averaging all channels.
///
/// The output length is `samples.len() / channels`.  Mono input is returned
/// unchanged; zero channels yields an empty vector.
pub fn downmix_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    match channels {
        0 => Vec::new(),
        1 => samples.to_vec(),
        n => {
            let n = n as usize;
            samples
                .chunks_exact(n)
                .map(|frame| frame.iter().sum::<f32>() / n as f32)
                .collect()
        }
    }
}

// ---------------------------------------------------------------------------
// resample_to_16k
// ---------------------------------------------------------------------------

/// Resample `samples` from `source_rate` Hz to 16 000 Hz using linear
/// interpolation.
///
/// A `source_rate` of 16 000 is a no-op fast path.  The output length is
/// approximately `samples.len() * 16_000 / source_rate`.
pub fn resample_to_16k(samples: &[f32], source_rate: u32) -> Vec<f32> {
    if source_rate == TARGET_RATE {
        return samples.to_vec();
    }

    if samples.is_empty() {
        return Vec::new();
    }

    let ratio = TARGET_RATE as f64 / source_rate as f64;
    let output_len = (samples.len() as f64 * ratio).ceil() as usize;
    let mut output = Vec::with_capacity(output_len);

    for i in 0..output_len {
        let src_pos = i as f64 / ratio;
        let idx = src_pos as usize;
        let frac = src_pos - idx as f64;

        let sample = if idx + 1 < samples.len() {
            samples[idx] * (1.0 - frac as f32) + samples[idx + 1] * frac as f32
        } else if idx < samples.len() {
            samples[idx]
        } else {
            0.0
        };

        output.push(sample);
    }

    output
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
