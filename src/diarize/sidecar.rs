//! HTTP client for a colocated diarization sidecar.
//!
//! The speaker-diarization model (pyannote) runs out of process; this
//! client POSTs the artifact path to the sidecar's `/v1/diarize` endpoint
//! and parses the span list from its JSON response.  All connection details
//! come from [`DiarizationConfig`]; nothing is hardcoded.

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::DiarizationConfig;
use crate::diarize::engine::{DiarizationEngine, DiarizeError};
use crate::diarize::types::{DiarizationOutput, SpeakerSpan};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Sidecar response body for `/v1/diarize`.
#[derive(Debug, Deserialize)]
struct DiarizeResponse {
    segments: Vec<SpeakerSpan>,
    #[serde(default)]
    num_speakers: Option<usize>,
}

// ---------------------------------------------------------------------------
// SidecarDiarizer
// ---------------------------------------------------------------------------

/// Production diarization engine that calls an HTTP sidecar.
///
/// # No hardcoded URLs
/// All connection details (`base_url`, `api_key`, `timeout_secs`) come
/// exclusively from the [`DiarizationConfig`] passed to
/// [`SidecarDiarizer::from_config`].
pub struct SidecarDiarizer {
    client: reqwest::Client,
    config: DiarizationConfig,
}

impl SidecarDiarizer {
    /// Build a `SidecarDiarizer` from application config.
    ///
    /// The HTTP client is pre-configured with the per-request timeout from
    /// `config.timeout_secs`.  A default (no-timeout) client is used as a
    /// last-resort fallback if the builder fails (should never happen in
    /// practice).
    pub fn from_config(config: &DiarizationConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }
}

#[async_trait]
impl DiarizationEngine for SidecarDiarizer {
    /// POST the artifact path to the sidecar and parse the span list.
    ///
    /// The `Authorization: Bearer …` header is attached **only** when
    /// `config.api_key` is `Some(key)` and `key` is non-empty — safe for
    /// local sidecars that require no authentication.
    async fn diarize(&self, audio: &Path) -> Result<DiarizationOutput, DiarizeError> {
        let url = format!("{}/v1/diarize", self.config.base_url);

        let body = serde_json::json!({
            "audio_path": audio.display().to_string(),
        });

        let mut req = self.client.post(&url).json(&body);

        // Attach Authorization header only when api_key is a non-empty string.
        let key = self.config.api_key.as_deref().unwrap_or("");
        if !key.is_empty() {
            req = req.bearer_auth(key);
        }

        let response = req.send().await?;

        // 4xx means the sidecar looked at the input and said no; that is
        // deterministic, not worth a retry.
        let status = response.status();
        if status.is_client_error() {
            let detail = response.text().await.unwrap_or_default();
            return Err(DiarizeError::Rejected(format!("{status}: {detail}")));
        }
        if !status.is_success() {
            return Err(DiarizeError::Request(format!("sidecar returned {status}")));
        }

        let parsed: DiarizeResponse = response
            .json()
            .await
            .map_err(|e| DiarizeError::Parse(e.to_string()))?;

        let output = match parsed.num_speakers {
            Some(n) => DiarizationOutput {
                spans: parsed.segments,
                num_speakers: n,
            },
            None => DiarizationOutput::from_spans(parsed.segments),
        };

        Ok(output)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DiarizationConfig;

    fn make_config(api_key: Option<&str>) -> DiarizationConfig {
        DiarizationConfig {
            base_url: "http://localhost:8001".into(),
            api_key: api_key.map(|s| s.to_string()),
            timeout_secs: 10,
        }
    }

    #[test]
    fn from_config_builds_without_panic() {
        let config = make_config(None);
        let _diarizer = SidecarDiarizer::from_config(&config);
    }

    #[test]
    fn from_config_accepts_empty_api_key() {
        let config = make_config(Some(""));
        let _diarizer = SidecarDiarizer::from_config(&config);
    }

    /// Verify that `SidecarDiarizer` is object-safe (usable as
    /// `dyn DiarizationEngine`).
    #[test]
    fn diarizer_is_object_safe() {
        let config = make_config(None);
        let diarizer: Box<dyn DiarizationEngine> = Box::new(SidecarDiarizer::from_config(&config));
        drop(diarizer);
    }

    #[test]
    fn response_without_num_speakers_derives_it() {
        let json = r#"{"segments":[
            {"start":0.0,"end":2.0,"speaker":"SPEAKER_00"},
            {"start":2.0,"end":4.0,"speaker":"SPEAKER_01"}
        ]}"#;
        let parsed: DiarizeResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.num_speakers.is_none());
        let output = DiarizationOutput::from_spans(parsed.segments);
        assert_eq!(output.num_speakers, 2);
    }

    #[test]
    fn response_with_num_speakers_is_parsed() {
        let json = r#"{"segments":[],"num_speakers":3}"#;
        let parsed: DiarizeResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.num_speakers, Some(3));
    }
}
