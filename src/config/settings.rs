//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// StorageConfig
// ---------------------------------------------------------------------------

/// Settings for the job database and uploaded-audio storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite job database.  `None` means the platform data dir
    /// (`AppPaths::db_file`).
    pub db_path: Option<std::path::PathBuf>,
    /// Directory where the submission path stores uploaded audio artifacts.
    pub upload_dir: std::path::PathBuf,
    /// Maximum accepted upload size in bytes.
    pub max_upload_bytes: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            upload_dir: std::path::PathBuf::from("/tmp/transcriber"),
            // 500 MB
            max_upload_bytes: 524_288_000,
        }
    }
}

// ---------------------------------------------------------------------------
// AsrConfig
// ---------------------------------------------------------------------------

/// Settings for the Whisper transcription engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsrConfig {
    /// GGML model name / file stem (e.g. `"base"`, `"small"`, `"medium"`,
    /// `"large"`).
    pub model: String,
    /// Default language hint as an ISO-639-1 code.  `None` lets Whisper
    /// auto-detect; a per-job hint overrides this.
    pub language: Option<String>,
    /// Number of CPU threads handed to Whisper.
    pub n_threads: i32,
}

impl Default for AsrConfig {
    fn default() -> Self {
        Self {
            model: "base".into(),
            language: None,
            n_threads: optimal_threads(),
        }
    }
}

/// Returns the number of physical CPU threads to use for inference,
/// capped at 8 to avoid diminishing returns on Whisper.
pub(crate) fn optimal_threads() -> i32 {
    std::thread::available_parallelism()
        .map(|n| n.get().min(8) as i32)
        .unwrap_or(4)
}

// ---------------------------------------------------------------------------
// DiarizationConfig
// ---------------------------------------------------------------------------

/// Settings for the diarization sidecar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiarizationConfig {
    /// Base URL of the sidecar endpoint (e.g. a local pyannote server).
    pub base_url: String,
    /// API key — `None` for local sidecars that require no authentication.
    pub api_key: Option<String>,
    /// Maximum seconds to wait for a diarization response before timing out.
    pub timeout_secs: u64,
}

impl Default for DiarizationConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8001".into(),
            api_key: None,
            timeout_secs: 600,
        }
    }
}

// ---------------------------------------------------------------------------
// WorkerConfig
// ---------------------------------------------------------------------------

/// Settings for the worker pool, retry policy and reconciliation sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Number of concurrent pipeline workers pulling from the task queue.
    pub workers: usize,
    /// Maximum pipeline attempts per job (first run + retries) before a
    /// transient failure becomes terminal.
    pub max_attempts: u32,
    /// Base backoff in milliseconds; attempt `n` waits `base * 2^n`.
    pub retry_backoff_ms: u64,
    /// Upper bound in seconds for a single adapter call (transcription or
    /// diarization).  An elapsed timeout counts as a transient failure.
    pub adapter_timeout_secs: u64,
    /// A non-terminal job older than this many seconds is considered
    /// orphaned and force-failed by the reconciliation sweep.
    pub orphan_timeout_secs: u64,
    /// Seconds between reconciliation sweeps.
    pub reconcile_interval_secs: u64,
    /// Task queue depth; `dispatch` awaits when the queue is full.
    pub queue_depth: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            workers: 2,
            max_attempts: 3,
            retry_backoff_ms: 500,
            adapter_timeout_secs: 600,
            orphan_timeout_secs: 3_600,
            reconcile_interval_secs: 300,
            queue_depth: 64,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use echo_transcriber::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Job database and audio artifact storage.
    pub storage: StorageConfig,
    /// Whisper transcription engine settings.
    pub asr: AsrConfig,
    /// Diarization sidecar settings.
    pub diarization: DiarizationConfig,
    /// Worker pool / retry / reconciliation settings.
    pub worker: WorkerConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// (first-run scenario) so callers never need to special-case a missing
    /// file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Resolved database path: the configured override, or the platform
    /// default under the data dir.
    pub fn db_path(&self) -> std::path::PathBuf {
        self.storage
            .db_path
            .clone()
            .unwrap_or_else(|| AppPaths::new().db_file)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
