//! Worker daemon entry point — Echo transcriber.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Open the job store and ensure the schema exists.
//! 4. Build the inference adapters from config (degrade gracefully when
//!    the Whisper model file is absent).
//! 5. Create the task queue and spawn the worker pool.
//! 6. Spawn the reconciliation sweep.
//! 7. Re-dispatch any jobs left `queued` by a previous run.
//! 8. Wait for ctrl-c.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use echo_transcriber::asr::{AsrError, TranscriptionEngine, TranscriptionOutput, WhisperEngine};
use echo_transcriber::config::{AppConfig, AppPaths};
use echo_transcriber::diarize::{DiarizationEngine, SidecarDiarizer};
use echo_transcriber::dispatch::{task_queue, InFlight, Reconciler, RetryPolicy, WorkerPool};
use echo_transcriber::pipeline::PipelineRunner;
use echo_transcriber::store::JobStore;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Echo transcriber starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    // 3. Job store
    let store = Arc::new(JobStore::open(config.db_path())?);
    log::info!("Job store ready at {}", store.path().display());

    // 4. Inference adapters (may fail if model not present — degrade
    //    gracefully so the daemon still starts and the reconciler runs)
    let model_path = AppPaths::new()
        .models_dir
        .join(format!("{}.bin", config.asr.model));

    let asr: Arc<dyn TranscriptionEngine> =
        match WhisperEngine::load(&model_path, config.asr.n_threads) {
            Ok(engine) => {
                log::info!("Whisper model loaded: {}", model_path.display());
                Arc::new(engine)
            }
            Err(e) => {
                log::warn!(
                    "Could not load Whisper model ({}): {e}. Jobs will fail until it is present.",
                    model_path.display()
                );
                // Use a stub that always returns an explanatory error so
                // the daemon still launches without a model file present.
                Arc::new(NoModelEngine {
                    path: model_path.display().to_string(),
                })
            }
        };

    let diarizer: Arc<dyn DiarizationEngine> =
        Arc::new(SidecarDiarizer::from_config(&config.diarization));

    let runner = Arc::new(PipelineRunner::new(
        Arc::clone(&store),
        asr,
        diarizer,
        Duration::from_secs(config.worker.adapter_timeout_secs),
    ));

    // 5. Task queue + worker pool
    let (dispatcher, task_rx) = task_queue(config.worker.queue_depth);
    let in_flight = InFlight::new();
    let policy = RetryPolicy::from_config(&config.worker);

    let _workers = WorkerPool::spawn(
        config.worker.workers,
        runner,
        Arc::clone(&store),
        dispatcher.clone(),
        task_rx,
        in_flight,
        policy,
    );
    log::info!("Worker pool started ({} workers)", config.worker.workers);

    // 6. Reconciliation sweep
    let reconciler = Reconciler::new(Arc::clone(&store), &config.worker);
    tokio::spawn(reconciler.run());

    // 7. Re-dispatch jobs left queued by a previous run.  Jobs stuck in
    //    `processing` from a crashed worker are the reconciler's problem.
    let leftover = store.queued_jobs()?;
    if !leftover.is_empty() {
        log::info!("Re-dispatching {} queued job(s) from a previous run", leftover.len());
        for job_id in leftover {
            if let Err(e) = dispatcher.dispatch(&job_id).await {
                log::error!("Could not re-dispatch job {job_id}: {e}");
            }
        }
    }

    // 8. Run until interrupted.
    tokio::signal::ctrl_c().await?;
    log::info!("Shutdown signal received, exiting");
    Ok(())
}

// ---------------------------------------------------------------------------
// NoModelEngine — fallback adapter when the model file is not present
// ---------------------------------------------------------------------------

struct NoModelEngine {
    path: String,
}

impl TranscriptionEngine for NoModelEngine {
    fn transcribe(
        &self,
        _audio: &std::path::Path,
        _language: Option<&str>,
    ) -> Result<TranscriptionOutput, AsrError> {
        Err(AsrError::ModelNotFound(self.path.clone()))
    }
}
