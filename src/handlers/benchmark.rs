use axum::{body::Bytes, extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config;
use crate::results::Phase;
use crate::runner::Runner;
use crate::AppState;

use super::AppError;

// ─── Request / response types ────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BenchmarkRequest {
    /// Iterations; falls back to the configured default
    #[serde(default)]
    pub runs: Option<u32>,
}

impl BenchmarkRequest {
    /// An empty body means "use the defaults"; anything else must be a
    /// well-formed request.
    pub fn from_body(body: &[u8]) -> Result<Self, AppError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
            .map_err(|e| AppError::BadRequest(format!("invalid request body: {e}")))
    }
}

#[derive(Debug, Serialize)]
pub struct BenchmarkStatus {
    pub running: bool,
    pub phase: Phase,
    pub samples: usize,
    pub message: String,
}

// ─── POST /api/benchmark/start ───────────────────────────────────

pub async fn start_benchmark(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<BenchmarkStatus>, AppError> {
    let request = BenchmarkRequest::from_body(&body)?;
    let runs = request.runs.unwrap_or(state.config.runs);
    config::validate_runs(runs).map_err(AppError::BadRequest)?;

    start(&state, runs).await?;

    Ok(Json(BenchmarkStatus {
        running: true,
        phase: state.results.phase(),
        samples: 0,
        message: format!(
            "Started: {runs} iterations against {}",
            state.fetcher.base_url()
        ),
    }))
}

/// Resets the log and spawns the runner. Shared with `--autostart`.
pub async fn start(state: &Arc<AppState>, runs: u32) -> Result<(), AppError> {
    // Held for the whole start so two requests can't race, and so a
    // finished run is only replaced once its task has exited.
    let mut active = state.bench.lock().await;

    // Guard: only one benchmark at a time
    if active.as_ref().is_some_and(|run| run.is_running()) {
        return Err(AppError::AlreadyRunning);
    }

    // Reset results for a clean run
    state.results.reset();
    state.results.set_phase(Phase::Priming);

    let runner = Runner {
        fetcher: state.fetcher.clone(),
        results: state.results.clone(),
        events: state.events.clone(),
        cancel: CancellationToken::new(),
    };

    tracing::info!(runs, target = %state.fetcher.base_url(), "benchmark started");
    *active = Some(runner.spawn(runs));
    Ok(())
}

// ─── POST /api/benchmark/stop ────────────────────────────────────

pub async fn stop_benchmark(
    State(state): State<Arc<AppState>>,
) -> Result<Json<BenchmarkStatus>, AppError> {
    let message = if stop(&state).await {
        "Benchmark stopped"
    } else {
        "No benchmark is running"
    };
    Ok(Json(status(&state, false, message)))
}

/// Cancels the active run and waits for its task to exit. The slot stays
/// locked until then, so no new run can start in between. Returns whether a
/// run was still going.
pub async fn stop(state: &AppState) -> bool {
    let mut active = state.bench.lock().await;
    let Some(run) = active.take() else {
        return false;
    };
    let was_running = run.is_running();

    if let Err(e) = run.stop().await {
        tracing::warn!(?e, "runner task did not exit cleanly");
    }
    if was_running {
        tracing::info!(samples = state.results.len(), "benchmark stopped");
    }
    was_running
}

// ─── GET /api/benchmark/status ───────────────────────────────────

pub async fn benchmark_status(
    State(state): State<Arc<AppState>>,
) -> Json<BenchmarkStatus> {
    let running = is_running(&state).await;
    let message = if running {
        "Benchmark in progress"
    } else {
        "Idle"
    };
    Json(status(&state, running, message))
}

pub async fn is_running(state: &AppState) -> bool {
    state
        .bench
        .lock()
        .await
        .as_ref()
        .is_some_and(|run| run.is_running())
}

fn status(state: &AppState, running: bool, message: &str) -> BenchmarkStatus {
    BenchmarkStatus {
        running,
        phase: state.results.phase(),
        samples: state.results.len(),
        message: message.into(),
    }
}
