use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

mod chart;
mod codec;
mod config;
mod fetcher;
mod handlers;
mod histogram;
mod mock_data;
mod results;
mod runner;
mod schema;
mod server;

use config::Config;
use fetcher::HttpFetcher;
use results::{ProgressEvent, ResultLog};
use runner::RunHandle;

/// Buffered progress events per SSE subscriber before it starts lagging.
const EVENT_CAPACITY: usize = 1024;

/// Shared application state available to every handler via `State<Arc<AppState>>`.
pub struct AppState {
    pub config: Config,

    /// HTTP client pointed at the benchmark target.
    pub fetcher: Arc<HttpFetcher>,

    /// Sample log — the runner appends, everything else reads snapshots.
    pub results: Arc<ResultLog>,

    /// One event per recorded sample; SSE subscribers redraw on each.
    pub events: broadcast::Sender<ProgressEvent>,

    /// The current (or last) run: its cancellation token and task, so
    /// `stop` can cancel and await it.
    pub bench: tokio::sync::Mutex<Option<RunHandle>>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let fetcher = HttpFetcher::new(&config.target_url(), config.request_timeout())?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Ok(Self {
            config,
            fetcher: Arc::new(fetcher),
            results: Arc::new(ResultLog::new()),
            events,
            bench: tokio::sync::Mutex::new(None),
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("wire_bench=info,tower_http=warn")),
        )
        .init();

    let config = Config::parse();
    config.validate().map_err(anyhow::Error::msg)?;

    println!();
    println!("╔══════════════════════════════════════════════════╗");
    println!("║   📦  JSON ↔ PROTOBUF PAYLOAD BENCH              ║");
    println!("╚══════════════════════════════════════════════════╝");
    println!();

    // ── 1. Build the dataset up front ────────────────────────────
    let dataset = mock_data::dataset();
    for codec in codec::Codec::ALL {
        tracing::info!(
            %codec,
            bytes = codec.encode(dataset).len(),
            "encoded dataset size"
        );
    }

    // ── 2. Build shared state ────────────────────────────────────
    let addr = config.bind_addr();
    let autostart = config.autostart.then_some(config.runs);
    let state = Arc::new(AppState::new(config)?);

    // ── 3. Build Axum router ─────────────────────────────────────
    let app = server::create_router(state.clone());

    // ── 4. Bind & serve ──────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr} — is it already in use?"))?;

    let port = addr.port();
    println!("Server listening on http://localhost:{port}");
    println!("Dashboard       → http://localhost:{port}");
    println!("Results SSE     → http://localhost:{port}/api/results/stream");
    println!("Chart           → http://localhost:{port}/api/chart.svg");
    println!("Benchmarking    → {}", state.fetcher.base_url());
    println!();

    if let Some(runs) = autostart {
        if let Err(e) = handlers::benchmark::start(&state, runs).await {
            tracing::warn!(?e, "autostart failed");
        }
    }

    axum::serve(listener, app)
        .await
        .context("server exited with error")
}
