use axum::{
    http::{header::CONTENT_TYPE, Extensions, HeaderMap, StatusCode, Version},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tower_http::CompressionLevel;

use crate::codec::Codec;
use crate::handlers;
use crate::results::stream;
use crate::AppState;

/// Builds the full Axum `Router` with all routes, middleware, and static serving.
pub fn create_router(state: Arc<AppState>) -> Router {
    let static_dir = state.config.static_dir.clone();

    Router::new()
        // ── Dataset endpoints ───────────────────────────────────
        .route("/tasks/json", get(handlers::tasks::get_tasks_json))
        .route("/tasks/protobuf", get(handlers::tasks::get_tasks_protobuf))
        // ── Benchmark control ───────────────────────────────────
        .route(
            "/api/benchmark/start",
            post(handlers::benchmark::start_benchmark),
        )
        .route(
            "/api/benchmark/stop",
            post(handlers::benchmark::stop_benchmark),
        )
        .route(
            "/api/benchmark/status",
            get(handlers::benchmark::benchmark_status),
        )
        // ── Results ─────────────────────────────────────────────
        .route("/api/results", get(stream::get_results))
        .route("/api/results/stream", get(stream::results_stream))
        .route("/api/chart.svg", get(handlers::chart::get_chart))
        // ── Provide shared state to all routes above ────────────
        .with_state(state)
        // ── Serve the dashboard ─────────────────────────────────
        .fallback_service(ServeDir::new(static_dir))
        // ── Global middleware (applied bottom-up) ───────────────
        .layer(
            CompressionLayer::new()
                .quality(CompressionLevel::Fastest)
                .compress_when(is_payload),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Only the JSON and protobuf payloads are compressed; the dashboard, the
/// chart and the event stream go out as they are.
fn is_payload(_: StatusCode, _: Version, headers: &HeaderMap, _: &Extensions) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| Codec::ALL.iter().any(|c| ct.starts_with(c.content_type())))
}
