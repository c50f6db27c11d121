use axum::{
    extract::{Query, State},
    http::header::{CACHE_CONTROL, CONTENT_TYPE},
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::chart::{self, SvgCanvas};
use crate::histogram::Histogram;
use crate::AppState;

/// Largest canvas edge we are willing to render
const MAX_EDGE: f32 = 4096.0;

#[derive(Debug, Clone, Deserialize)]
pub struct ChartParams {
    #[serde(default = "default_width")]
    pub width: f32,
    #[serde(default = "default_height")]
    pub height: f32,
}

fn default_width() -> f32 {
    720.0
}
fn default_height() -> f32 {
    400.0
}

// ─── GET /api/chart.svg ──────────────────────────────────────────

pub async fn get_chart(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ChartParams>,
) -> impl IntoResponse {
    // Copy under the lock, draw without it.
    let samples = state.results.samples();
    let hist = Histogram::build(&samples);
    tracing::debug!(
        samples = samples.len(),
        min = hist.min(),
        max = hist.max(),
        unit = hist.unit.suffix(),
        "rendering chart"
    );

    let width = clamp_edge(params.width);
    let height = clamp_edge(params.height);
    let mut canvas = SvgCanvas::new(width, height);
    let bounds = canvas.bounds();
    chart::render(&hist, &mut canvas, bounds);

    (
        [
            (CONTENT_TYPE, "image/svg+xml"),
            (CACHE_CONTROL, "no-store"),
        ],
        canvas.finish(),
    )
}

fn clamp_edge(v: f32) -> f32 {
    if v.is_finite() {
        v.clamp(0.0, MAX_EDGE)
    } else {
        0.0
    }
}
