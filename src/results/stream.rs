use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use super::{Report, Sample};
use crate::AppState;

/// Shortest gap between two full reports on one stream.
const REPORT_INTERVAL: Duration = Duration::from_millis(250);

/// Payload of one SSE event: the sample that triggered it, plus a report
/// over the whole log when one is due.
#[derive(Debug, Serialize)]
struct LiveUpdate {
    seq: Option<usize>,
    sample: Option<Sample>,
    message: Option<String>,
    report: Option<Report>,
}

/// Decides when a stream rebuilds its report. Building one copies the whole
/// log, so doing it per sample would make a run quadratic.
#[derive(Debug)]
struct ReportThrottle {
    interval: Duration,
    last: Option<Instant>,
}

impl ReportThrottle {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// The first call, a forced call, or one at least `interval` after the
    /// last report is due.
    fn due(&mut self, now: Instant, force: bool) -> bool {
        let due = force
            || self
                .last
                .map_or(true, |t| now.saturating_duration_since(t) >= self.interval);
        if due {
            self.last = Some(now);
        }
        due
    }
}

// ─── GET /api/results ────────────────────────────────────────────
/// Returns a single JSON report — useful for curl / debugging.

pub async fn get_results(State(state): State<Arc<AppState>>) -> Json<Report> {
    Json(Report::from_snapshot(&state.results.snapshot()))
}

// ─── GET /api/results/stream ─────────────────────────────────────
/// Server-Sent Events endpoint.
/// Pushes one update per recorded sample, so the dashboard redraws after
/// every request instead of on a timer. The full report rides along at most
/// every `REPORT_INTERVAL`, and always with a run's final sample.

pub async fn results_stream(
    State(state): State<Arc<AppState>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let rx = state.events.subscribe();

    let mut throttle = ReportThrottle::new(REPORT_INTERVAL);
    let stream = BroadcastStream::new(rx).map(move |item| {
        // A lagged receiver skips the missed events and gets a report to
        // catch up.
        let (seq, sample, message, force) = match item {
            Ok(ev) => (Some(ev.seq), Some(ev.sample), Some(ev.message), ev.last),
            Err(_) => (None, None, None, true),
        };
        let report = throttle
            .due(Instant::now(), force)
            .then(|| Report::from_snapshot(&state.results.snapshot()));
        let update = LiveUpdate {
            seq,
            sample,
            message,
            report,
        };
        let json = serde_json::to_string(&update).unwrap_or_default();
        Ok(Event::default().data(json))
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
