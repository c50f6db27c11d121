use serde::Serialize;

use super::percentiles::PercentileSet;
use super::{PayloadSizes, Phase, ResultSnapshot};
use crate::codec::Codec;
use crate::histogram::Histogram;

/// How many progress lines go into a report
const PROGRESS_TAIL: usize = 50;

/// Per-codec aggregate shown next to the chart.
#[derive(Debug, Clone, Serialize)]
pub struct CodecSummary {
    pub codec: Codec,
    pub label: &'static str,
    pub samples: u64,
    pub failures: u64,
    /// Mean of the recorded latencies in ms, rounded to two decimals
    pub average_ms: f64,
    pub latency_us: PercentileSet,
}

/// Everything the dashboard needs, derived from one snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub phase: Phase,
    pub total_samples: usize,
    pub elapsed_secs: f64,
    pub payload_sizes: Option<PayloadSizes>,
    pub summaries: Vec<CodecSummary>,
    pub histogram: Histogram,
    pub progress: Vec<String>,
}

impl Report {
    pub fn from_snapshot(snap: &ResultSnapshot) -> Self {
        let summaries = [Codec::StructuredText, Codec::CompactBinary]
            .into_iter()
            .map(|codec| summarize(snap, codec))
            .collect();

        let skip = snap.progress.len().saturating_sub(PROGRESS_TAIL);

        Self {
            phase: snap.phase,
            total_samples: snap.samples.len(),
            elapsed_secs: snap.elapsed_secs,
            payload_sizes: snap.payload_sizes,
            summaries,
            histogram: Histogram::build(&snap.samples),
            progress: snap.progress[skip..].to_vec(),
        }
    }
}

fn summarize(snap: &ResultSnapshot, codec: Codec) -> CodecSummary {
    let micros: Vec<u64> = snap
        .samples
        .iter()
        .filter(|s| s.codec == codec)
        .map(|s| s.elapsed_micros)
        .collect();

    let average_ms = if micros.is_empty() {
        0.0
    } else {
        let mean_us = micros.iter().sum::<u64>() as f64 / micros.len() as f64;
        (mean_us / 1000.0 * 100.0).round() / 100.0
    };

    CodecSummary {
        codec,
        label: codec.label(),
        samples: micros.len() as u64,
        failures: snap.failures(codec),
        average_ms,
        latency_us: PercentileSet::from_micros(micros),
    }
}
