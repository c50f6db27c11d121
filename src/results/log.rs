use std::collections::VecDeque;
use std::time::Instant;

use parking_lot::Mutex;
use serde::Serialize;

use super::Sample;
use crate::codec::Codec;

// ─── Configuration ───────────────────────────────────────────────

/// How many progress lines we keep for the live feed
const MAX_PROGRESS_LINES: usize = 500;

// ─── Public types ────────────────────────────────────────────────

/// Append-only sample log owned by the runner.
/// The runner calls `record_outcome()`, every reader goes through `snapshot()` and
/// works on the copy with the lock released.
pub struct ResultLog {
    inner: Mutex<Inner>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Priming,
    Running,
}

/// Payload size per encoding, measured once before the timed run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PayloadSizes {
    pub structured_text_bytes: u64,
    pub compact_binary_bytes: u64,
    pub structured_text_kb: f64,
    pub compact_binary_kb: f64,
}

impl PayloadSizes {
    pub fn new(structured_text_bytes: u64, compact_binary_bytes: u64) -> Self {
        let kb = |b: u64| (b as f64 / 1024.0 * 100.0).round() / 100.0;
        Self {
            structured_text_bytes,
            compact_binary_bytes,
            structured_text_kb: kb(structured_text_bytes),
            compact_binary_kb: kb(compact_binary_bytes),
        }
    }
}

/// Point-in-time copy of the log.
#[derive(Debug, Clone)]
pub struct ResultSnapshot {
    pub phase: Phase,
    pub samples: Vec<Sample>,
    pub progress: Vec<String>,
    pub payload_sizes: Option<PayloadSizes>,
    pub failures_binary: u64,
    pub failures_text: u64,
    pub elapsed_secs: f64,
}

impl ResultSnapshot {
    pub fn failures(&self, codec: Codec) -> u64 {
        match codec {
            Codec::CompactBinary => self.failures_binary,
            Codec::StructuredText => self.failures_text,
        }
    }
}

// ─── Internal state ──────────────────────────────────────────────

struct Inner {
    phase: Phase,
    samples: Vec<Sample>,
    progress: VecDeque<String>,
    payload_sizes: Option<PayloadSizes>,
    failures_binary: u64,
    failures_text: u64,

    // Wall-clock anchor for elapsed time
    start_time: Option<Instant>,
}

// ─── ResultLog impl ──────────────────────────────────────────────

impl ResultLog {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::new()),
        }
    }

    /// Append one sample together with its progress line, and for a failed
    /// request the failure count and error line, under a single lock.
    /// Returns the sample's position in the log.
    pub fn record_outcome(&self, sample: Sample, error: Option<String>, line: String) -> usize {
        let mut inner = self.inner.lock();
        inner.start_time.get_or_insert_with(Instant::now);
        if let Some(error) = error {
            match sample.codec {
                Codec::CompactBinary => inner.failures_binary += 1,
                Codec::StructuredText => inner.failures_text += 1,
            }
            inner.push_line(error);
        }
        inner.samples.push(sample);
        inner.push_line(line);
        inner.samples.len() - 1
    }

    /// Append a line to the progress feed.
    pub fn note(&self, line: impl Into<String>) {
        self.inner.lock().push_line(line.into());
    }

    pub fn set_phase(&self, phase: Phase) {
        self.inner.lock().phase = phase;
    }

    pub fn phase(&self) -> Phase {
        self.inner.lock().phase
    }

    pub fn set_payload_sizes(&self, sizes: PayloadSizes) {
        self.inner.lock().payload_sizes = Some(sizes);
    }

    /// Wipe all data — called when a new benchmark run starts.
    pub fn reset(&self) {
        *self.inner.lock() = Inner::new();
    }

    /// Copy of the samples only; enough for a histogram.
    pub fn samples(&self) -> Vec<Sample> {
        self.inner.lock().samples.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().samples.len()
    }

    /// Produce a read-only copy. The lock is held only for the copy.
    pub fn snapshot(&self) -> ResultSnapshot {
        let inner = self.inner.lock();
        ResultSnapshot {
            phase: inner.phase,
            samples: inner.samples.clone(),
            progress: inner.progress.iter().cloned().collect(),
            payload_sizes: inner.payload_sizes,
            failures_binary: inner.failures_binary,
            failures_text: inner.failures_text,
            elapsed_secs: inner
                .start_time
                .map(|t| t.elapsed().as_secs_f64())
                .unwrap_or(0.0),
        }
    }
}

impl Default for ResultLog {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Inner impl ──────────────────────────────────────────────────

impl Inner {
    fn new() -> Self {
        Self {
            phase: Phase::Idle,
            samples: Vec::with_capacity(1024),
            progress: VecDeque::with_capacity(MAX_PROGRESS_LINES + 1),
            payload_sizes: None,
            failures_binary: 0,
            failures_text: 0,
            start_time: None,
        }
    }

    fn push_line(&mut self, line: String) {
        self.progress.push_back(line);
        if self.progress.len() > MAX_PROGRESS_LINES {
            self.progress.pop_front();
        }
    }
}
