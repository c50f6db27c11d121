pub mod log;
pub mod percentiles;
pub mod report;
pub mod stream;

use serde::Serialize;

use crate::codec::Codec;

pub use log::{PayloadSizes, Phase, ResultLog, ResultSnapshot};
pub use report::Report;

/// One measured fetch + decode.
/// A failed request is recorded as a zero sample so it still shows up in
/// the chart; the failure itself is counted by the `ResultLog`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Sample {
    pub codec: Codec,
    /// Bytes received on the wire
    pub byte_size: u64,
    /// Request + body read + decode, in microseconds
    pub elapsed_micros: u64,
}

impl Sample {
    pub fn zero(codec: Codec) -> Self {
        Self {
            codec,
            byte_size: 0,
            elapsed_micros: 0,
        }
    }
}

/// Published once per appended sample so consumers can redraw.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressEvent {
    /// Position of the sample in the log (0-based)
    pub seq: usize,
    pub sample: Sample,
    pub message: String,
    /// Set on the final sample of a run that was not cancelled
    pub last: bool,
}
