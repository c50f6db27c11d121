//! Equal-width latency buckets shared by both codecs.
//!
//! Both codecs are classified against the same edges so their bars line up
//! in the chart. The range is recomputed from scratch for every snapshot.

use serde::Serialize;

use crate::codec::Codec;
use crate::results::Sample;

pub const BUCKET_COUNT: usize = 7;

/// Above this many milliseconds the chart switches to seconds.
const SECONDS_THRESHOLD_MS: f64 = 2000.0;

/// Narrowest range, in ulps of the maximum, that still yields strictly
/// increasing edges.
const MIN_RANGE_ULPS: f64 = 16.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DisplayUnit {
    #[serde(rename = "ms")]
    Millis,
    #[serde(rename = "s")]
    Seconds,
}

impl DisplayUnit {
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Millis => "ms",
            Self::Seconds => "s",
        }
    }

    /// Factor applied to a millisecond value.
    pub fn scale(self) -> f64 {
        match self {
            Self::Millis => 1.0,
            Self::Seconds => 0.001,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bucket {
    pub upper_bound: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub unit: DisplayUnit,
    /// `BUCKET_COUNT + 1` edges in display units, first is the minimum.
    pub edges: Vec<f64>,
    pub buckets: Vec<Bucket>,
    pub compact_binary: [u64; BUCKET_COUNT],
    pub structured_text: [u64; BUCKET_COUNT],
}

impl Histogram {
    pub fn build(samples: &[Sample]) -> Self {
        let (mut min_ms, mut max_ms) = latency_range_ms(samples);
        // Near 2^53 ms and beyond, +1 is lost to rounding.
        let min_range = max_ms * f64::EPSILON * MIN_RANGE_ULPS;
        if min_ms == max_ms {
            max_ms = min_ms + min_range.max(1.0);
        } else if max_ms - min_ms < min_range {
            max_ms = min_ms + min_range;
        }

        let unit = if max_ms < SECONDS_THRESHOLD_MS {
            DisplayUnit::Millis
        } else {
            DisplayUnit::Seconds
        };
        min_ms *= unit.scale();
        max_ms *= unit.scale();

        let edges: Vec<f64> = (0..=BUCKET_COUNT)
            .map(|i| min_ms + (max_ms - min_ms) * i as f64 / BUCKET_COUNT as f64)
            .collect();

        let buckets = edges
            .windows(2)
            .map(|w| Bucket {
                upper_bound: w[1],
                label: format!(
                    "{}–{} {}",
                    round2(w[0]),
                    round2(w[1]),
                    unit.suffix()
                ),
            })
            .collect();

        let mut hist = Self {
            unit,
            edges,
            buckets,
            compact_binary: [0; BUCKET_COUNT],
            structured_text: [0; BUCKET_COUNT],
        };

        for sample in samples {
            let value = sample.elapsed_micros as f64 / 1000.0 * unit.scale();
            let idx = hist.bucket_index(value);
            match sample.codec {
                Codec::CompactBinary => hist.compact_binary[idx] += 1,
                Codec::StructuredText => hist.structured_text[idx] += 1,
            }
        }

        hist
    }

    /// First bucket whose upper bound is ≥ `value`; anything at or past the
    /// last upper bound lands in the last bucket.
    pub fn bucket_index(&self, value: f64) -> usize {
        let last = BUCKET_COUNT - 1;
        if value >= self.buckets[last].upper_bound {
            return last;
        }
        self.buckets
            .iter()
            .position(|b| value <= b.upper_bound)
            .unwrap_or(last)
    }

    pub fn counts(&self, codec: Codec) -> &[u64; BUCKET_COUNT] {
        match codec {
            Codec::CompactBinary => &self.compact_binary,
            Codec::StructuredText => &self.structured_text,
        }
    }

    /// Largest count in any bucket of either codec.
    pub fn max_count(&self) -> u64 {
        self.compact_binary
            .iter()
            .chain(self.structured_text.iter())
            .copied()
            .max()
            .unwrap_or(0)
    }

    pub fn min(&self) -> f64 {
        self.edges[0]
    }

    pub fn max(&self) -> f64 {
        self.edges[BUCKET_COUNT]
    }
}

/// (min, max) latency in ms across every sample, (0, 1) when empty.
fn latency_range_ms(samples: &[Sample]) -> (f64, f64) {
    let mut micros = samples.iter().map(|s| s.elapsed_micros);
    let Some(first) = micros.next() else {
        return (0.0, 1.0);
    };
    let (lo, hi) = micros.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
    (lo as f64 / 1000.0, hi as f64 / 1000.0)
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample(codec: Codec, elapsed_micros: u64) -> Sample {
        Sample {
            codec,
            byte_size: 100,
            elapsed_micros,
        }
    }

    #[test]
    fn two_sample_scenario() {
        let log = [
            Sample {
                codec: Codec::CompactBinary,
                byte_size: 500,
                elapsed_micros: 1000,
            },
            Sample {
                codec: Codec::StructuredText,
                byte_size: 1500,
                elapsed_micros: 3000,
            },
        ];
        let hist = Histogram::build(&log);

        assert_eq!(hist.unit, DisplayUnit::Millis);
        assert_eq!(hist.min(), 1.0);
        assert_eq!(hist.max(), 3.0);
        assert!((hist.edges[1] - 1.2857).abs() < 1e-3);
        assert!((hist.edges[2] - 1.5714).abs() < 1e-3);
        assert_eq!(hist.compact_binary, [1, 0, 0, 0, 0, 0, 0]);
        assert_eq!(hist.structured_text, [0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(hist.buckets[0].label, "1–1.29 ms");
        assert_eq!(hist.buckets[6].label, "2.71–3 ms");
    }

    #[test]
    fn empty_log_uses_unit_range() {
        let hist = Histogram::build(&[]);
        assert_eq!(hist.buckets.len(), BUCKET_COUNT);
        assert_eq!(hist.min(), 0.0);
        assert_eq!(hist.max(), 1.0);
        assert_eq!(hist.max_count(), 0);
    }

    #[test]
    fn identical_latencies_widen_the_range() {
        let log = vec![sample(Codec::StructuredText, 5000); 4];
        let hist = Histogram::build(&log);
        assert_eq!(hist.min(), 5.0);
        assert_eq!(hist.max(), 6.0);
        assert!(hist.edges.iter().all(|e| e.is_finite()));
        assert_eq!(hist.structured_text.iter().sum::<u64>(), 4);
        assert_eq!(hist.structured_text[0], 4);
    }

    #[test]
    fn huge_latencies_keep_edges_increasing() {
        for log in [
            vec![sample(Codec::StructuredText, u64::MAX); 2],
            vec![
                sample(Codec::StructuredText, u64::MAX - 1000),
                sample(Codec::CompactBinary, u64::MAX),
            ],
            vec![sample(Codec::CompactBinary, 1 << 63)],
        ] {
            let hist = Histogram::build(&log);
            assert_eq!(hist.unit, DisplayUnit::Seconds);
            assert!(
                hist.edges.windows(2).all(|w| w[0] < w[1]),
                "{:?}",
                hist.edges
            );
            let total: u64 = hist.compact_binary.iter().chain(&hist.structured_text).sum();
            assert_eq!(total, log.len() as u64);
        }
    }

    #[test]
    fn unit_switches_to_seconds_at_two_seconds() {
        let ms = Histogram::build(&[
            sample(Codec::CompactBinary, 1000),
            sample(Codec::StructuredText, 1_999_000),
        ]);
        assert_eq!(ms.unit, DisplayUnit::Millis);
        assert!(ms.buckets.iter().all(|b| b.label.ends_with(" ms")));

        let s = Histogram::build(&[
            sample(Codec::CompactBinary, 1000),
            sample(Codec::StructuredText, 2_001_000),
        ]);
        assert_eq!(s.unit, DisplayUnit::Seconds);
        assert!((s.max() - 2.001).abs() < 1e-9);
        assert!((s.min() - 0.001).abs() < 1e-9);
        assert!(s.buckets.iter().all(|b| b.label.ends_with(" s")));
        assert_eq!(s.compact_binary[0], 1);
        assert_eq!(s.structured_text[BUCKET_COUNT - 1], 1);
    }

    #[test]
    fn zero_samples_land_in_first_bucket() {
        let hist = Histogram::build(&[
            sample(Codec::CompactBinary, 0),
            sample(Codec::CompactBinary, 7000),
        ]);
        assert_eq!(hist.compact_binary[0], 1);
        assert_eq!(hist.compact_binary[BUCKET_COUNT - 1], 1);
    }

    #[test]
    fn value_past_last_edge_goes_to_last_bucket() {
        let hist = Histogram::build(&[]);
        assert_eq!(hist.bucket_index(1_000.0), BUCKET_COUNT - 1);
        assert_eq!(hist.bucket_index(-1.0), 0);
    }

    fn arb_sample() -> impl Strategy<Value = Sample> {
        (any::<bool>(), prop_oneof![0u64..10_000_000, any::<u64>()]).prop_map(|(binary, micros)| {
            let codec = if binary {
                Codec::CompactBinary
            } else {
                Codec::StructuredText
            };
            sample(codec, micros)
        })
    }

    proptest! {
        #[test]
        fn every_sample_lands_in_exactly_one_bucket(log in prop::collection::vec(arb_sample(), 1..200)) {
            let hist = Histogram::build(&log);
            let binary = log.iter().filter(|s| s.codec == Codec::CompactBinary).count() as u64;
            let text = log.len() as u64 - binary;
            prop_assert_eq!(hist.compact_binary.iter().sum::<u64>(), binary);
            prop_assert_eq!(hist.structured_text.iter().sum::<u64>(), text);
        }

        #[test]
        fn edges_are_ordered_and_bucket_count_fixed(log in prop::collection::vec(arb_sample(), 0..50)) {
            let hist = Histogram::build(&log);
            prop_assert_eq!(hist.buckets.len(), BUCKET_COUNT);
            prop_assert_eq!(hist.edges.len(), BUCKET_COUNT + 1);
            prop_assert!(hist.edges.windows(2).all(|w| w[0] < w[1]));
        }

        #[test]
        fn building_twice_is_identical(log in prop::collection::vec(arb_sample(), 0..50)) {
            let a = Histogram::build(&log);
            let b = Histogram::build(&log);
            prop_assert_eq!(
                a.edges.iter().map(|e| e.to_bits()).collect::<Vec<_>>(),
                b.edges.iter().map(|e| e.to_bits()).collect::<Vec<_>>()
            );
            prop_assert_eq!(a, b);
        }
    }
}
