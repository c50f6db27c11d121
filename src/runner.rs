use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::codec::Codec;
use crate::fetcher::{Fetch, SampleError};
use crate::results::{PayloadSizes, Phase, ProgressEvent, ResultLog, Sample};

/// Order in which each iteration hits the endpoints.
const ITERATION_ORDER: [Codec; 2] = [Codec::StructuredText, Codec::CompactBinary];

// ─── Public entry point ──────────────────────────────────────────

/// Everything a run needs.
pub struct Runner<F> {
    pub fetcher: Arc<F>,
    pub results: Arc<ResultLog>,
    pub events: broadcast::Sender<ProgressEvent>,
    /// Owned by this run only; checked before every iteration.
    pub cancel: CancellationToken,
}

impl<F> Clone for Runner<F> {
    fn clone(&self) -> Self {
        Self {
            fetcher: self.fetcher.clone(),
            results: self.results.clone(),
            events: self.events.clone(),
            cancel: self.cancel.clone(),
        }
    }
}

impl<F: Fetch> Runner<F> {
    /// Primes once per codec, then alternates JSON / protobuf for `runs`
    /// iterations or until the token is cancelled.
    pub async fn run(&self, runs: u32) {
        let started = Instant::now();

        // ── Priming: sizes only, nothing enters the log ─────────
        self.results.set_phase(Phase::Priming);
        let text = self.measure(Codec::StructuredText).await;
        let binary = self.measure(Codec::CompactBinary).await;
        let sizes = PayloadSizes::new(byte_size(&text), byte_size(&binary));
        self.results.set_payload_sizes(sizes);
        tracing::info!(
            json_kb = sizes.structured_text_kb,
            protobuf_kb = sizes.compact_binary_kb,
            "payload sizes measured"
        );

        // ── Timed run ───────────────────────────────────────────
        self.results.set_phase(Phase::Running);
        let mut completed = 0;
        for i in 1..=runs {
            if self.cancel.is_cancelled() {
                tracing::info!(completed, runs, "benchmark cancelled");
                self.results
                    .note(format!("cancelled after {completed}/{runs} iterations"));
                break;
            }
            for codec in ITERATION_ORDER {
                let outcome = self.measure(codec).await;
                let last = i == runs && codec == ITERATION_ORDER[ITERATION_ORDER.len() - 1];
                self.record(codec, i, runs, outcome, last);
                // Give readers a chance to redraw between samples.
                tokio::task::yield_now().await;
            }
            completed = i;
        }

        self.results.set_phase(Phase::Idle);
        tracing::info!(
            completed,
            runs,
            elapsed_secs = started.elapsed().as_secs_f64(),
            "benchmark finished"
        );
    }

    /// Spawns `run` on the runtime and hands back its token and task.
    pub fn spawn(self, runs: u32) -> RunHandle {
        let cancel = self.cancel.clone();
        let task = tokio::spawn(async move {
            self.run(runs).await;
        });
        RunHandle { cancel, task }
    }

    /// Fetch + decode. The decode time is added to the fetch time.
    async fn measure(&self, codec: Codec) -> Result<Sample, SampleError> {
        let fetched = self.fetcher.fetch(codec).await?;

        let t_decode = Instant::now();
        let list = codec.decode(&fetched.bytes)?;
        let decode_us = t_decode.elapsed().as_micros() as u64;
        tracing::trace!(%codec, tasks = list.tasks.len(), decode_us, "decoded");

        Ok(Sample {
            codec,
            byte_size: fetched.byte_size(),
            elapsed_micros: fetched.elapsed_micros + decode_us,
        })
    }

    /// Appends the outcome to the log, failures as a zero sample, and
    /// publishes a progress event.
    fn record(
        &self,
        codec: Codec,
        i: u32,
        runs: u32,
        outcome: Result<Sample, SampleError>,
        last: bool,
    ) {
        let (sample, error) = match outcome {
            Ok(sample) => (sample, None),
            Err(e) => {
                tracing::warn!(%codec, iteration = i, error = %e, "request failed");
                (Sample::zero(codec), Some(format!("error: {e}")))
            }
        };

        let message = format!("{codec} {i}/{runs}: {} µs", sample.elapsed_micros);
        let seq = self.results.record_outcome(sample, error, message.clone());

        // No subscribers is fine.
        let _ = self.events.send(ProgressEvent {
            seq,
            sample,
            message,
            last,
        });
    }
}

/// A spawned run: its own cancellation token and the task driving it.
pub struct RunHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl RunHandle {
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Cancels before the next iteration and waits for the task to exit.
    pub async fn stop(self) -> Result<(), JoinError> {
        self.cancel.cancel();
        self.task.await
    }

    /// Waits for the run to finish on its own.
    pub async fn join(self) -> Result<(), JoinError> {
        self.task.await
    }
}

fn byte_size(outcome: &Result<Sample, SampleError>) -> u64 {
    outcome.as_ref().map(|s| s.byte_size).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::Fetched;
    use crate::mock_data;
    use parking_lot::Mutex;
    use std::collections::HashSet;
    use std::time::Duration;

    /// Serves the mock dataset, failing the calls whose number is listed.
    struct ScriptedFetcher {
        calls: Mutex<u32>,
        fail_on: HashSet<u32>,
        /// Cancels the token once this many calls were made.
        stop_after: Option<(u32, CancellationToken)>,
    }

    impl ScriptedFetcher {
        fn ok() -> Self {
            Self {
                calls: Mutex::new(0),
                fail_on: HashSet::new(),
                stop_after: None,
            }
        }
    }

    impl Fetch for ScriptedFetcher {
        async fn fetch(&self, codec: Codec) -> Result<Fetched, SampleError> {
            let n = {
                let mut calls = self.calls.lock();
                *calls += 1;
                *calls
            };
            if let Some((limit, cancel)) = &self.stop_after {
                if n >= *limit {
                    cancel.cancel();
                }
            }
            if self.fail_on.contains(&n) {
                return Err(SampleError::NonSuccessStatus(503));
            }
            Ok(Fetched {
                bytes: codec.encode(mock_data::dataset()),
                elapsed_micros: 100,
            })
        }
    }

    fn runner(fetcher: ScriptedFetcher, cancel: CancellationToken) -> Runner<ScriptedFetcher> {
        let (events, _) = broadcast::channel(64);
        Runner {
            fetcher: Arc::new(fetcher),
            results: Arc::new(ResultLog::new()),
            events,
            cancel,
        }
    }

    #[tokio::test]
    async fn alternates_codecs_and_skips_priming() {
        let cancel = CancellationToken::new();
        let r = runner(ScriptedFetcher::ok(), cancel.clone());
        r.run(3).await;

        let snap = r.results.snapshot();
        assert_eq!(snap.samples.len(), 6);
        let order: Vec<Codec> = snap.samples.iter().map(|s| s.codec).collect();
        assert_eq!(
            order,
            [
                Codec::StructuredText,
                Codec::CompactBinary,
                Codec::StructuredText,
                Codec::CompactBinary,
                Codec::StructuredText,
                Codec::CompactBinary,
            ]
        );
        assert!(snap.samples.iter().all(|s| s.elapsed_micros >= 100));
        assert_eq!(*r.fetcher.calls.lock(), 8);
        assert_eq!(snap.phase, Phase::Idle);
        assert!(!cancel.is_cancelled());

        let sizes = snap.payload_sizes.unwrap();
        assert!(sizes.compact_binary_bytes < sizes.structured_text_bytes);
        assert_eq!(snap.progress[0], format!("JSON 1/3: {} µs", snap.samples[0].elapsed_micros));
        assert!(snap.progress[1].starts_with("Protobuf 1/3: "));
    }

    #[tokio::test]
    async fn failure_mid_run_becomes_zero_sample() {
        let mut fetcher = ScriptedFetcher::ok();
        // Calls 1 and 2 are priming; call 4 is the first protobuf sample.
        fetcher.fail_on.insert(4);
        let r = runner(fetcher, CancellationToken::new());
        r.run(2).await;

        let snap = r.results.snapshot();
        assert_eq!(snap.samples.len(), 4);
        assert_eq!(snap.samples[1], Sample::zero(Codec::CompactBinary));
        assert!(snap.samples[2].byte_size > 0);
        assert_eq!(snap.failures(Codec::CompactBinary), 1);
        assert_eq!(snap.failures(Codec::StructuredText), 0);
        assert!(snap
            .progress
            .iter()
            .any(|l| l == "error: server answered HTTP 503"));
        assert!(snap.progress.iter().any(|l| l == "Protobuf 1/2: 0 µs"));
    }

    #[tokio::test]
    async fn failed_priming_reports_zero_size() {
        let mut fetcher = ScriptedFetcher::ok();
        fetcher.fail_on.insert(1);
        let r = runner(fetcher, CancellationToken::new());
        r.run(1).await;

        let snap = r.results.snapshot();
        let sizes = snap.payload_sizes.unwrap();
        assert_eq!(sizes.structured_text_bytes, 0);
        assert!(sizes.compact_binary_bytes > 0);
        assert_eq!(snap.samples.len(), 2);
        assert_eq!(snap.failures(Codec::StructuredText), 0);
    }

    #[tokio::test]
    async fn cancelling_stops_between_iterations() {
        let cancel = CancellationToken::new();
        let mut fetcher = ScriptedFetcher::ok();
        // Priming (2) + first iteration (2) + one call into the second.
        fetcher.stop_after = Some((5, cancel.clone()));
        let r = runner(fetcher, cancel);
        r.run(100).await;

        // The second iteration finishes; the third never starts.
        let snap = r.results.snapshot();
        assert_eq!(snap.samples.len(), 4);
        assert_eq!(snap.phase, Phase::Idle);
        assert_eq!(
            snap.progress.last().map(String::as_str),
            Some("cancelled after 2/100 iterations")
        );
    }

    #[tokio::test]
    async fn stopping_one_run_leaves_the_next_alone() {
        let first = runner(ScriptedFetcher::ok(), CancellationToken::new());
        let log = first.results.clone();
        let handle = first.spawn(1000);
        handle.stop().await.unwrap();

        let second = Runner {
            fetcher: Arc::new(ScriptedFetcher::ok()),
            results: log.clone(),
            events: broadcast::channel(8).0,
            cancel: CancellationToken::new(),
        };
        log.reset();
        let handle = second.spawn(3);
        tokio::time::timeout(Duration::from_secs(10), handle.join())
            .await
            .unwrap()
            .unwrap();

        // Only the second run's samples, and it ran to completion.
        assert_eq!(log.len(), 6);
        assert!(!log.snapshot().progress.iter().any(|l| l.starts_with("cancelled")));
    }

    #[tokio::test]
    async fn publishes_one_event_per_sample() {
        let r = runner(ScriptedFetcher::ok(), CancellationToken::new());
        let mut rx = r.events.subscribe();
        r.run(2).await;

        let mut seqs = Vec::new();
        let mut last = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            seqs.push(ev.seq);
            last.push(ev.last);
        }
        assert_eq!(seqs, [0, 1, 2, 3]);
        assert_eq!(last, [false, false, false, true]);
    }

    #[tokio::test]
    async fn undecodable_payload_is_a_failure() {
        struct Garbage;
        impl Fetch for Garbage {
            async fn fetch(&self, _codec: Codec) -> Result<Fetched, SampleError> {
                Ok(Fetched {
                    bytes: b"\xff\xff\xff".to_vec(),
                    elapsed_micros: 10,
                })
            }
        }

        let (events, _) = broadcast::channel(8);
        let r = Runner {
            fetcher: Arc::new(Garbage),
            results: Arc::new(ResultLog::new()),
            events,
            cancel: CancellationToken::new(),
        };
        r.run(1).await;

        let snap = r.results.snapshot();
        assert!(snap.samples.iter().all(|s| *s == Sample::zero(s.codec)));
        assert_eq!(snap.failures(Codec::StructuredText), 1);
        assert_eq!(snap.failures(Codec::CompactBinary), 1);
    }
}
