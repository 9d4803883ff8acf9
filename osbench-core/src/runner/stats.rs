use hdrhistogram::Histogram;
use serde::Serialize;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::listener::OperationListener;
use crate::sample::{OperationResult, Sample};

/// Run-wide listener that aggregates every sample and result it receives.
#[derive(Debug)]
pub struct SampleCollector {
    samples_total: AtomicU64,
    samples_failed: AtomicU64,
    results_total: AtomicU64,
    results_failed: AtomicU64,
    bytes_total: AtomicU64,
    elapsed_us: Mutex<Histogram<u64>>,
    xfer_us: Mutex<Histogram<u64>>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LatencySnapshotMs {
    pub mean_ms: f64,
    pub p50_ms: f64,
    pub p90_ms: f64,
    pub p99_ms: f64,
    pub max_ms: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub ops_total: u64,
    pub ops_failed: u64,
    pub results_total: u64,
    pub results_failed: u64,
    pub bytes_total: u64,
    pub run_duration_ms: u64,
    pub ops_per_sec: f64,
    pub bytes_per_sec: f64,
    /// Total elapsed time of successful operations.
    pub latency: LatencySnapshotMs,
    /// Transfer-only time of successful operations.
    pub xfer: LatencySnapshotMs,
}

impl Default for SampleCollector {
    fn default() -> Self {
        fn new_hist() -> Histogram<u64> {
            // Track up to one hour in microseconds (with 3 sigfigs).
            Histogram::<u64>::new_with_bounds(1, 3_600_000_000, 3)
                .unwrap_or_else(|err| panic!("failed to init histogram: {err}"))
        }

        Self {
            samples_total: AtomicU64::new(0),
            samples_failed: AtomicU64::new(0),
            results_total: AtomicU64::new(0),
            results_failed: AtomicU64::new(0),
            bytes_total: AtomicU64::new(0),
            elapsed_us: Mutex::new(new_hist()),
            xfer_us: Mutex::new(new_hist()),
        }
    }
}

fn record_us(hist: &Mutex<Histogram<u64>>, d: Duration) {
    let us: u64 = d.as_micros().try_into().unwrap_or(u64::MAX);
    let mut h = hist.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    h.saturating_record(us.max(1));
}

fn snapshot_ms(hist: &Mutex<Histogram<u64>>) -> LatencySnapshotMs {
    let h = hist.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

    #[allow(clippy::len_zero)]
    if h.len() == 0 {
        return LatencySnapshotMs::default();
    }

    let ms = |us: u64| us as f64 / 1000.0;
    LatencySnapshotMs {
        mean_ms: h.mean() / 1000.0,
        p50_ms: ms(h.value_at_quantile(0.50)),
        p90_ms: ms(h.value_at_quantile(0.90)),
        p99_ms: ms(h.value_at_quantile(0.99)),
        max_ms: ms(h.max()),
    }
}

impl SampleCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn samples_total(&self) -> u64 {
        self.samples_total.load(Ordering::Relaxed)
    }

    pub fn samples_failed(&self) -> u64 {
        self.samples_failed.load(Ordering::Relaxed)
    }

    pub fn results_total(&self) -> u64 {
        self.results_total.load(Ordering::Relaxed)
    }

    pub fn bytes_total(&self) -> u64 {
        self.bytes_total.load(Ordering::Relaxed)
    }

    pub fn summary(&self, run_duration: Duration) -> RunSummary {
        let ops_total = self.samples_total();
        let bytes_total = self.bytes_total();
        let secs = run_duration.as_secs_f64();
        let per_sec = |n: u64| if secs > 0.0 { n as f64 / secs } else { 0.0 };

        RunSummary {
            ops_total,
            ops_failed: self.samples_failed(),
            results_total: self.results_total(),
            results_failed: self.results_failed.load(Ordering::Relaxed),
            bytes_total,
            run_duration_ms: run_duration.as_millis().try_into().unwrap_or(u64::MAX),
            ops_per_sec: per_sec(ops_total),
            bytes_per_sec: per_sec(bytes_total),
            latency: snapshot_ms(&self.elapsed_us),
            xfer: snapshot_ms(&self.xfer_us),
        }
    }
}

impl OperationListener for SampleCollector {
    fn on_sample_created(&self, sample: Sample) {
        self.samples_total.fetch_add(1, Ordering::Relaxed);

        match sample.timing() {
            Some(timing) => {
                self.bytes_total
                    .fetch_add(timing.bytes(), Ordering::Relaxed);
                record_us(&self.elapsed_us, timing.elapsed());
                record_us(&self.xfer_us, timing.xfer());
            }
            None => {
                self.samples_failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    fn on_operation_completed(&self, result: OperationResult) {
        self.results_total.fetch_add(1, Ordering::Relaxed);
        if !result.is_succ() {
            self.results_failed.fetch_add(1, Ordering::Relaxed);
        }
    }
}
