use pdatastructs::tdigest::{TDigest, K1};
use std::fmt;
use std::time::Duration;
use tracing::error;
use vuload_core::{CheckSummary, RunStatistics};

const TDIGEST_BACKLOG_SIZE: usize = 100;

/// Raw counts drained from the shared atomics over one reporting interval.
#[derive(Debug, Clone)]
pub(crate) struct Sample {
    pub success: u64,
    pub error: u64,
    pub iterations: u64,
    pub latencies: Vec<Duration>,
    pub elapsed: Duration,
}

impl Sample {
    fn requests(&self) -> u64 {
        self.success + self.error
    }
}

/// Per-interval view of a [`Sample`], used for progress logging.
#[derive(Debug)]
pub(crate) struct Measurement {
    pub tps: f64,
    pub error_rate: f64,
    pub iterations: u64,
    latency: Latency,
}

impl Measurement {
    pub fn new(sample: &Sample) -> Self {
        let mut latency = Latency::new();
        latency.populate(&sample.latencies);

        Self {
            tps: rate(sample.requests(), sample.elapsed),
            error_rate: ratio(sample.error, sample.requests()),
            iterations: sample.iterations,
            latency,
        }
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TPS={:.2}, ErrorRate={:.2}, Iterations={}, p50={:?}, p90={:?}, p99={:?}",
            self.tps,
            self.error_rate,
            self.iterations,
            self.latency.quantile(0.5),
            self.latency.quantile(0.90),
            self.latency.quantile(0.99),
        )
    }
}

/// Cumulative counts over the whole run.
pub(crate) struct Totals {
    success: u64,
    error: u64,
    iterations: u64,
    latency: Latency,
}

impl Totals {
    pub fn new() -> Self {
        Self {
            success: 0,
            error: 0,
            iterations: 0,
            latency: Latency::new(),
        }
    }

    pub fn push(&mut self, sample: Sample) {
        self.success += sample.success;
        self.error += sample.error;
        self.iterations += sample.iterations;
        self.latency.populate(&sample.latencies);
    }

    pub fn finish(
        self,
        vus: usize,
        elapsed: Duration,
        interrupted_iterations: u64,
        checks: Vec<CheckSummary>,
    ) -> RunStatistics {
        RunStatistics {
            vus,
            elapsed,
            iterations: self.iterations,
            interrupted_iterations,
            requests_success: self.success,
            requests_error: self.error,
            actual_tps: rate(self.success + self.error, elapsed),
            latency_p50: self.latency.quantile(0.5),
            latency_p90: self.latency.quantile(0.90),
            latency_p99: self.latency.quantile(0.99),
            checks,
        }
    }
}

#[derive(Debug)]
struct Latency {
    digest: TDigest<K1>,
    count: usize,
}

impl Latency {
    fn new() -> Self {
        Self {
            // TODO: Double-check these values
            digest: TDigest::new(K1::new(10.), TDIGEST_BACKLOG_SIZE),
            count: 0,
        }
    }

    fn populate(&mut self, latencies: &[Duration]) {
        for latency in latencies {
            self.digest.insert(latency.as_secs_f64());
        }
        self.count += latencies.len();
    }

    fn quantile(&self, quantile: f64) -> Duration {
        if self.count == 0 {
            return Duration::ZERO;
        }

        let secs = self.digest.quantile(quantile);

        // TODO: Unfortunately TDigest sometimes returns NaN which we need to filter for.
        if secs.is_finite() && secs >= 0. {
            Duration::from_secs_f64(secs)
        } else {
            error!("Non-finite latency quantile calculated; reporting zero.");
            Duration::ZERO
        }
    }
}

fn rate(count: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0. {
        count as f64 / secs
    } else {
        0.
    }
}

fn ratio(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.
    } else {
        part as f64 / whole as f64
    }
}
