use crate::check::CheckRegistry;
use crate::measurement::Sample;
use crate::transaction::TransactionData;
use metrics_util::AtomicBucket;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use vuload_core::CheckSummary;

/// Counters shared between every virtual user of a scenario and the reporting loop.
#[derive(Clone)]
pub(crate) struct TaskAtomics {
    success: Arc<AtomicU64>,
    error: Arc<AtomicU64>,
    iterations: Arc<AtomicU64>,
    latency: Arc<AtomicBucket<Duration>>,
    checks: Arc<CheckRegistry>,
}

impl TaskAtomics {
    pub fn new() -> Self {
        Self {
            success: Arc::new(AtomicU64::new(0)),
            error: Arc::new(AtomicU64::new(0)),
            iterations: Arc::new(AtomicU64::new(0)),
            latency: Arc::new(AtomicBucket::new()),
            checks: Arc::new(CheckRegistry::default()),
        }
    }

    pub fn clone_to_transaction_data(&self) -> TransactionData {
        TransactionData {
            success: self.success.clone(),
            error: self.error.clone(),
            latency: self.latency.clone(),
        }
    }

    pub fn checks(&self) -> Arc<CheckRegistry> {
        self.checks.clone()
    }

    pub fn iteration_done(&self) {
        self.iterations.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "metrics")]
        metrics::counter!(vuload_core::ITERATIONS_METRIC).increment(1);
    }

    /// Drain everything recorded since the previous call.
    pub fn collect(&self, elapsed: Duration) -> Sample {
        let success = self.success.swap(0, Ordering::Relaxed);
        let error = self.error.swap(0, Ordering::Relaxed);
        let iterations = self.iterations.swap(0, Ordering::Relaxed);
        let mut latencies = vec![];
        self.latency.clear_with(|dur| latencies.extend_from_slice(dur));

        Sample {
            success,
            error,
            iterations,
            latencies,
            elapsed,
        }
    }

    pub fn check_summaries(&self) -> Vec<CheckSummary> {
        self.checks.summaries()
    }
}
