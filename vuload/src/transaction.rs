use metrics_util::AtomicBucket;
use std::time::{Duration, Instant};
use std::{
    future::Future,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};
use vuload_core::TransactionLabels;

/// Transaction hook used by the `#[transaction]` macro. Not intended to be used manually.
pub async fn transaction_hook<T, R, E>(labels: TransactionLabels, func: T) -> T::Output
where
    T: Future<Output = Result<R, E>>,
{
    // TODO: Remove clone
    if let Ok(hook) = TRANSACTION_HOOK.try_with(|v| v.clone()) {
        let start = Instant::now();
        let res = func.await;
        let elapsed = start.elapsed();

        hook.latency.push(elapsed);
        if res.is_ok() {
            hook.success.fetch_add(1, Ordering::Relaxed);
        } else {
            hook.error.fetch_add(1, Ordering::Relaxed);
        }
        record_metrics(labels, res.is_ok(), elapsed);

        res
    } else {
        tracing::warn!("No hook available.");
        func.await
    }
}

#[cfg(feature = "metrics")]
fn record_metrics(labels: TransactionLabels, success: bool, elapsed: Duration) {
    metrics::histogram!(labels.latency).record(elapsed.as_secs_f64());
    if success {
        metrics::counter!(labels.success).increment(1);
    } else {
        metrics::counter!(labels.error).increment(1);
    }
}

#[cfg(not(feature = "metrics"))]
fn record_metrics(_labels: TransactionLabels, _success: bool, _elapsed: Duration) {}

#[derive(Clone)]
pub(crate) struct TransactionData {
    pub success: Arc<AtomicU64>,
    pub error: Arc<AtomicU64>,
    pub latency: Arc<AtomicBucket<Duration>>,
}

tokio::task_local! {
    pub(crate) static TRANSACTION_HOOK: TransactionData;
}
