//! Named boolean assertions recorded per iteration.
//!
//! A failing check never aborts the iteration: the outcome is tallied into the running
//! scenario's [`RunStatistics`](vuload_core::RunStatistics) and the `metrics` facade, and the
//! caller gets a `bool` back to branch on if it wants to.
use std::sync::{Arc, Mutex, PoisonError};
use tracing::warn;
use vuload_core::CheckSummary;

/// Evaluate `predicate` against `value` and record the outcome under `name`.
pub fn check<T, P>(value: &T, name: &str, predicate: P) -> bool
where
    T: ?Sized,
    P: FnOnce(&T) -> bool,
{
    let passed = predicate(value);
    record(name, passed);
    passed
}

/// Evaluate a set of named predicates against one value.
///
/// Every predicate is evaluated and recorded, even after one fails. Returns `true` only if all
/// of them passed.
///
/// ```
/// use vuload::check;
///
/// let status = 200;
/// let ok = check!(status, {
///     "is status 200" => |s| *s == 200,
///     "is not a server error" => |s| *s < 500,
/// });
/// assert!(ok);
/// ```
#[macro_export]
macro_rules! check {
    ($value:expr, { $($name:expr => $predicate:expr),+ $(,)? }) => {{
        let value = &$value;
        let mut passed = true;
        $( passed &= $crate::check::check(value, $name, $predicate); )+
        passed
    }};
}

fn record(name: &str, passed: bool) {
    #[cfg(feature = "metrics")]
    metrics::counter!(
        vuload_core::CHECKS_METRIC,
        "check" => name.to_string(),
        "result" => if passed { "pass" } else { "fail" }
    )
    .increment(1);

    if CHECK_HOOK.try_with(|checks| checks.record(name, passed)).is_err() {
        warn!("No check hook available; `{name}` was evaluated outside of a scenario.");
    }
}

/// Per-scenario tally of every check evaluated by its virtual users.
#[derive(Debug, Default)]
pub(crate) struct CheckRegistry {
    checks: Mutex<Vec<CheckSummary>>,
}

impl CheckRegistry {
    pub fn record(&self, name: &str, passed: bool) {
        let mut checks = self.checks.lock().unwrap_or_else(PoisonError::into_inner);
        let idx = match checks.iter().position(|c| c.name == name) {
            Some(idx) => idx,
            None => {
                checks.push(CheckSummary {
                    name: name.to_string(),
                    ..Default::default()
                });
                checks.len() - 1
            }
        };

        if passed {
            checks[idx].passes += 1;
        } else {
            checks[idx].fails += 1;
        }
    }

    /// Snapshot in order of first evaluation.
    pub fn summaries(&self) -> Vec<CheckSummary> {
        self.checks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

tokio::task_local! {
    pub(crate) static CHECK_HOOK: Arc<CheckRegistry>;
}
