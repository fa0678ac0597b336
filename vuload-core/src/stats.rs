use serde::Serialize;
use serde_with::{serde_as, DurationSecondsWithFrac};
use std::fmt;
use std::time::Duration;

/// Pass/fail tally for a single named check.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CheckSummary {
    pub name: String,
    pub passes: u64,
    pub fails: u64,
}

impl CheckSummary {
    pub fn total(&self) -> u64 {
        self.passes + self.fails
    }

    /// Fraction of evaluations that passed. A check never evaluated has a rate of zero.
    pub fn pass_rate(&self) -> f64 {
        if self.total() == 0 {
            0.
        } else {
            self.passes as f64 / self.total() as f64
        }
    }
}

/// Run Statistics for a given Scenario
///
/// Collected across every virtual user once the run has fully stopped.
#[serde_as]
#[derive(Clone, Debug, Serialize)]
pub struct RunStatistics {
    pub vus: usize,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub elapsed: Duration,
    pub iterations: u64,
    pub interrupted_iterations: u64,
    pub requests_success: u64,
    pub requests_error: u64,
    pub actual_tps: f64,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub latency_p50: Duration,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub latency_p90: Duration,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub latency_p99: Duration,
    pub checks: Vec<CheckSummary>,
}

impl RunStatistics {
    pub fn requests(&self) -> u64 {
        self.requests_success + self.requests_error
    }

    pub fn error_rate(&self) -> f64 {
        if self.requests() == 0 {
            0.
        } else {
            self.requests_error as f64 / self.requests() as f64
        }
    }

    pub fn check(&self, name: &str) -> Option<&CheckSummary> {
        self.checks.iter().find(|c| c.name == name)
    }
}

impl fmt::Display for RunStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for check in &self.checks {
            let mark = if check.fails == 0 { '✓' } else { '✗' };
            writeln!(
                f,
                "  {mark} {} ({:.2}% pass, {} / {})",
                check.name,
                check.pass_rate() * 100.,
                check.passes,
                check.fails
            )?;
        }
        writeln!(
            f,
            "  iterations: {} ({} interrupted)",
            self.iterations, self.interrupted_iterations
        )?;
        writeln!(
            f,
            "  requests: {} ({:.2}/s), failed: {:.2}%",
            self.requests(),
            self.actual_tps,
            self.error_rate() * 100.
        )?;
        writeln!(
            f,
            "  latency: p50={:?}, p90={:?}, p99={:?}",
            self.latency_p50, self.latency_p90, self.latency_p99
        )?;
        write!(
            f,
            "  vus: {}, elapsed: {}",
            self.vus,
            humantime::format_duration(self.elapsed)
        )
    }
}
