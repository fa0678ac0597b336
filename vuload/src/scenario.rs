//! Scenario logic and constants
use crate::measurement::{Measurement, Totals};
use crate::task_atomics::TaskAtomics;
use crate::timer::Timer;
use crate::virtual_users::VirtualUsers;
use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
    time::Duration,
};
use tokio::time::Instant;
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn, Instrument};
use vuload_core::{ConfigError, Options, RunStatistics, ScenarioConfig, REPORT_INTERVAL};

type ScenarioResult = Result<RunStatistics, ConfigError>;

/// Load test scenario structure
///
/// Handler for running scenarios. Not intended for manual creation, use the [`#[scenario]`](vuload_macros::scenario) macro which will add these methods to functions.
#[pin_project::pin_project]
pub struct Scenario<T> {
    func: T,
    runner_fut: Option<Pin<Box<dyn Future<Output = ScenarioResult> + Send>>>,
    config: ScenarioConfig,
}

impl<T> Scenario<T> {
    #[doc(hidden)]
    pub fn new(name: &str, func: T) -> Self {
        Self {
            func,
            runner_fut: None,
            config: ScenarioConfig::new(name),
        }
    }
}

impl<T, F> Future for Scenario<T>
where
    T: Fn() -> F + Send + Sync + 'static + Clone,
    F: Future<Output = ()> + Send + 'static,
{
    type Output = ScenarioResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.runner_fut.is_none() {
            let func = self.func.clone();
            let config = self.config.clone();
            self.runner_fut = Some(Box::pin(async move { run_scenario(func, config).await }));
        }

        if let Some(runner) = &mut self.runner_fut {
            runner.as_mut().poll(cx)
        } else {
            unreachable!()
        }
    }
}

pub trait ConfigurableScenario<T: Send>: Future<Output = T> + Sized + Send {
    fn vus(self, vus: usize) -> Self;
    fn duration(self, duration: Duration) -> Self;
    fn options(self, options: Options) -> Self;
    fn graceful_stop(self, graceful_stop: Duration) -> Self;
}

impl<T, F> ConfigurableScenario<ScenarioResult> for Scenario<T>
where
    T: Fn() -> F + Send + Sync + 'static + Clone,
    F: Future<Output = ()> + Send + 'static,
{
    /// Run the scenario with the given number of concurrent virtual users.
    ///
    /// NOTE: Must supply a `.duration()` as well
    ///
    /// # Example
    /// ```no_run
    /// use vuload::prelude::*;
    /// use std::time::Duration;
    ///
    /// #[tokio::main]
    /// async fn main() {
    ///     my_scenario()
    ///         .vus(100)
    ///         .duration(Duration::from_secs(30))
    ///         .await
    ///         .unwrap();
    /// }
    ///
    /// #[scenario]
    /// async fn my_scenario() {
    /// }
    /// ```
    fn vus(mut self, vus: usize) -> Self {
        self.config.vus = Some(vus);
        self
    }

    /// Run the scenario for the given duration.
    ///
    /// NOTE: Must include `.vus()` as well
    fn duration(mut self, duration: Duration) -> Self {
        self.config.duration = Some(duration);
        self
    }

    /// Set both the virtual user count and the duration from a static [`Options`] record.
    ///
    /// # Example
    /// ```no_run
    /// use vuload::prelude::*;
    /// use std::time::Duration;
    ///
    /// const OPTIONS: Options = Options {
    ///     vus: 100,
    ///     duration: Duration::from_secs(30),
    /// };
    ///
    /// #[tokio::main]
    /// async fn main() {
    ///     my_scenario().options(OPTIONS).await.unwrap();
    /// }
    ///
    /// #[scenario]
    /// async fn my_scenario() {
    /// }
    /// ```
    fn options(mut self, options: Options) -> Self {
        self.config.set_options(options);
        self
    }

    /// How long iterations still in flight when the duration elapses may run before they are
    /// aborted. Defaults to [`vuload_core::DEFAULT_GRACEFUL_STOP`].
    fn graceful_stop(mut self, graceful_stop: Duration) -> Self {
        self.config.graceful_stop = graceful_stop;
        self
    }
}

#[instrument(name="scenario", skip_all, fields(name=config.name))]
pub(crate) async fn run_scenario<T, F>(scenario: T, config: ScenarioConfig) -> ScenarioResult
where
    T: Fn() -> F + Send + Sync + 'static + Clone,
    F: Future<Output = ()> + Send + 'static,
{
    let options = config.validate().map_err(|err| {
        error!("Refusing to run: {err}");
        err
    })?;
    info!("Running {} with {}", config.name, options);

    let atomics = TaskAtomics::new();
    let mut users = VirtualUsers::new(scenario, &atomics);
    let mut totals = Totals::new();

    let start = Instant::now();
    let deadline = start + options.duration;
    users.spawn(options.vus);

    // NOTE: Interval ticks are only for progress reporting; the deadline alone ends the run.
    let mut timer = Timer::new(REPORT_INTERVAL).await;
    loop {
        tokio::select! {
            elapsed = timer.tick() => {
                let sample = atomics.collect(elapsed);
                debug!("{}", Measurement::new(&sample));
                totals.push(sample);
            }
            _ = tokio::time::sleep_until(deadline) => break,
        }
    }

    debug!("Duration elapsed, stopping {} virtual users", users.len());
    let interrupted = users.shutdown(config.graceful_stop).await;
    if interrupted > 0 {
        warn!("{interrupted} iterations did not finish within the graceful stop period");
    }
    totals.push(atomics.collect(timer.since_last_tick()));

    let stats = totals.finish(
        options.vus,
        start.elapsed(),
        interrupted,
        atomics.check_summaries(),
    );
    info!("Scenario complete");

    Ok(stats)
}
