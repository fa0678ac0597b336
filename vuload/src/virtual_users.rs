use crate::check::CHECK_HOOK;
use crate::task_atomics::TaskAtomics;
use crate::transaction::TRANSACTION_HOOK;
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinSet;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

/// Pool of virtual users, each running the scenario in a closed loop.
pub(crate) struct VirtualUsers<T> {
    scenario: T,
    tasks: JoinSet<()>,
    stop: watch::Sender<bool>,
    task_atomics: TaskAtomics,
}

impl<T, F> VirtualUsers<T>
where
    T: Fn() -> F + Send + Sync + 'static + Clone,
    F: Future<Output = ()> + Send + 'static,
{
    pub fn new(scenario: T, task_atomics: &TaskAtomics) -> Self {
        let (stop, _) = watch::channel(false);
        Self {
            scenario,
            tasks: JoinSet::new(),
            stop,
            task_atomics: task_atomics.clone(),
        }
    }

    pub fn spawn(&mut self, count: usize) {
        for _ in 0..count {
            let scenario = self.scenario.clone();
            let task_atomics = self.task_atomics.clone();
            let transaction_data = task_atomics.clone_to_transaction_data();
            let checks = task_atomics.checks();
            let stop = self.stop.subscribe();

            self.tasks.spawn(TRANSACTION_HOOK.scope(
                transaction_data,
                CHECK_HOOK.scope(checks, async move {
                    // NOTE: The stop flag is only read between iterations; a running
                    // iteration is never cut short here.
                    loop {
                        if *stop.borrow() {
                            break;
                        }
                        scenario().await;
                        task_atomics.iteration_done();
                    }
                }),
            ));
        }

        #[cfg(feature = "metrics")]
        metrics::gauge!(vuload_core::VUS_METRIC).set(self.tasks.len() as f64);
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Stop starting new iterations and wait for the running ones to finish.
    ///
    /// Returns the number of iterations aborted because they outlived `graceful_stop`.
    pub async fn shutdown(mut self, graceful_stop: Duration) -> u64 {
        self.stop.send_replace(true);

        let tasks = &mut self.tasks;
        let drained = tokio::time::timeout(graceful_stop, async {
            while let Some(res) = tasks.join_next().await {
                if let Err(err) = res {
                    if err.is_panic() {
                        error!("Virtual user panicked: {err}");
                    }
                }
            }
        })
        .await;

        let interrupted = match drained {
            Ok(()) => 0,
            Err(_) => {
                let remaining = self.tasks.len() as u64;
                self.tasks.shutdown().await;
                remaining
            }
        };

        #[cfg(feature = "metrics")]
        metrics::gauge!(vuload_core::VUS_METRIC).set(0.);

        interrupted
    }
}
