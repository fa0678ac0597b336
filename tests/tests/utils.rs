use ingest_loadtest::iteration;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use mock_service::MockState;
use std::sync::OnceLock;
use tracing::error;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use vuload::prelude::*;
use vuload::Scenario;

static METRICS: OnceLock<PrometheusHandle> = OnceLock::new();

#[allow(unused)]
pub fn init() -> &'static PrometheusHandle {
    METRICS.get_or_init(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            default_panic(info);
            error!("Panic occurred: {info:?}");
        }));

        FmtSubscriber::builder()
            .with_env_filter(EnvFilter::new(
                "vuload=debug,ingest_loadtest=debug,mock_service=info",
            ))
            .with_test_writer()
            .init();

        PrometheusBuilder::new()
            .install_recorder()
            .expect("failed to install metrics recorder")
    })
}

/// Start a stub endpoint on an ephemeral port and return its `/dump/request` URL.
#[allow(unused)]
pub async fn mock_endpoint(state: &MockState) -> String {
    let addr = mock_service::spawn(state.clone())
        .await
        .expect("failed to bind mock endpoint");
    format!("http://{addr}/dump/request")
}

/// The ingestion scenario pointed at `target` instead of the fixed proxy address.
#[allow(unused)]
pub fn ingest_scenario(
    name: &str,
    target: String,
) -> impl ConfigurableScenario<Result<RunStatistics, ConfigError>> {
    Scenario::new(name, move || {
        let target = target.clone();
        async move { iteration(&target).await }
    })
}
