use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use mock_service::MockState;
use std::net::SocketAddr;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(version, about = "Stub analytics ingestion endpoint")]
struct Cli {
    #[arg(short, long, env = "MOCK_ADDR", default_value = "127.0.0.1:6191")]
    addr: SocketAddr,

    /// Status code returned by `/dump/request`.
    #[arg(short, long, env = "MOCK_STATUS", default_value_t = 200)]
    status: u16,

    /// Artificial latency added to every request.
    #[arg(short, long, env = "MOCK_DELAY_MS", default_value_t = 0)]
    delay_ms: u64,

    #[arg(long, env = "MOCK_METRICS_ADDR")]
    metrics_addr: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("mock_service=info,tower_http=warn")),
        )
        .init();

    let cli = Cli::parse();

    if let Some(addr) = cli.metrics_addr {
        PrometheusBuilder::new().with_http_listener(addr).install()?;
    }

    let state = MockState::new(cli.status.try_into()?);
    state.set_delay(Duration::from_millis(cli.delay_ms));

    tokio::spawn(mock_service::tps_measure_task(state.clone()));
    mock_service::run(cli.addr, state).await?;

    Ok(())
}
