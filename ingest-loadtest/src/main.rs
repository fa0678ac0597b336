use anyhow::Context;
use clap::Parser;
use ingest_loadtest::{loadtest, OPTIONS, TARGET_URL};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use vuload::prelude::*;

#[derive(Parser, Debug)]
#[command(version, about = "Post analytics events to the ingestion proxy under load")]
struct Cli {
    /// Number of virtual users (default from the scenario options).
    #[arg(long, env = "LOADTEST_VUS")]
    vus: Option<usize>,

    /// Length of the run, e.g. `30s` or `2m` (default from the scenario options).
    #[arg(long, env = "LOADTEST_DURATION", value_parser = humantime::parse_duration)]
    duration: Option<Duration>,

    /// How long in-flight iterations may finish after the duration has elapsed.
    #[arg(long, env = "LOADTEST_GRACEFUL_STOP", value_parser = humantime::parse_duration)]
    graceful_stop: Option<Duration>,

    /// Expose run metrics for Prometheus on this address.
    #[arg(long, env = "LOADTEST_METRICS_ADDR")]
    metrics_addr: Option<SocketAddr>,

    /// Write the end-of-run summary as JSON to this file.
    #[arg(long, env = "LOADTEST_SUMMARY_EXPORT")]
    summary_export: Option<PathBuf>,
}

impl Cli {
    fn options(&self) -> Options {
        Options {
            vus: self.vus.unwrap_or(OPTIONS.vus),
            duration: self.duration.unwrap_or(OPTIONS.duration),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("vuload=info,ingest_loadtest=info")),
        )
        .init();

    run(Cli::parse()).await
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Some(addr) = cli.metrics_addr {
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("failed to install Prometheus exporter")?;
        info!("Serving metrics on {addr}");
    }

    let options = cli.options();
    info!("Target {TARGET_URL}, {options}");

    let mut scenario = loadtest().options(options);
    if let Some(graceful_stop) = cli.graceful_stop {
        scenario = scenario.graceful_stop(graceful_stop);
    }
    let stats = scenario.await?;

    println!("{stats}");

    if let Some(path) = &cli.summary_export {
        let json = serde_json::to_vec_pretty(&stats)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write summary to {}", path.display()))?;
    }

    Ok(())
}
