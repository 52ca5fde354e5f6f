//! Johns Hopkins Covid19 Exporter Binary
//!
//! # Usage
//!
//! ```bash
//! covid19-jhp-exporter --listen-address :9679
//! covid19-jhp-exporter --stale-series prune --fetch-timeout-secs 20
//! ```

#![deny(unsafe_code)]

use clap::Parser;
use shared::config::{ExporterConfig, ListenAddress, StaleSeriesPolicy};
use std::time::Duration;

/// Prometheus exporter for the Johns Hopkins global Covid19 dataset
#[derive(Parser)]
#[command(name = "covid19-jhp-exporter")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Prometheus exporter will use this address
    #[arg(
        long,
        env = "COVID19_JHP_LISTEN_ADDRESS",
        default_value = jhp::DEFAULT_LISTEN_ADDRESS
    )]
    listen_address: ListenAddress,

    /// Upstream JSON endpoint
    #[arg(long, env = "COVID19_JHP_UPSTREAM_URL", default_value = jhp::UPSTREAM_URL)]
    upstream_url: String,

    /// Keep (retain) or drop (prune) series missing from the latest payload
    #[arg(long, env = "COVID19_JHP_STALE_SERIES", default_value = "retain")]
    stale_series: StaleSeriesPolicy,

    /// Abort upstream requests after this many seconds (default: wait indefinitely)
    #[arg(long, env = "COVID19_JHP_FETCH_TIMEOUT_SECS")]
    fetch_timeout_secs: Option<u64>,
}

impl Cli {
    fn into_config(self) -> ExporterConfig {
        ExporterConfig::new(self.listen_address, self.upstream_url, jhp::USER_AGENT)
            .with_fetch_timeout(self.fetch_timeout_secs.map(Duration::from_secs))
            .with_stale_series(self.stale_series)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().into_config();
    jhp::run(&config).await
}
