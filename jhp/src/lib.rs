//! Johns Hopkins Covid19 Exporter
//!
//! Republishes the global per-location case and death counts of the Johns
//! Hopkins CSSE dataset as Prometheus gauges.
//!
//! Each scrape of `/metrics` fetches the upstream JSON array, converts the
//! text-encoded counts to floats and sets one `covid19JHP_confirmed_cases` and
//! one `covid19JHP_deaths` series per location.
//!
//! # Example
//!
//! ```no_run
//! use shared::config::{ExporterConfig, ListenAddress};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ExporterConfig::new(
//!         ListenAddress::any(jhp::DEFAULT_PORT),
//!         jhp::UPSTREAM_URL,
//!         jhp::USER_AGENT,
//!     );
//!     jhp::run(&config).await
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use anyhow::Result;
use serde::Deserialize;
use shared::config::ExporterConfig;
use shared::decode::{null_as_default, null_as_empty};
use shared::fetch::HttpSource;
use shared::numeric::NumericText;
use shared::server::{AppState, LandingPage};
use shared::{CoercionError, Dataset, Exporter, Family};
use std::sync::Arc;

/// Upstream endpoint serving the dataset.
pub const UPSTREAM_URL: &str = "https://corona.lmao.ninja/jhucsse";

/// `User-Agent` sent to the upstream.
pub const USER_AGENT: &str = "Covid19 stats prometheus exporter";

/// Default listen address.
pub const DEFAULT_LISTEN_ADDRESS: &str = ":9679";

/// Port of [`DEFAULT_LISTEN_ADDRESS`].
pub const DEFAULT_PORT: u16 = 9679;

/// Service name reported by `/health`.
pub const SERVICE_NAME: &str = "covid19-jhp-exporter";

/// Landing page served on `/`.
pub const LANDING_PAGE: LandingPage = LandingPage {
    title: "Covid19 Data Prometheus Exporter from John Hopkins data",
    heading: "Covid19 data Prometheus Exporter",
};

/// Case and death counts for one location.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LocationRecord {
    /// Country or region.
    #[serde(deserialize_with = "null_as_empty")]
    pub country: String,
    /// Province or state, empty for country-level rows.
    #[serde(deserialize_with = "null_as_empty")]
    pub province: String,
    /// City or county, empty above that level.
    #[serde(deserialize_with = "null_as_empty")]
    pub city: String,
    /// Upstream update timestamp, as text.
    #[serde(rename = "updatedAt", deserialize_with = "null_as_empty")]
    pub updated_at: String,
    /// Counts. `null` reads as all-empty, which fails coercion.
    #[serde(deserialize_with = "null_as_default")]
    pub stats: Stats,
    /// Location of the row. `null` reads as empty labels.
    #[serde(deserialize_with = "null_as_default")]
    pub coordinates: Coordinates,
}

/// Counts reported for a location.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Stats {
    /// Confirmed cases.
    pub confirmed: NumericText,
    /// Deaths.
    pub deaths: NumericText,
    /// Recoveries. Not published.
    pub recovered: NumericText,
}

/// Latitude and longitude, kept verbatim for use as labels.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Coordinates {
    /// Latitude.
    pub latitude: NumericText,
    /// Longitude.
    pub longitude: NumericText,
}

/// The global per-location dataset.
pub struct JhpDataset;

impl Dataset for JhpDataset {
    type Record = LocationRecord;

    const NAMESPACE: &'static str = "covid19JHP";
    const LABEL_NAMES: &'static [&'static str] =
        &["country", "province", "city", "latitude", "longitude"];
    const FAMILIES: &'static [Family] = &[
        Family::new("confirmed_cases", "John Hopkins data confirmed cases"),
        Family::new("deaths", "John Hopkins data confirmed deaths"),
    ];

    fn label_values(record: &LocationRecord) -> Vec<&str> {
        vec![
            record.country.as_str(),
            record.province.as_str(),
            record.city.as_str(),
            record.coordinates.latitude.as_str(),
            record.coordinates.longitude.as_str(),
        ]
    }

    fn measurements(record: &LocationRecord) -> Result<Vec<f64>, CoercionError> {
        Ok(vec![
            record.stats.confirmed.to_f64("stats.confirmed")?,
            record.stats.deaths.to_f64("stats.deaths")?,
        ])
    }
}

/// Builds the route state for `config`.
///
/// # Errors
///
/// Returns an error if the HTTP client or the gauge families cannot be created.
pub fn app_state(config: &ExporterConfig) -> Result<AppState> {
    let source = HttpSource::new(
        config.upstream_url.clone(),
        config.user_agent.clone(),
        config.fetch_timeout,
    )?;
    let exporter = Exporter::<JhpDataset>::new(Arc::new(source), config.stale_series)?;
    Ok(AppState::new(Arc::new(exporter), LANDING_PAGE, SERVICE_NAME))
}

/// Serves the exporter until shutdown.
///
/// # Errors
///
/// Returns an error if the exporter cannot be built or the server fails.
pub async fn run(config: &ExporterConfig) -> Result<()> {
    tracing::info!(
        upstream = %config.upstream_url,
        stale_series = %config.stale_series,
        "Covid19 JHP exporter starting"
    );

    let state = app_state(config)?;
    shared::server::run_server(&config.listen_address, state).await
}
