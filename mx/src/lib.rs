//! Mexico Covid19 Exporter
//!
//! Republishes the per-case records of the Mexican Covid19 dataset as
//! Prometheus gauges: `covid19MX_caseID` holds the case number and
//! `covid19MX_Age` the patient's age, both labeled by state, sex, symptom
//! onset date, origin and arrival date.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use anyhow::Result;
use serde::Deserialize;
use shared::config::ExporterConfig;
use shared::decode::null_as_empty;
use shared::fetch::HttpSource;
use shared::numeric::NumericText;
use shared::server::{AppState, LandingPage};
use shared::{CoercionError, Dataset, Exporter, Family};
use std::sync::Arc;

/// Upstream endpoint serving the latest snapshot of the dataset.
pub const UPSTREAM_URL: &str = "https://bridge.buddyweb.fr/api/covd19mx/latest";

/// `User-Agent` sent to the upstream.
pub const USER_AGENT: &str = "Covid19MX stats prometheus exporter";

/// Default listen address.
pub const DEFAULT_LISTEN_ADDRESS: &str = ":9677";

/// Service name reported by `/health`.
pub const SERVICE_NAME: &str = "covid19-mx-exporter";

/// Landing page served on `/`.
pub const LANDING_PAGE: LandingPage = LandingPage {
    title: "Covid19 Mexico only data Prometheus Exporter",
    heading: "Covid19 Mexico only data - Prometheus Exporter",
};

/// One confirmed case.
///
/// Absent or `null` numbers read as zero, absent or `null` text as empty.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CaseRecord {
    /// Case number.
    #[serde(rename = "n0_caso")]
    pub case_id: NumericText,
    /// State.
    #[serde(rename = "estado", deserialize_with = "null_as_empty")]
    pub state: String,
    /// Sex.
    #[serde(rename = "sexo", deserialize_with = "null_as_empty")]
    pub sex: String,
    /// Age in years.
    #[serde(rename = "edad")]
    pub age: NumericText,
    /// Date symptoms started.
    #[serde(
        rename = "fecha_de_inicio_de_sintomas",
        deserialize_with = "null_as_empty"
    )]
    pub symptoms_started: String,
    /// RT-PCR identification result. Not published.
    #[serde(
        rename = "identificacion_de_covid_19_por_rt_pcrsecuencia_de_dna",
        deserialize_with = "null_as_empty"
    )]
    pub rt_pcr_identification: String,
    /// Country the patient arrived from.
    #[serde(rename = "procedencia", deserialize_with = "null_as_empty")]
    pub arrived_from: String,
    /// Date the patient arrived in Mexico.
    #[serde(rename = "fecha_del_llegada_a_mexico", deserialize_with = "null_as_empty")]
    pub entry_to_mx: String,
}

/// The Mexican per-case dataset.
pub struct MxDataset;

impl Dataset for MxDataset {
    type Record = CaseRecord;

    const NAMESPACE: &'static str = "covid19MX";
    const LABEL_NAMES: &'static [&'static str] = &[
        "state",
        "sex",
        "date_sintoms_started",
        "arrived_from",
        "entry_to_mx_date",
    ];
    const FAMILIES: &'static [Family] = &[
        Family::new("caseID", "CaseID"),
        Family::new("Age", "Person Age"),
    ];

    fn label_values(record: &CaseRecord) -> Vec<&str> {
        vec![
            record.state.as_str(),
            record.sex.as_str(),
            record.symptoms_started.as_str(),
            record.arrived_from.as_str(),
            record.entry_to_mx.as_str(),
        ]
    }

    fn measurements(record: &CaseRecord) -> Result<Vec<f64>, CoercionError> {
        Ok(vec![
            record.case_id.to_f64_or_zero("n0_caso")?,
            record.age.to_f64_or_zero("edad")?,
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
    let exporter = Exporter::<MxDataset>::new(Arc::new(source), config.stale_series)?;
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
        "Covid19 MX exporter starting"
    );

    let state = app_state(config)?;
    shared::server::run_server(&config.listen_address, state).await
}
