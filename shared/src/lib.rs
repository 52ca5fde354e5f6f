//! Covid19 Exporter Shared Library
//!
//! This crate contains everything the per-dataset exporters have in common:
//! fetching the upstream JSON document, decoding it into records, publishing
//! the records as gauge series and serving the result to Prometheus.
//!
//! # Modules
//!
//! - [`dataset`] - The trait describing one upstream schema and its metric families
//! - [`fetch`] - Upstream sources (HTTP and in-memory)
//! - [`decode`] - JSON body decoding
//! - [`numeric`] - Lenient numeric fields and float coercion
//! - [`publish`] - Gauge families backed by an owned Prometheus registry
//! - [`exporter`] - The scrape-driven collect cycle
//! - [`server`] - Axum routes for `/`, `/metrics` and `/health`
//! - [`config`] - Listen address, stale series policy and exporter settings
//!
//! # Example
//!
//! ```
//! use shared::config::StaleSeriesPolicy;
//!
//! let policy: StaleSeriesPolicy = "prune".parse().unwrap();
//! assert_eq!(policy, StaleSeriesPolicy::Prune);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod dataset;
pub mod decode;
pub mod error;
pub mod exporter;
pub mod fetch;
pub mod numeric;
pub mod publish;
pub mod server;

pub use dataset::{Dataset, Family};
pub use error::{CoercionError, CollectError, ConfigError};
pub use exporter::{CollectReport, Exporter, Scrape};

/// Re-export common dependencies for convenience.
pub use prometheus;
pub use serde;
pub use serde_json;
