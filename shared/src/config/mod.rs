//! Configuration module for the exporters.
//!
//! This module contains the listen address, the stale series policy and the
//! settings an exporter instance is built from.

pub mod listen;
pub mod stale;

pub use listen::ListenAddress;
pub use stale::StaleSeriesPolicy;

use std::time::Duration;

/// Settings for one exporter instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExporterConfig {
    /// Address the HTTP server binds to.
    pub listen_address: ListenAddress,
    /// The upstream JSON endpoint.
    pub upstream_url: String,
    /// `User-Agent` header sent with every upstream request.
    pub user_agent: String,
    /// Upper bound for one upstream request. `None` waits indefinitely.
    pub fetch_timeout: Option<Duration>,
    /// What happens to series whose record vanished from the upstream payload.
    pub stale_series: StaleSeriesPolicy,
}

impl ExporterConfig {
    /// Creates a configuration with no fetch timeout and the default stale series policy.
    #[must_use]
    pub fn new(
        listen_address: ListenAddress,
        upstream_url: impl Into<String>,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            listen_address,
            upstream_url: upstream_url.into(),
            user_agent: user_agent.into(),
            fetch_timeout: None,
            stale_series: StaleSeriesPolicy::default(),
        }
    }

    /// Sets the fetch timeout.
    #[must_use]
    pub fn with_fetch_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Sets the stale series policy.
    #[must_use]
    pub fn with_stale_series(mut self, policy: StaleSeriesPolicy) -> Self {
        self.stale_series = policy;
        self
    }
}
