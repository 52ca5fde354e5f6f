//! Error types for the collect cycle and configuration parsing.

use thiserror::Error;

/// Errors that abort a single collect cycle.
///
/// None of these terminate the process: the scrape that hit them fails and the
/// registry keeps whatever series it held before the cycle started.
#[derive(Debug, Error)]
pub enum CollectError {
    /// The upstream request could not be sent or no response arrived.
    #[error("Upstream request to {url} failed: {source}")]
    Transport {
        /// The URL that was requested.
        url: String,
        /// The underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// A response arrived but its body could not be read.
    #[error("Failed to read upstream response body: {0}")]
    BodyRead(#[source] reqwest::Error),

    /// The body is not a JSON array of records.
    #[error("Upstream payload could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),

    /// The registry rejected an update or could not be encoded.
    #[error("Metrics registry error: {0}")]
    Registry(#[from] prometheus::Error),
}

/// A text-encoded numeric field that does not hold a number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Field '{field}' is not numeric: {raw:?}")]
pub struct CoercionError {
    /// Name of the offending field in the upstream schema.
    pub field: &'static str,
    /// The raw text that failed to parse.
    pub raw: String,
}

/// Errors raised while parsing exporter configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The listen address is not `host:port` or `:port`.
    #[error("Invalid listen address: '{0}'")]
    InvalidListenAddress(String),

    /// Unknown stale series policy name.
    #[error("Invalid stale series policy '{0}' (expected 'retain' or 'prune')")]
    InvalidStalePolicy(String),
}
