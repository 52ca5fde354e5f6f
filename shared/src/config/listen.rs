//! Listen address parsing.
//!
//! Accepts `host:port`, `[v6]:port` and the bare `:port` form, where an empty
//! host means every interface.

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

const ANY_HOST: &str = "0.0.0.0";

/// Address the exporter's HTTP server binds to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenAddress {
    host: String,
    port: u16,
}

impl ListenAddress {
    /// Creates an address for the given host and port.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Creates an address bound to every interface.
    #[must_use]
    pub fn any(port: u16) -> Self {
        Self::new(ANY_HOST, port)
    }

    /// The host part, without brackets for IPv6 literals.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for ListenAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl FromStr for ListenAddress {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidListenAddress(s.to_string());
        let trimmed = s.trim();

        let (host, port) = trimmed.rsplit_once(':').ok_or_else(invalid)?;
        let port = port.parse::<u16>().map_err(|_| invalid())?;

        let host = if let Some(inner) = host.strip_prefix('[') {
            inner.strip_suffix(']').ok_or_else(invalid)?
        } else if host.contains(':') {
            // Unbracketed IPv6 literal
            return Err(invalid());
        } else {
            host
        };

        if host.is_empty() {
            Ok(Self::any(port))
        } else {
            Ok(Self::new(host, port))
        }
    }
}
