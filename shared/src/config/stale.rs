//! Stale series policy.
//!
//! Decides what happens to a gauge series once the record that produced it no
//! longer appears in the upstream payload.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Treatment of series whose label tuple is absent from the latest payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaleSeriesPolicy {
    /// Keep the last known value until the process restarts.
    #[default]
    Retain,
    /// Drop every series not present in the latest successful payload.
    Prune,
}

impl StaleSeriesPolicy {
    /// Returns the lowercase name used on the command line.
    ///
    /// # Examples
    ///
    /// ```
    /// use shared::config::StaleSeriesPolicy;
    ///
    /// assert_eq!(StaleSeriesPolicy::Retain.as_str(), "retain");
    /// ```
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Retain => "retain",
            Self::Prune => "prune",
        }
    }

    /// Returns true if series are reset before each publish.
    #[must_use]
    pub fn prunes(&self) -> bool {
        matches!(self, Self::Prune)
    }
}

impl fmt::Display for StaleSeriesPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StaleSeriesPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "retain" => Ok(Self::Retain),
            "prune" => Ok(Self::Prune),
            _ => Err(ConfigError::InvalidStalePolicy(s.to_string())),
        }
    }
}
