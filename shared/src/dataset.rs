//! Dataset description.
//!
//! A [`Dataset`] ties an upstream record schema to the gauge families it is
//! published as. Each exporter binary provides exactly one implementation.

use serde::de::DeserializeOwned;

use crate::error::CoercionError;

/// One gauge family: its name (without namespace) and help text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Family {
    /// Metric name, joined to the namespace with `_`.
    pub name: &'static str,
    /// Help text emitted in the exposition output.
    pub help: &'static str,
}

impl Family {
    /// Creates a family description.
    #[must_use]
    pub const fn new(name: &'static str, help: &'static str) -> Self {
        Self { name, help }
    }
}

/// An upstream schema and the gauge families its records feed.
pub trait Dataset: Send + Sync + 'static {
    /// One element of the upstream JSON array.
    type Record: DeserializeOwned + Send;

    /// Metric namespace shared by all families.
    const NAMESPACE: &'static str;

    /// Label names, in the order [`label_values`](Self::label_values) yields them.
    const LABEL_NAMES: &'static [&'static str];

    /// Gauge families, in the order [`measurements`](Self::measurements) yields them.
    const FAMILIES: &'static [Family];

    /// Label values identifying the record's series, copied verbatim.
    fn label_values(record: &Self::Record) -> Vec<&str>;

    /// One value per family.
    ///
    /// # Errors
    ///
    /// Returns a [`CoercionError`] if a text-encoded measurement is not numeric.
    fn measurements(record: &Self::Record) -> Result<Vec<f64>, CoercionError>;
}
