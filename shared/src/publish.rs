//! Gauge publishing.
//!
//! [`GaugePublisher`] owns a dedicated Prometheus [`Registry`] containing only
//! the dataset's gauge families. Nothing is registered with the process-wide
//! default registry, so the exposition output carries exactly these families.

use prometheus::core::Collector;
use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};

use crate::dataset::Family;

/// Content type of the text exposition format.
pub const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Gauge families sharing one label set, backed by an owned registry.
pub struct GaugePublisher {
    registry: Registry,
    families: Vec<(Family, GaugeVec)>,
}

impl GaugePublisher {
    /// Creates and registers one gauge family per entry in `families`.
    ///
    /// # Errors
    ///
    /// Returns an error if a name or label is invalid or two families share a name.
    pub fn new(
        namespace: &str,
        label_names: &[&str],
        families: &[Family],
    ) -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let mut gauges = Vec::with_capacity(families.len());

        for family in families {
            let gauge = GaugeVec::new(
                Opts::new(family.name, family.help).namespace(namespace),
                label_names,
            )?;
            registry.register(Box::new(gauge.clone()))?;
            gauges.push((*family, gauge));
        }

        Ok(Self {
            registry,
            families: gauges,
        })
    }

    /// Sets one series per family for the given label tuple.
    ///
    /// Values are matched to families by position; an existing series with the
    /// same label tuple is overwritten.
    ///
    /// # Errors
    ///
    /// Returns an error if the number of label values does not match the label names.
    pub fn publish(&mut self, labels: &[&str], values: &[f64]) -> Result<(), prometheus::Error> {
        for ((_, gauge), value) in self.families.iter().zip(values) {
            gauge.get_metric_with_label_values(labels)?.set(*value);
        }
        Ok(())
    }

    /// Drops every series from every family.
    pub fn reset(&mut self) {
        for (_, gauge) in &self.families {
            gauge.reset();
        }
    }

    /// Number of distinct label tuples currently held.
    ///
    /// Every family holds the same tuples, so the first one is counted.
    #[must_use]
    pub fn series_count(&self) -> usize {
        self.families
            .first()
            .map_or(0, |(_, gauge)| held_series(gauge))
    }

    /// Current value of a series, if it exists.
    #[must_use]
    pub fn value(&self, family: &str, labels: &[&str]) -> Option<f64> {
        let (_, gauge) = self.families.iter().find(|(f, _)| f.name == family)?;

        // Lookup creates missing children; undo that so reads never add series
        let before = held_series(gauge);
        let value = gauge.get_metric_with_label_values(labels).ok()?.get();
        if held_series(gauge) > before {
            let _ = gauge.remove_label_values(labels);
            return None;
        }
        Some(value)
    }

    /// The registry holding this publisher's families.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Serializes every held series in the text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

fn held_series(gauge: &GaugeVec) -> usize {
    gauge.collect().iter().map(|family| family.metric.len()).sum()
}
