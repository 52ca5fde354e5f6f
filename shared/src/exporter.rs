//! The scrape-driven collect cycle.
//!
//! Every scrape runs fetch, decode and publish, then encodes the registry, all
//! while holding one lock. Concurrent scrapes are serialized, so a fetch from one
//! request never interleaves with a publish or encode from another.

use async_trait::async_trait;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::StaleSeriesPolicy;
use crate::dataset::Dataset;
use crate::decode::decode_records;
use crate::error::CollectError;
use crate::fetch::Source;
use crate::publish::GaugePublisher;

/// Outcome of a successful collect cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectReport {
    /// Records decoded from the upstream body.
    pub records: usize,
    /// Records whose values were written to the gauges.
    pub published: usize,
    /// Records skipped because a measurement was not numeric.
    pub skipped: usize,
}

/// Something that can produce exposition text on demand.
#[async_trait]
pub trait Scrape: Send + Sync {
    /// Runs one collect cycle and returns the encoded registry.
    ///
    /// # Errors
    ///
    /// Returns an error if the upstream body cannot be fetched or decoded, or
    /// the registry cannot be encoded.
    async fn scrape(&self) -> Result<String, CollectError>;
}

/// Collect cycle for one dataset.
pub struct Exporter<D: Dataset> {
    source: Arc<dyn Source>,
    policy: StaleSeriesPolicy,
    publisher: Mutex<GaugePublisher>,
    _dataset: PhantomData<fn() -> D>,
}

impl<D: Dataset> Exporter<D> {
    /// Creates an exporter with its own registry.
    ///
    /// # Errors
    ///
    /// Returns an error if the dataset's families cannot be registered.
    pub fn new(
        source: Arc<dyn Source>,
        policy: StaleSeriesPolicy,
    ) -> Result<Self, prometheus::Error> {
        let publisher = GaugePublisher::new(D::NAMESPACE, D::LABEL_NAMES, D::FAMILIES)?;
        Ok(Self {
            source,
            policy,
            publisher: Mutex::new(publisher),
            _dataset: PhantomData,
        })
    }

    /// The configured stale series policy.
    #[must_use]
    pub fn policy(&self) -> StaleSeriesPolicy {
        self.policy
    }

    /// Runs one collect cycle without encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if the upstream body cannot be fetched or decoded. The
    /// registry is left untouched in that case.
    pub async fn collect(&self) -> Result<CollectReport, CollectError> {
        let mut publisher = self.publisher.lock().await;
        self.collect_locked(&mut publisher).await
    }

    /// Number of label tuples currently held.
    pub async fn series_count(&self) -> usize {
        self.publisher.lock().await.series_count()
    }

    /// Current value of one series.
    pub async fn value(&self, family: &str, labels: &[&str]) -> Option<f64> {
        self.publisher.lock().await.value(family, labels)
    }

    async fn collect_locked(
        &self,
        publisher: &mut GaugePublisher,
    ) -> Result<CollectReport, CollectError> {
        let body = self.source.fetch().await?;
        let records = decode_records::<D::Record>(&body)?;

        if self.policy.prunes() {
            publisher.reset();
        }

        let mut report = CollectReport {
            records: records.len(),
            ..CollectReport::default()
        };

        for record in &records {
            let labels = D::label_values(record);
            match D::measurements(record) {
                Ok(values) => {
                    publisher.publish(&labels, &values)?;
                    report.published += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        namespace = D::NAMESPACE,
                        labels = ?labels,
                        error = %e,
                        "Skipping record with non-numeric measurement"
                    );
                    report.skipped += 1;
                }
            }
        }

        tracing::debug!(
            namespace = D::NAMESPACE,
            source = self.source.describe(),
            records = report.records,
            published = report.published,
            skipped = report.skipped,
            "Collect cycle complete"
        );

        Ok(report)
    }
}

#[async_trait]
impl<D: Dataset> Scrape for Exporter<D> {
    async fn scrape(&self) -> Result<String, CollectError> {
        let mut publisher = self.publisher.lock().await;
        self.collect_locked(&mut publisher).await?;
        Ok(publisher.encode()?)
    }
}
