//! Upstream sources.
//!
//! The [`Source`] trait abstracts where the raw JSON body comes from, allowing
//! the collect cycle to run against the real endpoint ([`HttpSource`]) or an
//! in-memory document ([`StaticSource`]).

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::USER_AGENT;
use reqwest::Client;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::error::CollectError;

/// A producer of raw upstream bodies.
#[async_trait]
pub trait Source: Send + Sync {
    /// Fetches the full upstream body.
    ///
    /// # Errors
    ///
    /// Returns an error if the body cannot be obtained.
    async fn fetch(&self) -> Result<Bytes, CollectError>;

    /// Human-readable description used in logs.
    fn describe(&self) -> &str;
}

/// Fetches a fixed URL with a fixed `User-Agent`.
///
/// The response status is not checked: whatever body arrives is handed to the
/// decoder, which rejects anything that is not a record array.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    url: String,
    user_agent: String,
}

impl HttpSource {
    /// Creates a source for `url`.
    ///
    /// Without a `timeout` a hanging upstream stalls the scrape until the
    /// connection is closed.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built (e.g. TLS backend failure).
    pub fn new(
        url: impl Into<String>,
        user_agent: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            url: url.into(),
            user_agent: user_agent.into(),
        })
    }

    /// The upstream URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Source for HttpSource {
    async fn fetch(&self) -> Result<Bytes, CollectError> {
        let response = self
            .client
            .get(&self.url)
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(|source| CollectError::Transport {
                url: self.url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url = %self.url, %status, "Upstream returned a non-success status");
        }

        let body = response.bytes().await.map_err(CollectError::BodyRead)?;
        tracing::debug!(url = %self.url, %status, bytes = body.len(), "Fetched upstream body");
        Ok(body)
    }

    fn describe(&self) -> &str {
        &self.url
    }
}

/// An in-memory body that can be swapped at runtime.
///
/// Useful for replaying a captured payload and for tests.
#[derive(Debug, Default)]
pub struct StaticSource {
    body: RwLock<Bytes>,
}

impl StaticSource {
    /// Creates a source serving `body`.
    #[must_use]
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self {
            body: RwLock::new(body.into()),
        }
    }

    /// Replaces the served body.
    pub async fn replace(&self, body: impl Into<Bytes>) {
        *self.body.write().await = body.into();
    }
}

#[async_trait]
impl Source for StaticSource {
    async fn fetch(&self) -> Result<Bytes, CollectError> {
        Ok(self.body.read().await.clone())
    }

    fn describe(&self) -> &str {
        "static"
    }
}
