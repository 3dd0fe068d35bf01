//! API client.
//!
//! This module provides:
//! - Client configuration ([`ClientConfig`], [`Callbacks`])
//! - API version validation ([`ApiVersion`])
//! - The [`Client`] entry point and its retrying request executor

mod config;
mod executor;
mod version;

#[cfg(test)]
mod config_tests;
#[cfg(test)]
mod executor_tests;

use std::sync::Arc;

use http::HeaderMap;
use http::header::{AUTHORIZATION, HeaderValue, USER_AGENT};
use url::Url;

use crate::Error;
use crate::documents::GetDocumentsBuilder;
use crate::mutation::MutationBuilder;
use crate::query::QueryBuilder;
use crate::time::TokioSleeper;
use crate::transport::{ReqwestClient, RequestBuilder};

pub use config::{
    API_CDN_HOST, API_HOST, Callbacks, ClientConfig, DEFAULT_DATASET, QueryResultCallback,
    RetryCallback,
};
pub use version::{ApiVersion, validate as validate_version};

/// Client for the document store API.
///
/// Cheap to clone; clones share the same read-only configuration and
/// HTTP client, so they can be used from concurrent tasks.
///
/// # Type Parameters
///
/// - `H`: The HTTP client implementation (defaults to [`ReqwestClient`])
/// - `S`: The sleeper used between retries (defaults to [`TokioSleeper`])
///
/// # Example
///
/// ```no_run
/// use sanity_client::client::{Client, ClientConfig};
///
/// # async fn example() -> Result<(), sanity_client::Error> {
/// let client = Client::new(ClientConfig::new("abc123", "production").with_cdn(true))?;
///
/// let result = client
///     .query("*[_type == $type][0...10]")
///     .param("type", "movie")
///     .execute()
///     .await?;
///
/// let movies: Vec<serde_json::Value> = result.unmarshal()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Client<H = ReqwestClient, S = TokioSleeper> {
    inner: Arc<Inner<H, S>>,
}

#[derive(Debug)]
struct Inner<H, S> {
    config: ClientConfig,
    api_url: Url,
    query_url: Url,
    default_headers: HeaderMap,
    http: Arc<H>,
    sleeper: Arc<S>,
}

impl<H, S> Clone for Client<H, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Client<ReqwestClient, TokioSleeper> {
    /// Creates a client using the default reqwest HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the configuration is invalid.
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        Self::from_parts(config, ReqwestClient::new(), TokioSleeper)
    }
}

impl<H> Client<H, TokioSleeper> {
    /// Creates a client using a custom HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the configuration is invalid.
    pub fn with_http_client(config: ClientConfig, http: H) -> Result<Self, Error> {
        Self::from_parts(config, http, TokioSleeper)
    }
}

impl<H, S> Client<H, S> {
    /// Creates a client from all of its parts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the configuration is invalid.
    pub fn from_parts(config: ClientConfig, http: H, sleeper: S) -> Result<Self, Error> {
        Self::assemble(config, Arc::new(http), Arc::new(sleeper))
    }

    fn assemble(config: ClientConfig, http: Arc<H>, sleeper: Arc<S>) -> Result<Self, Error> {
        config.validate()?;

        let api_url = config.api_url()?;
        let query_url = config.query_url()?;
        let default_headers = default_headers(&config)?;

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                api_url,
                query_url,
                default_headers,
                http,
                sleeper,
            }),
        })
    }

    /// Replaces the sleeper used between retries.
    ///
    /// This is primarily useful for testing to avoid actual delays.
    #[must_use]
    pub fn with_sleeper<S2>(self, sleeper: S2) -> Client<H, S2> {
        Client {
            inner: Arc::new(Inner {
                config: self.inner.config.clone(),
                api_url: self.inner.api_url.clone(),
                query_url: self.inner.query_url.clone(),
                default_headers: self.inner.default_headers.clone(),
                http: Arc::clone(&self.inner.http),
                sleeper: Arc::new(sleeper),
            }),
        }
    }

    /// Derives a new client with a modified copy of this configuration.
    ///
    /// The original client is unchanged. Both share the HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the modified configuration is invalid.
    pub fn reconfigure(&self, f: impl FnOnce(&mut ClientConfig)) -> Result<Self, Error> {
        let mut config = self.inner.config.clone();
        f(&mut config);
        Self::assemble(
            config,
            Arc::clone(&self.inner.http),
            Arc::clone(&self.inner.sleeper),
        )
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Returns the dataset name.
    #[must_use]
    pub fn dataset(&self) -> &str {
        &self.inner.config.dataset
    }

    /// Base URL for mutations and document fetches.
    #[must_use]
    pub fn api_url(&self) -> &Url {
        &self.inner.api_url
    }

    /// Base URL for queries.
    #[must_use]
    pub fn query_url(&self) -> &Url {
        &self.inner.query_url
    }

    /// Starts a query.
    #[must_use]
    pub fn query(&self, query: impl Into<String>) -> QueryBuilder<'_, H, S> {
        QueryBuilder::new(self, query.into())
    }

    /// Starts a batch of mutations.
    #[must_use]
    pub fn mutate(&self) -> MutationBuilder<'_, H, S> {
        MutationBuilder::new(self)
    }

    /// Starts a fetch of documents by ID.
    #[must_use]
    pub fn get_documents<I, T>(&self, ids: I) -> GetDocumentsBuilder<'_, H, S>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        GetDocumentsBuilder::new(self, ids.into_iter().map(Into::into).collect())
    }

    /// New request against the API host.
    pub(crate) fn new_api_request(&self) -> RequestBuilder {
        RequestBuilder::new(self.inner.api_url.clone()).headers(&self.inner.default_headers)
    }

    /// New request against the query host.
    pub(crate) fn new_query_request(&self) -> RequestBuilder {
        RequestBuilder::new(self.inner.query_url.clone()).headers(&self.inner.default_headers)
    }
}

fn default_headers(config: &ClientConfig) -> Result<HeaderMap, Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(concat!("sanity-client-rust/", env!("CARGO_PKG_VERSION"))),
    );

    if let Some(authorization) = config.authorization()? {
        headers.insert(AUTHORIZATION, authorization);
    }

    for (name, value) in &config.headers {
        headers.append(name, value.clone());
    }

    Ok(headers)
}
