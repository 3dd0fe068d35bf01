//! Client configuration.

use std::fmt;
use std::sync::Arc;

use http::header::{HeaderName, HeaderValue};
use http::HeaderMap;
use url::Url;

use super::ApiVersion;
use crate::error::RequestError;
use crate::query::QueryResult;
use crate::transport::BackoffPolicy;
use crate::Error;

/// Default dataset name for projects.
pub const DEFAULT_DATASET: &str = "production";

/// API host used when the CDN is disabled.
pub const API_HOST: &str = "api.sanity.io";

/// API host that serves queries through the CDN.
pub const API_CDN_HOST: &str = "apicdn.sanity.io";

/// Callback invoked after every successful query.
pub type QueryResultCallback = Arc<dyn Fn(&QueryResult) + Send + Sync>;

/// Callback invoked before the executor sleeps and retries.
pub type RetryCallback = Arc<dyn Fn(&RequestError) + Send + Sync>;

/// Optional event hooks.
#[derive(Clone, Default)]
pub struct Callbacks {
    /// Called with each query result.
    pub on_query_result: Option<QueryResultCallback>,

    /// Called with the retriable error that is about to be retried.
    pub on_error_will_retry: Option<RetryCallback>,
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_query_result", &self.on_query_result.is_some())
            .field("on_error_will_retry", &self.on_error_will_retry.is_some())
            .finish()
    }
}

/// Settings for a [`Client`](super::Client).
///
/// A plain value: build it with the `with_*` methods, then hand it to the
/// client, which validates it once and never mutates it afterwards.
///
/// # Example
///
/// ```
/// use sanity_client::client::{ApiVersion, ClientConfig};
///
/// let config = ClientConfig::new("abc123", "production")
///     .with_api_version(ApiVersion::parse("2021-03-25").unwrap())
///     .with_cdn(true)
///     .with_token("secret");
///
/// assert!(config.validate().is_ok());
/// assert_eq!(
///     config.query_url().unwrap().as_str(),
///     "https://abc123.apicdn.sanity.io/v2021-03-25"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Project ID (required).
    pub project_id: String,

    /// Dataset name (required).
    pub dataset: String,

    /// API version.
    pub api_version: ApiVersion,

    /// Route queries through the CDN. Ignored when `api_host` is set.
    pub use_cdn: bool,

    /// Custom scheme, host and port replacing the default API hosts.
    pub api_host: Option<Url>,

    /// API token sent as a bearer token.
    pub token: Option<String>,

    /// Extra headers added to every request.
    pub headers: HeaderMap,

    /// Default request tag.
    pub tag: Option<String>,

    /// Backoff used for retriable responses.
    pub backoff: BackoffPolicy,

    /// Event hooks.
    pub callbacks: Callbacks,
}

impl ClientConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new(project_id: impl Into<String>, dataset: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            dataset: dataset.into(),
            api_version: ApiVersion::default(),
            use_cdn: false,
            api_host: None,
            token: None,
            headers: HeaderMap::new(),
            tag: None,
            backoff: BackoffPolicy::default(),
            callbacks: Callbacks::default(),
        }
    }

    /// Sets the API version.
    #[must_use]
    pub fn with_api_version(mut self, version: ApiVersion) -> Self {
        self.api_version = version;
        self
    }

    /// Enables or disables the API CDN for queries.
    #[must_use]
    pub const fn with_cdn(mut self, use_cdn: bool) -> Self {
        self.use_cdn = use_cdn;
        self
    }

    /// Sends all requests to a custom host.
    ///
    /// Only the scheme, host and port of `host` are used.
    #[must_use]
    pub fn with_api_host(mut self, host: Url) -> Self {
        self.api_host = Some(host);
        self
    }

    /// Sets the API token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Adds a header sent with every request.
    ///
    /// Values accumulate; a header that is also set by the client (such as
    /// `Accept`) is sent with both values.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Sets the default request tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Sets the backoff policy.
    ///
    /// Build the policy with [`BackoffPolicy`]'s `with_*` setters. They panic
    /// when given a factor that is not positive and finite, or a `max_attempts`
    /// of 0. Validate untrusted input before calling them, as the `sanity`
    /// config loader does.
    #[must_use]
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Registers a callback run after each successful query.
    #[must_use]
    pub fn on_query_result(mut self, f: impl Fn(&QueryResult) + Send + Sync + 'static) -> Self {
        self.callbacks.on_query_result = Some(Arc::new(f));
        self
    }

    /// Registers a callback run before each retry.
    #[must_use]
    pub fn on_error_will_retry(
        mut self,
        f: impl Fn(&RequestError) + Send + Sync + 'static,
    ) -> Self {
        self.callbacks.on_error_will_retry = Some(Arc::new(f));
        self
    }

    /// Checks that the configuration can produce requests.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the project ID or dataset is empty,
    /// the token is not a valid header value, or the URLs cannot be built.
    pub fn validate(&self) -> Result<(), Error> {
        if self.project_id.is_empty() {
            return Err(Error::validation("project ID cannot be empty"));
        }

        if self.dataset.is_empty() {
            return Err(Error::validation("dataset must be set"));
        }

        self.authorization()?;
        self.api_url()?;
        self.query_url()?;
        Ok(())
    }

    /// Base URL for mutations and document fetches.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the URL is malformed.
    pub fn api_url(&self) -> Result<Url, Error> {
        self.base_url(API_HOST)
    }

    /// Base URL for queries; the CDN host when enabled.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the URL is malformed.
    pub fn query_url(&self) -> Result<Url, Error> {
        if self.use_cdn {
            self.base_url(API_CDN_HOST)
        } else {
            self.base_url(API_HOST)
        }
    }

    /// The `Authorization` header value, if a token is configured.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the token contains invalid characters.
    pub fn authorization(&self) -> Result<Option<HeaderValue>, Error> {
        let Some(token) = self.token.as_deref().filter(|t| !t.is_empty()) else {
            return Ok(None);
        };

        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| Error::validation("token contains invalid header characters"))?;
        value.set_sensitive(true);
        Ok(Some(value))
    }

    fn base_url(&self, default_host: &str) -> Result<Url, Error> {
        let prefix = self.api_version.path_prefix();

        let mut url = match &self.api_host {
            Some(host) => {
                if host.host_str().is_none() {
                    return Err(Error::validation(format!("API host {host} has no host name")));
                }
                host.clone()
            }
            None => {
                let raw = format!("https://{}.{default_host}", self.project_id);
                Url::parse(&raw)
                    .map_err(|e| Error::validation(format!("invalid project ID: {e}")))?
            }
        };

        url.set_path(&prefix);
        url.set_query(None);
        url.set_fragment(None);
        Ok(url)
    }
}
