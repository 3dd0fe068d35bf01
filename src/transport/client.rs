//! `HttpClient` implementation over reqwest.

use super::{HttpClient, HttpError, HttpRequest, HttpResponse};

/// Default transport for [`Client`](crate::Client), backed by `reqwest`.
///
/// Every response, whatever its status, comes back as an [`HttpResponse`];
/// only failures to get a response at all become [`HttpError`]s.
///
/// ```no_run
/// use sanity_client::transport::{HttpClient, HttpRequest, ReqwestClient};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let url = url::Url::parse("https://abc123.api.sanity.io/v2021-03-25/data/query/production?query=*")?;
/// let response = ReqwestClient::new().request(HttpRequest::get(url)).await?;
/// println!("{}", response.status);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    inner: reqwest::Client,
}

impl ReqwestClient {
    /// Creates a transport with reqwest's defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: reqwest::Client::new(),
        }
    }

    /// Wraps a preconfigured reqwest client, e.g. one with timeouts or a proxy.
    #[must_use]
    pub const fn from_client(client: reqwest::Client) -> Self {
        Self { inner: client }
    }
}

impl Default for ReqwestClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for ReqwestClient {
    async fn request(&self, req: HttpRequest) -> Result<HttpResponse, HttpError> {
        let mut builder = self.inner.request(req.method, req.url.as_str());

        for (name, value) in &req.headers {
            builder = builder.header(name, value);
        }

        if let Some(body) = req.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                HttpError::Timeout
            } else if e.is_builder() {
                HttpError::InvalidRequest(e.to_string())
            } else {
                HttpError::Connection(Box::new(e))
            }
        })?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| HttpError::Connection(Box::new(e)))?
            .to_vec();

        Ok(HttpResponse::new(status, headers, body))
    }
}
