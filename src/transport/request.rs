//! Request builder for API calls.

use std::fmt::Display;

use http::header::{ACCEPT, CONTENT_TYPE, HeaderName, HeaderValue};
use http::{HeaderMap, Method};
use serde::Serialize;
use url::Url;

use super::HttpRequest;
use crate::Error;

/// Accumulates the parts of a single API request.
///
/// Builder methods take and return `self` so calls chain. Body
/// serialization failures are stored rather than returned, and surface
/// from [`RequestBuilder::build`]; everything chained after a failure is
/// still accepted but has no effect on the outcome.
///
/// # Example
///
/// ```
/// use sanity_client::transport::RequestBuilder;
/// use url::Url;
///
/// let base = Url::parse("https://abc123.api.sanity.io/v1").unwrap();
/// let url = RequestBuilder::new(base)
///     .append_path(["data/query", "production"])
///     .param("query", "*[_type == 'movie']")
///     .encode_url();
///
/// assert_eq!(
///     url.as_str(),
///     "https://abc123.api.sanity.io/v1/data/query/production?query=*%5B_type+%3D%3D+%27movie%27%5D"
/// );
/// ```
#[derive(Debug)]
pub struct RequestBuilder {
    base_url: Url,
    path: String,
    method: Method,
    params: Vec<(String, String)>,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
    error: Option<serde_json::Error>,
}

impl RequestBuilder {
    /// Creates a GET request rooted at `base_url` that accepts JSON.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        Self {
            base_url,
            path: String::new(),
            method: Method::GET,
            params: Vec::new(),
            headers,
            body: None,
            error: None,
        }
    }

    /// Sets the HTTP method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Replaces the path with the given segments.
    #[must_use]
    pub fn path<I, S>(mut self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.path.clear();
        self.append_path(segments)
    }

    /// Appends path segments.
    ///
    /// Each segment is joined with exactly one `/`. Leading and trailing
    /// separators on a segment are ignored, and segments that are empty
    /// (or consist only of separators) are skipped. Separators inside a
    /// segment such as `"data/query"` are kept.
    #[must_use]
    pub fn append_path<I, S>(mut self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for segment in segments {
            let segment = segment.as_ref().trim_matches('/');
            if segment.is_empty() {
                continue;
            }
            self.path.push('/');
            self.path.push_str(segment);
        }
        self
    }

    /// Adds a query parameter.
    ///
    /// Any [`Display`] value is accepted; booleans render as `true`/`false`.
    /// Repeated names accumulate in insertion order.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl Display) -> Self {
        self.params.push((name.into(), value.to_string()));
        self
    }

    /// Adds the `tag` parameter, preferring `tag` over `default_tag`.
    ///
    /// Empty strings count as unset.
    #[must_use]
    pub fn tag(self, tag: Option<&str>, default_tag: Option<&str>) -> Self {
        match tag
            .filter(|t| !t.is_empty())
            .or_else(|| default_tag.filter(|t| !t.is_empty()))
        {
            Some(tag) => self.param("tag", tag),
            None => self,
        }
    }

    /// Adds a header. Values for an existing name accumulate.
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Appends every entry of `headers`.
    #[must_use]
    pub fn headers(mut self, headers: &HeaderMap) -> Self {
        for (name, value) in headers {
            self.headers.append(name, value.clone());
        }
        self
    }

    /// Sets a raw request body.
    #[must_use]
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Serializes `value` as the JSON request body.
    ///
    /// On failure the error is kept and returned by [`RequestBuilder::build`].
    /// Only the first failure is kept.
    #[must_use]
    pub fn marshal_body<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => {
                self.body = Some(body);
                if !self.headers.contains_key(CONTENT_TYPE) {
                    self.headers
                        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                }
            }
            Err(e) => {
                if self.error.is_none() {
                    self.error = Some(e);
                }
            }
        }
        self
    }

    /// Returns the configured method.
    #[must_use]
    pub const fn method_ref(&self) -> &Method {
        &self.method
    }

    /// Returns the joined path (empty if no segments were added).
    #[must_use]
    pub fn path_str(&self) -> &str {
        &self.path
    }

    /// Returns the accumulated headers.
    #[must_use]
    pub const fn headers_ref(&self) -> &HeaderMap {
        &self.headers
    }

    /// Renders the full URL: base URL, joined path, and encoded query string.
    ///
    /// The output depends only on the builder state.
    #[must_use]
    pub fn encode_url(&self) -> Url {
        let mut url = self.base_url.clone();
        let base_path = self.base_url.path().trim_end_matches('/');
        url.set_path(&format!("{base_path}{}", self.path));

        if self.params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut()
                .clear()
                .extend_pairs(self.params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }

        url
    }

    /// Length of [`RequestBuilder::encode_url`] in bytes.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        self.encode_url().as_str().len()
    }

    /// Produces the final request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Marshal`] if a body failed to serialize earlier in the chain.
    pub fn build(self) -> Result<HttpRequest, Error> {
        let url = self.encode_url();
        if let Some(source) = self.error {
            return Err(Error::Marshal {
                context: "marshaling body value to JSON".to_string(),
                source,
            });
        }

        Ok(HttpRequest {
            method: self.method,
            url,
            headers: self.headers,
            body: self.body,
        })
    }
}
