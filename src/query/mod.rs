//! GROQ queries.


use std::collections::BTreeMap;
use std::time::Duration;

use http::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::value::RawValue;
use tokio_util::sync::CancellationToken;

use crate::Error;
use crate::api::{QueryRequest, QueryResponse};
use crate::client::Client;
use crate::time::Sleeper;
use crate::transport::{HttpClient, RequestBuilder};

/// Longest URL sent as a GET; longer queries are sent as a POST body.
pub const MAX_GET_URL_LENGTH: usize = 1024;

/// Result of a query.
#[derive(Debug, Clone)]
pub struct QueryResult {
    /// Time the server spent on the query.
    pub time: Duration,

    /// Raw JSON result; `None` if the query produced nothing.
    pub result: Option<Box<RawValue>>,
}

impl QueryResult {
    /// Decodes the result, yielding `T::default()` when there is none.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the result does not match `T`.
    pub fn unmarshal<T: DeserializeOwned + Default>(&self) -> Result<T, Error> {
        match &self.result {
            Some(raw) => serde_json::from_str(raw.get()).map_err(Error::Decode),
            None => Ok(T::default()),
        }
    }

    /// Decodes the result into `dest`, resetting it when there is none.
    ///
    /// On error `dest` is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the result does not match `T`.
    pub fn unmarshal_into<T: DeserializeOwned + Default>(&self, dest: &mut T) -> Result<(), Error> {
        *dest = self.unmarshal()?;
        Ok(())
    }
}

/// Builder for a single query, created by [`Client::query`].
#[derive(Debug)]
#[must_use = "a query does nothing until executed"]
pub struct QueryBuilder<'a, H, S> {
    client: &'a Client<H, S>,
    query: String,
    params: Vec<(String, Box<RawValue>)>,
    error: Option<Error>,
    tag: Option<String>,
    cancel: CancellationToken,
}

impl<'a, H, S> QueryBuilder<'a, H, S> {
    pub(crate) fn new(client: &'a Client<H, S>, query: String) -> Self {
        Self {
            client,
            query,
            params: Vec::new(),
            error: None,
            tag: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Binds `$name` in the query to the JSON encoding of `value`.
    ///
    /// Binding the same name again replaces the earlier value. Encoding
    /// failures are reported by [`QueryBuilder::execute`].
    pub fn param<T: Serialize + ?Sized>(mut self, name: impl Into<String>, value: &T) -> Self {
        let name = name.into();
        let encoded = serde_json::to_string(value).and_then(RawValue::from_string);

        match encoded {
            Ok(raw) => match self.params.iter_mut().find(|(n, _)| *n == name) {
                Some(slot) => slot.1 = raw,
                None => self.params.push((name, raw)),
            },
            Err(source) => {
                if self.error.is_none() {
                    self.error = Some(Error::Marshal {
                        context: format!("marshaling parameter {name:?} to JSON"),
                        source,
                    });
                }
            }
        }
        self
    }

    /// Tags the request, overriding the client's default tag.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Aborts the query when `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    fn base_request(&self, method: Method) -> RequestBuilder {
        self.client
            .new_query_request()
            .method(method)
            .append_path(["data/query", self.client.dataset()])
    }

    fn build_get(&self) -> RequestBuilder {
        let mut request = self.base_request(Method::GET).param("query", &self.query);
        for (name, value) in &self.params {
            request = request.param(format!("${name}"), value.get());
        }
        request.tag(self.tag.as_deref(), self.client.config().tag.as_deref())
    }

    fn build_post(&self) -> RequestBuilder {
        let body = QueryRequest {
            query: &self.query,
            params: self
                .params
                .iter()
                .map(|(name, value)| (name.as_str(), value.as_ref()))
                .collect::<BTreeMap<_, _>>(),
        };

        self.base_request(Method::POST)
            .tag(self.tag.as_deref(), self.client.config().tag.as_deref())
            .marshal_body(&body)
    }
}

impl<H: HttpClient, S: Sleeper> QueryBuilder<'_, H, S> {
    /// Runs the query.
    ///
    /// Sent as a GET unless the encoded URL would exceed
    /// [`MAX_GET_URL_LENGTH`], in which case it is sent as a POST.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Marshal`] if a parameter failed to encode, or any
    /// error produced while sending the request.
    pub async fn execute(mut self) -> Result<QueryResult, Error> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }

        let mut request = self.build_get();
        if request.encoded_len() > MAX_GET_URL_LENGTH {
            tracing::debug!(
                length = request.encoded_len(),
                "Query URL too long, sending as POST"
            );
            request = self.build_post();
        }

        let response: QueryResponse = self.client.send(request, &self.cancel).await?;

        let result = QueryResult {
            time: Duration::try_from_secs_f64(response.ms / 1000.0).unwrap_or_default(),
            result: response.result,
        };
        tracing::debug!(ms = response.ms, "Query completed");

        if let Some(callback) = &self.client.config().callbacks.on_query_result {
            callback(&result);
        }

        Ok(result)
    }
}
