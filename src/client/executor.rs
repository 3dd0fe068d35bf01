//! Retrying request executor.

use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use super::Client;
use crate::error::RequestError;
use crate::time::Sleeper;
use crate::transport::{
    HttpClient, HttpRequest, HttpResponse, RequestBuilder, is_method_retriable,
    is_status_retriable,
};
use crate::Error;

impl<H: HttpClient, S: Sleeper> Client<H, S> {
    /// Builds, sends and decodes a request.
    ///
    /// Only idempotent methods that fail with a transient status are
    /// retried; every other failure is returned as-is.
    pub(crate) async fn send<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        cancel: &CancellationToken,
    ) -> Result<T, Error> {
        let request = builder.build()?;
        let response = self.send_with_retry(&request, cancel).await?;

        serde_json::from_slice(&response.body).map_err(Error::Decode)
    }

    async fn send_with_retry(
        &self,
        request: &HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, Error> {
        let mut backoff = self.inner.config.backoff.start();

        loop {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            tracing::debug!(
                method = %request.method,
                url = %request.url,
                attempt = backoff.attempts(),
                "Sending request"
            );

            let result = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(Error::Cancelled),
                result = self.inner.http.request(request.clone()) => result,
            };

            let response = result.map_err(|source| Error::Transport {
                method: request.method.clone(),
                url: request.url.clone(),
                source,
            })?;

            if response.is_success() {
                return Ok(response);
            }

            let status = response.status;
            let error = RequestError::new(
                request.method.clone(),
                request.url.clone(),
                status,
                response.body,
            );

            if !is_method_retriable(&request.method) || !is_status_retriable(status) {
                return Err(error.into());
            }

            let Some(delay) = backoff.next_delay() else {
                tracing::warn!(
                    status = status.as_u16(),
                    attempts = backoff.attempts(),
                    "Giving up after reaching attempt limit"
                );
                return Err(error.into());
            };

            tracing::warn!(
                status = status.as_u16(),
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "Retriable response, backing off"
            );

            if let Some(callback) = &self.inner.config.callbacks.on_error_will_retry {
                callback(&error);
            }

            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(Error::Cancelled),
                () = self.inner.sleeper.sleep(delay) => {}
            }
        }
    }
}
