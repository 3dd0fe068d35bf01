//! Error types for API operations.

use std::fmt;

use http::{Method, StatusCode};
use thiserror::Error;
use url::Url;

use crate::transport::HttpError;

/// Error type for every client operation.
#[derive(Debug, Error)]
pub enum Error {
    /// The request was rejected before anything was sent.
    ///
    /// Covers invalid configuration (empty project ID or dataset, malformed
    /// API version) and requests the API cannot accept (URL too long).
    /// Never retried.
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Caller-supplied data could not be encoded as JSON.
    #[error("{context}: {source}")]
    Marshal {
        /// What was being encoded
        context: String,
        /// Underlying serialization error
        #[source]
        source: serde_json::Error,
    },

    /// No response was received.
    #[error("[{method} {url}] failed: {source}")]
    Transport {
        /// Method of the failed request
        method: Method,
        /// URL of the failed request
        url: Url,
        /// Underlying transport error
        #[source]
        source: HttpError,
    },

    /// The API answered with a non-success status.
    #[error(transparent)]
    Request(#[from] RequestError),

    /// A success response did not contain the expected JSON.
    #[error("Failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),

    /// The call was cancelled through its cancellation token.
    #[error("Request cancelled")]
    Cancelled,
}

impl Error {
    /// Creates a [`Error::Validation`] error.
    #[must_use]
    pub fn validation(description: impl Into<String>) -> Self {
        Self::Validation(description.into())
    }

    /// Returns the HTTP status if this error came from an API response.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Request(e) => Some(e.status()),
            _ => None,
        }
    }

    /// Returns the underlying request error, if any.
    #[must_use]
    pub const fn as_request_error(&self) -> Option<&RequestError> {
        match self {
            Self::Request(e) => Some(e),
            _ => None,
        }
    }
}

/// An API response with a non-success status.
///
/// Immutable once constructed. The full body is kept; [`fmt::Display`]
/// shows at most [`RequestError::MAX_BODY_PREVIEW`] bytes of it.
#[derive(Debug, Clone)]
pub struct RequestError {
    method: Method,
    url: Url,
    status: StatusCode,
    body: Vec<u8>,
}

impl RequestError {
    /// Number of body bytes included in the error message.
    pub const MAX_BODY_PREVIEW: usize = 500;

    /// Creates a request error.
    #[must_use]
    pub const fn new(method: Method, url: Url, status: StatusCode, body: Vec<u8>) -> Self {
        Self {
            method,
            url,
            status,
            body,
        }
    }

    /// Method of the failed request.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// URL of the failed request.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Response status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Full response body.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Response body truncated for display.
    #[must_use]
    pub fn body_preview(&self) -> String {
        if self.body.len() <= Self::MAX_BODY_PREVIEW {
            return String::from_utf8_lossy(&self.body).into_owned();
        }

        format!(
            "{} [... and {} more bytes]",
            String::from_utf8_lossy(&self.body[..Self::MAX_BODY_PREVIEW]),
            self.body.len() - Self::MAX_BODY_PREVIEW
        )
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HTTP request [{} {}] failed with status {}",
            self.method,
            self.url,
            self.status.as_u16()
        )?;

        if !self.body.is_empty() {
            write!(f, ": {}", self.body_preview())?;
        }

        Ok(())
    }
}

impl std::error::Error for RequestError {}
