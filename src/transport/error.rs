//! Error types for HTTP transport operations.

use thiserror::Error;

/// Error type for a failed HTTP round trip.
///
/// Raised only when no response was received at all. Responses with a
/// non-success status are not transport errors; the executor classifies
/// those itself.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Network connection failed.
    ///
    /// This includes DNS resolution failures, connection refused,
    /// and failures while reading the response body.
    #[error("Connection error: {0}")]
    Connection(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Request timed out inside the underlying HTTP client.
    #[error("Request timed out")]
    Timeout,

    /// The request could not be constructed by the HTTP client.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}
