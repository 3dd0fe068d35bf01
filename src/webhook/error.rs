//! Webhook verification errors.

use thiserror::Error;

/// Errors from webhook verification.
///
/// A well-formed header whose signature does not match is not an error;
/// verification returns `Ok(false)` for it.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// The header is missing or not of the form `t=<digits>,v1=<signature>`.
    #[error("invalid signature")]
    InvalidSignature,

    /// The timestamp predates signed webhooks.
    #[error(
        "invalid signature timestamp {timestamp}, must be a unix timestamp with millisecond precision"
    )]
    TimestampTooOld {
        /// The rejected timestamp
        timestamp: u64,
    },

    /// The request body could not be read.
    #[error("Failed to read request body: {0}")]
    ReadBody(#[from] std::io::Error),
}
