//! Webhook signature verification.
//!
//! Signed webhooks carry a `sanity-webhook-signature` header of the form
//! `t=<epoch-ms>,v1=<signature>`, where the signature is the unpadded
//! base64url HMAC-SHA256 of `"<epoch-ms>.<body>"` keyed by the shared
//! secret.
//!
//! This module provides:
//! - Header parsing and formatting ([`SignatureHeader`])
//! - Verification of raw payloads ([`is_valid_signature`]) and of whole
//!   requests ([`is_valid_request`])
//! - Signing for tests and tooling ([`encode_signature_header`], [`sign_now`])

mod error;
mod request;
mod signature;


pub use error::WebhookError;
pub use request::{ReplayableBody, is_valid_request};
pub use signature::{SignatureHeader, encode_signature_header, is_valid_signature, sign_now};

/// Name of the header carrying the signature.
pub const SIGNATURE_HEADER_NAME: &str = "sanity-webhook-signature";

/// Earliest accepted timestamp (2021-01-01T00:00:00Z, in milliseconds).
///
/// Webhooks were not signed before this date.
pub const MINIMUM_TIMESTAMP: u64 = 1_609_459_200_000;
