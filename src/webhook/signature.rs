//! Signature header parsing, signing and verification.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use regex::Regex;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::{MINIMUM_TIMESTAMP, WebhookError};
use crate::time::Clock;

type HmacSha256 = Hmac<Sha256>;

static HEADER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^t=([0-9]+)[, ]+v1=([^, ]+)$").expect("signature header pattern is valid")
});

/// A parsed signature header.
///
/// # Example
///
/// ```
/// use sanity_client::webhook::SignatureHeader;
///
/// let header: SignatureHeader = "t=1633519811129,v1=abc".parse().unwrap();
/// assert_eq!(header.timestamp, 1_633_519_811_129);
/// assert_eq!(header.signature, "abc");
/// assert_eq!(header.to_string(), "t=1633519811129,v1=abc");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Signing time in milliseconds since the Unix epoch.
    pub timestamp: u64,

    /// Unpadded base64url signature.
    pub signature: String,
}

impl SignatureHeader {
    /// Signs `payload` at `timestamp`.
    #[must_use]
    pub fn sign(payload: &[u8], timestamp: u64, secret: &str) -> Self {
        Self {
            timestamp,
            signature: compute_signature(payload, timestamp, secret),
        }
    }

    /// Returns true if the signature matches `payload` under `secret`.
    ///
    /// The comparison runs in constant time.
    #[must_use]
    pub fn matches(&self, payload: &[u8], secret: &str) -> bool {
        let expected = compute_signature(payload, self.timestamp, secret);
        expected.as_bytes().ct_eq(self.signature.as_bytes()).into()
    }
}

impl FromStr for SignatureHeader {
    type Err = WebhookError;

    /// Parses `t=<digits>,v1=<signature>`, allowing commas and spaces
    /// between the two parts and whitespace around the whole value.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let captures = HEADER_PATTERN
            .captures(s.trim())
            .ok_or(WebhookError::InvalidSignature)?;

        let timestamp = captures[1]
            .parse()
            .map_err(|_| WebhookError::InvalidSignature)?;

        Ok(Self {
            timestamp,
            signature: captures[2].to_string(),
        })
    }
}

impl fmt::Display for SignatureHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t={},v1={}", self.timestamp, self.signature)
    }
}

fn compute_signature(payload: &[u8], timestamp: u64, secret: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take any size key");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
}

/// Produces the signature header value for `payload`.
///
/// # Example
///
/// ```
/// use sanity_client::webhook::encode_signature_header;
///
/// assert_eq!(
///     encode_signature_header(br#"{"_id":"resume"}"#, 1_633_519_811_129, "test"),
///     "t=1633519811129,v1=tLa470fx7qkLLEcMOcEUFuBbRSkGujyskxrNXcoh0N0"
/// );
/// ```
#[must_use]
pub fn encode_signature_header(payload: &[u8], timestamp: u64, secret: &str) -> String {
    SignatureHeader::sign(payload, timestamp, secret).to_string()
}

/// Signs `payload` with the current time from `clock`.
#[must_use]
pub fn sign_now(payload: &[u8], secret: &str, clock: &impl Clock) -> String {
    encode_signature_header(payload, clock.now_millis(), secret)
}

/// Verifies a signature header against a raw payload.
///
/// # Errors
///
/// - [`WebhookError::InvalidSignature`] if the header is malformed
/// - [`WebhookError::TimestampTooOld`] if the timestamp is before
///   [`MINIMUM_TIMESTAMP`]
pub fn is_valid_signature(payload: &[u8], header: &str, secret: &str) -> Result<bool, WebhookError> {
    let header: SignatureHeader = header.parse()?;

    if header.timestamp < MINIMUM_TIMESTAMP {
        return Err(WebhookError::TimestampTooOld {
            timestamp: header.timestamp,
        });
    }

    let valid = header.matches(payload, secret);
    if !valid {
        tracing::debug!(timestamp = header.timestamp, "Webhook signature mismatch");
    }
    Ok(valid)
}
