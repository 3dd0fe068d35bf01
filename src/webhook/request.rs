//! Verification of whole webhook requests.

use std::io::{self, Cursor, Read};

use super::{SIGNATURE_HEADER_NAME, WebhookError, is_valid_signature};

/// In-memory request body that can be read again after verification.
#[derive(Debug, Clone, Default)]
pub struct ReplayableBody(Cursor<Vec<u8>>);

impl ReplayableBody {
    /// Returns the full body regardless of the read position.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.get_ref()
    }

    /// Consumes the body, returning its bytes.
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.0.into_inner()
    }
}

impl From<Vec<u8>> for ReplayableBody {
    fn from(bytes: Vec<u8>) -> Self {
        Self(Cursor::new(bytes))
    }
}

impl From<&str> for ReplayableBody {
    fn from(text: &str) -> Self {
        Self::from(text.as_bytes().to_vec())
    }
}

impl Read for ReplayableBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

/// Verifies the signature of an incoming webhook request.
///
/// Reads the whole body, puts an equivalent unread body back into the
/// request so the handler can still consume it, then verifies it against
/// the `sanity-webhook-signature` header. A missing header is treated as
/// malformed.
///
/// # Errors
///
/// - [`WebhookError::ReadBody`] if the body cannot be read
/// - Any error from [`is_valid_signature`]
pub fn is_valid_request<B>(request: &mut http::Request<B>, secret: &str) -> Result<bool, WebhookError>
where
    B: Read + From<Vec<u8>>,
{
    let mut body = Vec::new();
    request.body_mut().read_to_end(&mut body)?;

    let header = request
        .headers()
        .get(SIGNATURE_HEADER_NAME)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let valid = is_valid_signature(&body, &header, secret);
    *request.body_mut() = B::from(body);
    valid
}
