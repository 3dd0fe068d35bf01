//! Fetching documents by ID.


use tokio_util::sync::CancellationToken;

use crate::Error;
use crate::api::GetDocumentsResponse;
use crate::client::Client;
use crate::query::MAX_GET_URL_LENGTH;
use crate::time::Sleeper;
use crate::transport::HttpClient;

/// Builder for a document fetch, created by [`Client::get_documents`].
#[derive(Debug)]
#[must_use = "documents are not fetched until executed"]
pub struct GetDocumentsBuilder<'a, H, S> {
    client: &'a Client<H, S>,
    ids: Vec<String>,
    tag: Option<String>,
    cancel: CancellationToken,
}

impl<'a, H, S> GetDocumentsBuilder<'a, H, S> {
    pub(crate) fn new(client: &'a Client<H, S>, ids: Vec<String>) -> Self {
        Self {
            client,
            ids,
            tag: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Tags the request, overriding the client's default tag.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Aborts the request when `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

impl<H: HttpClient, S: Sleeper> GetDocumentsBuilder<'_, H, S> {
    /// Fetches the documents.
    ///
    /// An empty ID list returns an empty result without contacting the API.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the request URL would be longer than
    /// [`MAX_GET_URL_LENGTH`], or any error produced while sending it.
    pub async fn execute(self) -> Result<GetDocumentsResponse, Error> {
        if self.ids.is_empty() {
            return Ok(GetDocumentsResponse::default());
        }

        let ids = self.ids.join(",");
        let request = self
            .client
            .new_api_request()
            .append_path(["data/doc", self.client.dataset(), ids.as_str()])
            .tag(self.tag.as_deref(), self.client.config().tag.as_deref());

        if request.encoded_len() > MAX_GET_URL_LENGTH {
            return Err(Error::validation("max URL length exceeded"));
        }

        self.client.send(request, &self.cancel).await
    }
}
