//! Document mutations.
//!
//! Mutations are collected on a [`MutationBuilder`] and sent as one
//! transaction. Patches are described through a nested [`PatchBuilder`]
//! that hands the parent back from [`PatchBuilder::end`].

mod patch;

#[cfg(test)]
mod mod_tests;

use http::Method;
use serde::Serialize;
use serde_json::value::RawValue;
use tokio_util::sync::CancellationToken;

use crate::Error;
use crate::api::{
    Delete, MutateRequest, MutateResponse, MutateResultItem, MutationItem, Patch, Visibility,
};
use crate::client::Client;
use crate::time::Sleeper;
use crate::transport::HttpClient;

pub use patch::PatchBuilder;

/// Outcome of a mutation transaction.
#[derive(Debug, Clone)]
pub struct MutateResult {
    /// ID of the committed transaction.
    pub transaction_id: String,

    /// One entry per mutation, in request order.
    pub results: Vec<MutateResultItem>,
}

/// Builder for a batch of mutations, created by [`Client::mutate`].
#[derive(Debug)]
#[must_use = "mutations are not sent until executed"]
pub struct MutationBuilder<'a, H, S> {
    client: &'a Client<H, S>,
    items: Vec<MutationItem>,
    error: Option<serde_json::Error>,
    return_ids: bool,
    return_documents: bool,
    visibility: Visibility,
    transaction_id: Option<String>,
    tag: Option<String>,
    cancel: CancellationToken,
}

impl<'a, H, S> MutationBuilder<'a, H, S> {
    pub(crate) fn new(client: &'a Client<H, S>) -> Self {
        Self {
            client,
            items: Vec::new(),
            error: None,
            return_ids: false,
            return_documents: true,
            visibility: Visibility::default(),
            transaction_id: None,
            tag: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Creates a document; fails server-side if the ID exists.
    pub fn create<T: Serialize + ?Sized>(mut self, doc: &T) -> Self {
        if let Some(raw) = self.marshal(doc) {
            self.items.push(MutationItem::Create(raw));
        }
        self
    }

    /// Creates a document unless one with the same ID exists.
    pub fn create_if_not_exists<T: Serialize + ?Sized>(mut self, doc: &T) -> Self {
        if let Some(raw) = self.marshal(doc) {
            self.items.push(MutationItem::CreateIfNotExists(raw));
        }
        self
    }

    /// Creates a document, replacing any existing one with the same ID.
    pub fn create_or_replace<T: Serialize + ?Sized>(mut self, doc: &T) -> Self {
        if let Some(raw) = self.marshal(doc) {
            self.items.push(MutationItem::CreateOrReplace(raw));
        }
        self
    }

    /// Deletes a document.
    pub fn delete(mut self, id: impl Into<String>) -> Self {
        self.items.push(MutationItem::Delete(Delete { id: id.into() }));
        self
    }

    /// Starts a patch of the document with the given ID.
    pub fn patch(self, id: impl Into<String>) -> PatchBuilder<'a, H, S> {
        PatchBuilder::new(
            self,
            Patch {
                id: id.into(),
                ..Patch::default()
            },
        )
    }

    /// Asks the server to return the IDs of affected documents.
    pub const fn return_ids(mut self, enable: bool) -> Self {
        self.return_ids = enable;
        self
    }

    /// Asks the server to return the affected documents.
    pub const fn return_documents(mut self, enable: bool) -> Self {
        self.return_documents = enable;
        self
    }

    /// Sets when the mutation becomes visible to queries.
    pub const fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Uses a caller-chosen transaction ID.
    pub fn transaction_id(mut self, id: impl Into<String>) -> Self {
        self.transaction_id = Some(id.into());
        self
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

    /// Number of mutations collected so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if no mutations have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Encodes `value`, keeping the first failure for `execute`.
    fn marshal<T: Serialize + ?Sized>(&mut self, value: &T) -> Option<Box<RawValue>> {
        match serde_json::to_string(value).and_then(RawValue::from_string) {
            Ok(raw) => Some(raw),
            Err(e) => {
                if self.error.is_none() {
                    self.error = Some(e);
                }
                None
            }
        }
    }

    fn push(&mut self, item: MutationItem) {
        self.items.push(item);
    }
}

impl<H: HttpClient, S: Sleeper> MutationBuilder<'_, H, S> {
    /// Sends all collected mutations as one transaction.
    ///
    /// An empty builder still sends a request with no mutations.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Marshal`] if any document or value failed to encode,
    /// or any error produced while sending the request.
    pub async fn execute(self) -> Result<MutateResult, Error> {
        if let Some(source) = self.error {
            return Err(Error::Marshal {
                context: "mutation builder: marshaling document".to_string(),
                source,
            });
        }

        let mut request = self
            .client
            .new_api_request()
            .method(Method::POST)
            .append_path(["data/mutate", self.client.dataset()])
            .param("returnIds", self.return_ids)
            .param("returnDocuments", self.return_documents)
            .param("visibility", self.visibility);

        if let Some(id) = &self.transaction_id {
            request = request.param("transactionId", id);
        }

        let count = self.items.len();
        let request = request
            .tag(self.tag.as_deref(), self.client.config().tag.as_deref())
            .marshal_body(&MutateRequest {
                mutations: self.items,
            });

        tracing::debug!(mutations = count, "Sending mutations");
        let response: MutateResponse = self.client.send(request, &self.cancel).await?;

        Ok(MutateResult {
            transaction_id: response.transaction_id,
            results: response.results,
        })
    }
}
