//! Wire types for the data endpoints.
//!
//! Request types only serialize and response types only deserialize.
//! Caller documents are kept as pre-encoded [`RawValue`]s so they are
//! sent exactly as they were marshaled.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::Error;

/// Body of `POST /data/mutate/<dataset>`.
#[derive(Debug, Clone, Serialize)]
pub struct MutateRequest {
    pub mutations: Vec<MutationItem>,
}

/// A single mutation; exactly one operation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MutationItem {
    Create(Box<RawValue>),
    CreateIfNotExists(Box<RawValue>),
    CreateOrReplace(Box<RawValue>),
    Delete(Delete),
    Patch(Patch),
}

/// Deletes a document by ID.
#[derive(Debug, Clone, Serialize)]
pub struct Delete {
    pub id: String,
}

/// Partial update of one document, or of every document matching `query`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Patch {
    pub id: String,

    #[serde(rename = "ifRevisionID", skip_serializing_if = "Option::is_none")]
    pub if_revision_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub set: BTreeMap<String, Box<RawValue>>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub set_if_missing: BTreeMap<String, Box<RawValue>>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub diff_match_patch: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unset: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub insert: Option<Insert>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub inc: BTreeMap<String, f64>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub dec: BTreeMap<String, f64>,
}

/// Inserts items into an array relative to an anchor path.
#[derive(Debug, Clone, Serialize)]
pub struct Insert {
    #[serde(flatten)]
    pub anchor: InsertAnchor,
    pub items: Vec<Box<RawValue>>,
}

/// Where [`Insert::items`] go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum InsertAnchor {
    Before(String),
    After(String),
    Replace(String),
}

/// When a mutation becomes visible to queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Visibility {
    /// Visible once the request returns.
    #[default]
    Sync,
    /// Returns immediately; visible shortly after.
    Async,
    /// Returns immediately; visibility may lag further.
    Deferred,
}

impl Visibility {
    /// The query parameter value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sync => "sync",
            Self::Async => "async",
            Self::Deferred => "deferred",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response of the mutate endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutateResponse {
    #[serde(default)]
    pub transaction_id: String,
    #[serde(default)]
    pub results: Vec<MutateResultItem>,
}

/// Outcome of one mutation.
#[derive(Debug, Clone, Deserialize)]
pub struct MutateResultItem {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub operation: Option<String>,
    #[serde(default)]
    pub document: Option<Box<RawValue>>,
}

impl MutateResultItem {
    /// Decodes the returned document, if the server included one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the document does not match `T`.
    pub fn document<T: DeserializeOwned>(&self) -> Result<Option<T>, Error> {
        self.document
            .as_deref()
            .map(|raw| serde_json::from_str(raw.get()))
            .transpose()
            .map_err(Error::Decode)
    }
}

/// Body of `POST /data/query/<dataset>`.
#[derive(Debug, Clone, Serialize)]
pub struct QueryRequest<'a> {
    pub query: &'a str,
    pub params: BTreeMap<&'a str, &'a RawValue>,
}

/// Response of the query endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryResponse {
    /// Server-side time in milliseconds.
    #[serde(default)]
    pub ms: f64,

    #[serde(default)]
    pub query: String,

    /// Raw result; `None` when the server sent `null` or nothing.
    #[serde(default)]
    pub result: Option<Box<RawValue>>,
}

/// A document as returned by the doc endpoint.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Response of the doc endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GetDocumentsResponse {
    #[serde(default)]
    pub documents: Vec<Document>,
    #[serde(default)]
    pub omitted: Vec<OmittedDocument>,
}

/// A requested document the server did not return.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OmittedDocument {
    pub id: String,
    pub reason: String,
}
