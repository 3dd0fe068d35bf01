//! Patch builder.

use serde::Serialize;

use super::{MutateResult, MutationBuilder};
use crate::Error;
use crate::api::{Insert, InsertAnchor, MutationItem, Patch};
use crate::time::Sleeper;
use crate::transport::HttpClient;

/// Builder for one patch inside a [`MutationBuilder`].
///
/// Owns the parent builder; [`PatchBuilder::end`] adds the patch to it and
/// returns it. Encoding failures are recorded on the parent.
#[derive(Debug)]
#[must_use = "call `end` to add the patch to the mutation"]
pub struct PatchBuilder<'a, H, S> {
    parent: MutationBuilder<'a, H, S>,
    patch: Patch,
}

impl<'a, H, S> PatchBuilder<'a, H, S> {
    pub(super) fn new(parent: MutationBuilder<'a, H, S>, patch: Patch) -> Self {
        Self { parent, patch }
    }

    /// Only applies the patch if the document is at this revision.
    pub fn if_revision_id(mut self, revision: impl Into<String>) -> Self {
        self.patch.if_revision_id = Some(revision.into());
        self
    }

    /// Applies the patch to every document matching a GROQ query.
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.patch.query = Some(query.into());
        self
    }

    /// Sets the value at `path`.
    pub fn set<T: Serialize + ?Sized>(mut self, path: impl Into<String>, value: &T) -> Self {
        if let Some(raw) = self.parent.marshal(value) {
            self.patch.set.insert(path.into(), raw);
        }
        self
    }

    /// Sets the value at `path` unless it already has one.
    pub fn set_if_missing<T: Serialize + ?Sized>(
        mut self,
        path: impl Into<String>,
        value: &T,
    ) -> Self {
        if let Some(raw) = self.parent.marshal(value) {
            self.patch.set_if_missing.insert(path.into(), raw);
        }
        self
    }

    /// Applies a diff-match-patch string to the text at `path`.
    pub fn diff_match_patch(mut self, path: impl Into<String>, patch: impl Into<String>) -> Self {
        self.patch.diff_match_patch.insert(path.into(), patch.into());
        self
    }

    /// Removes the values at `paths`.
    pub fn unset<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.patch.unset.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Increments the number at `path`.
    pub fn inc(mut self, path: impl Into<String>, by: f64) -> Self {
        self.patch.inc.insert(path.into(), by);
        self
    }

    /// Decrements the number at `path`.
    pub fn dec(mut self, path: impl Into<String>, by: f64) -> Self {
        self.patch.dec.insert(path.into(), by);
        self
    }

    /// Inserts `items` before the array element at `path`.
    pub fn insert_before<I, T>(self, path: impl Into<String>, items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Serialize,
    {
        self.insert(InsertAnchor::Before(path.into()), items)
    }

    /// Inserts `items` after the array element at `path`.
    pub fn insert_after<I, T>(self, path: impl Into<String>, items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Serialize,
    {
        self.insert(InsertAnchor::After(path.into()), items)
    }

    /// Replaces the array elements at `path` with `items`.
    pub fn insert_replace<I, T>(self, path: impl Into<String>, items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Serialize,
    {
        self.insert(InsertAnchor::Replace(path.into()), items)
    }

    /// Only one insert per patch; a later call replaces an earlier one.
    fn insert<I, T>(mut self, anchor: InsertAnchor, items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Serialize,
    {
        let mut encoded = Vec::new();
        for item in items {
            match self.parent.marshal(&item) {
                Some(raw) => encoded.push(raw),
                None => return self,
            }
        }

        self.patch.insert = Some(Insert {
            anchor,
            items: encoded,
        });
        self
    }

    /// Adds the patch to the mutation and returns the mutation builder.
    pub fn end(mut self) -> MutationBuilder<'a, H, S> {
        self.parent.push(MutationItem::Patch(self.patch));
        self.parent
    }
}

impl<H: HttpClient, S: Sleeper> PatchBuilder<'_, H, S> {
    /// Ends the patch and sends the mutation.
    ///
    /// # Errors
    ///
    /// See [`MutationBuilder::execute`].
    pub async fn execute(self) -> Result<MutateResult, Error> {
        self.end().execute().await
    }
}
