//! Forward-only cursors over query results.
//!
//! A [`Cursor`] remembers the `rowid` of the last document it returned and
//! asks the engine for the next matching row above it on every advance. It
//! holds no snapshot: rows inserted above the current position become visible
//! to later calls, and an exhausted cursor keeps re-checking when advanced.

use futures::{Stream, stream};
use serde::de::DeserializeOwned;

use crate::{
    collection::Collection,
    document::{Document, from_document},
    engine::SqlEngine,
    error::{DocumentStoreError, DocumentStoreResult},
};

/// A lazy, re-querying iterator over the documents matching a filter.
///
/// Created by [`Collection::find`]. To restart iteration, call `find` again.
#[derive(Debug)]
pub struct Cursor<E: SqlEngine> {
    collection: Collection<E>,
    predicate: String,
    /// `rowid` of the last row returned; rowids start at 1.
    position: i64,
}

impl<E: SqlEngine> Cursor<E> {
    pub(crate) fn new(collection: Collection<E>, predicate: String) -> Self {
        Self {
            collection,
            predicate,
            position: 0,
        }
    }

    /// Returns the compiled predicate this cursor filters by.
    pub fn predicate(&self) -> &str {
        &self.predicate
    }

    /// Returns the next matching document, or `None` when no matching row lies
    /// beyond the current position.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine fails or a stored row cannot be parsed.
    /// The position is unchanged on error.
    pub async fn next(&mut self) -> DocumentStoreResult<Option<Document>> {
        match self
            .collection
            .next_after(&self.predicate, self.position)
            .await?
        {
            Some((rowid, document)) => {
                self.position = rowid;
                Ok(Some(document))
            }
            None => Ok(None),
        }
    }

    /// Like [`next`](Self::next), deserializing the document into `T`.
    pub async fn next_as<T: DeserializeOwned>(&mut self) -> DocumentStoreResult<Option<T>> {
        self.next().await?.map(from_document).transpose()
    }

    /// Drains the cursor into a vector, in insertion order.
    pub async fn to_array(mut self) -> DocumentStoreResult<Vec<Document>> {
        let mut documents = Vec::new();
        while let Some(document) = self.next().await? {
            documents.push(document);
        }
        Ok(documents)
    }

    /// Converts the cursor into a [`Stream`] of documents.
    ///
    /// The stream ends at the first `None` from [`next`](Self::next) and stops
    /// after yielding an error.
    pub fn into_stream(self) -> impl Stream<Item = DocumentStoreResult<Document>> {
        stream::try_unfold(self, |mut cursor| async move {
            let next = cursor.next().await?;
            Ok::<_, DocumentStoreError>(next.map(|document| (document, cursor)))
        })
    }
}
