//! Error types and result types for document store operations.
//!
//! This module provides the error taxonomy shared by the filter compiler, the
//! collection API and engine bindings. Use [`DocumentStoreResult<T>`] as the
//! return type for fallible operations.
//!
//! Errors fall into three groups:
//!
//! - **Validation** ([`InvalidCollectionName`](DocumentStoreError::InvalidCollectionName),
//!   [`InvalidFilter`](DocumentStoreError::InvalidFilter),
//!   [`InvalidDocument`](DocumentStoreError::InvalidDocument)) - raised before any
//!   statement reaches the engine.
//! - **Integrity** ([`DocumentAlreadyExists`](DocumentStoreError::DocumentAlreadyExists),
//!   [`ImmutableId`](DocumentStoreError::ImmutableId),
//!   [`PartialInsert`](DocumentStoreError::PartialInsert)) - raised while writing.
//! - **Engine** ([`Backend`](DocumentStoreError::Backend),
//!   [`Constraint`](DocumentStoreError::Constraint),
//!   [`Initialization`](DocumentStoreError::Initialization),
//!   [`Closed`](DocumentStoreError::Closed)) - reported by the engine binding.
//!
//! Not-found outcomes are never errors: they surface as zero counts or `None`.

use serde_json::Error as SerdeJsonError;
use thiserror::Error;

use crate::collection::InsertManyResult;

/// Represents all possible errors that can occur when interacting with a document store.
#[derive(Error, Debug)]
pub enum DocumentStoreError {
    /// Serialization/deserialization error when converting documents to or from JSON.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Error during engine initialization, connection setup or schema creation.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// The collection name does not match `^[a-z_][a-z0-9_]*$` after lowercasing.
    #[error("Invalid collection name: {0}")]
    InvalidCollectionName(String),
    /// The filter document is structurally invalid.
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),
    /// The document is not a JSON object or carries a malformed `_id`.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
    /// A document with the given ID already exists in the collection.
    /// The first argument is the document ID, the second is the collection name.
    #[error("Document {0} already exists in collection {1}")]
    DocumentAlreadyExists(String, String),
    /// A replacement tried to change the `_id` of an existing document.
    #[error("Cannot change _id of document {current} to {attempted}")]
    ImmutableId {
        /// The `_id` of the stored document.
        current: String,
        /// The `_id` carried by the replacement.
        attempted: String,
    },
    /// A batch insert stopped part way through.
    ///
    /// Rows written before the failure stay committed and are described by
    /// `result`; `source` is the error that stopped the batch.
    #[error("Insert stopped after {} document(s): {source}", .result.inserted_count)]
    PartialInsert {
        /// The documents committed before the failure.
        result: InsertManyResult,
        /// The failure that aborted the batch.
        #[source]
        source: Box<DocumentStoreError>,
    },
    /// The engine rejected a write because it violated a declared constraint.
    #[error("Constraint violation: {0}")]
    Constraint(String),
    /// An error occurred in the underlying engine.
    #[error("Backend error: {0}")]
    Backend(String),
    /// The engine connection has been closed.
    #[error("Connection is closed")]
    Closed,
}

impl DocumentStoreError {
    /// Returns `true` for errors raised before any statement was issued.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DocumentStoreError::InvalidCollectionName(_)
                | DocumentStoreError::InvalidFilter(_)
                | DocumentStoreError::InvalidDocument(_)
        )
    }

    pub(crate) fn invalid_filter(message: impl Into<String>) -> Self {
        DocumentStoreError::InvalidFilter(message.into())
    }
}

/// A specialized `Result` type for document store operations.
///
/// This type alias is used throughout the crate to indicate operations that may fail
/// with a [`DocumentStoreError`].
pub type DocumentStoreResult<T> = Result<T, DocumentStoreError>;

impl From<SerdeJsonError> for DocumentStoreError {
    fn from(err: SerdeJsonError) -> Self {
        DocumentStoreError::Serialization(err.to_string())
    }
}
