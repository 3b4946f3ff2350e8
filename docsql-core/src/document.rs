//! Document representation and serialization helpers.
//!
//! Documents are open-ended JSON objects. The only reserved field is `_id`, a
//! string that identifies the document inside its collection and never changes
//! once the document is stored.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value, from_value, to_value};

use crate::error::{DocumentStoreError, DocumentStoreResult};

/// Name of the reserved identifier field.
pub const ID_FIELD: &str = "_id";

/// A stored document: a JSON object whose keys keep their insertion order.
pub type Document = Map<String, Value>;

/// Converts any serializable value into a [`Document`].
///
/// # Errors
///
/// Returns [`DocumentStoreError::InvalidDocument`] if the value does not
/// serialize to a JSON object, or a serialization error if serde fails.
pub fn to_document<T: Serialize + ?Sized>(value: &T) -> DocumentStoreResult<Document> {
    match to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(DocumentStoreError::InvalidDocument(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

/// Deserializes a [`Document`] into a typed value.
///
/// # Errors
///
/// Returns a serialization error if the document does not match `T`.
pub fn from_document<T: DeserializeOwned>(document: Document) -> DocumentStoreResult<T> {
    Ok(from_value(Value::Object(document))?)
}

/// Extension methods for working with the reserved `_id` field.
pub trait DocumentExt {
    /// Returns the document's `_id` if it is present and a string.
    fn id(&self) -> Option<&str>;

    /// Returns the `_id` value, validating that it is a string when present.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::InvalidDocument`] if `_id` is present but
    /// is not a string.
    fn checked_id(&self) -> DocumentStoreResult<Option<&str>>;

    /// Returns a copy of this document with `_id` set to `id` as its first key.
    fn with_id(self, id: &str) -> Document;
}

impl DocumentExt for Document {
    fn id(&self) -> Option<&str> {
        self.get(ID_FIELD).and_then(Value::as_str)
    }

    fn checked_id(&self) -> DocumentStoreResult<Option<&str>> {
        match self.get(ID_FIELD) {
            None => Ok(None),
            Some(Value::String(id)) => Ok(Some(id)),
            Some(other) => Err(DocumentStoreError::InvalidDocument(format!(
                "_id must be a string, got {}",
                json_kind(other)
            ))),
        }
    }

    fn with_id(self, id: &str) -> Document {
        let mut document = Document::with_capacity(self.len() + 1);
        document.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
        document.extend(
            self.into_iter()
                .filter(|(key, _)| key != ID_FIELD),
        );
        document
    }
}

/// Parses a stored JSON body back into a [`Document`].
pub(crate) fn parse_document(body: &str) -> DocumentStoreResult<Document> {
    match serde_json::from_str::<Value>(body)? {
        Value::Object(map) => Ok(map),
        other => Err(DocumentStoreError::Serialization(format!(
            "stored row is not a JSON object but {}",
            json_kind(&other)
        ))),
    }
}

/// Human readable name of a JSON value's kind, used in error messages.
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
