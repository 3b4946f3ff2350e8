//! JSON paths into the document column.
//!
//! A [`JsonPath`] always addresses the document column of the current row. It is
//! either absolute (`$.size.uom`) or anchored on the `fullkey` of a `json_each`
//! row, which is how array elements are addressed inside `EXISTS` subqueries.

use std::fmt::Write;

use super::quote::{quote_identifier, quote_string};
use crate::error::{DocumentStoreError, DocumentStoreResult};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(u64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct JsonPath {
    column: String,
    anchor: Option<String>,
    segments: Vec<Segment>,
}

impl JsonPath {
    /// The whole document stored in `column`.
    pub(crate) fn root(column: &str) -> Self {
        Self {
            column: quote_identifier(column),
            anchor: None,
            segments: Vec::new(),
        }
    }

    /// The array element currently visited by the `json_each` row `alias`.
    pub(crate) fn element(&self, alias: &str) -> Self {
        Self {
            column: self.column.clone(),
            anchor: Some(format!("{}.fullkey", quote_identifier(alias))),
            segments: Vec::new(),
        }
    }

    /// Returns `true` for the top of the stored document itself.
    pub(crate) fn is_document_root(&self) -> bool {
        self.anchor.is_none() && self.segments.is_empty()
    }

    /// Extends the path with a dotted field reference such as `size.uom` or `tags.0`.
    ///
    /// Purely numeric parts address array positions.
    pub(crate) fn join(&self, dotted: &str) -> DocumentStoreResult<Self> {
        let mut path = self.clone();
        for part in dotted.split('.') {
            if part.is_empty() {
                return Err(DocumentStoreError::invalid_filter(format!(
                    "empty path segment in '{dotted}'"
                )));
            }
            if part.contains('"') {
                return Err(DocumentStoreError::invalid_filter(format!(
                    "field names may not contain '\"': '{dotted}'"
                )));
            }
            let segment = match part.parse::<u64>() {
                Ok(index) if part.bytes().all(|b| b.is_ascii_digit()) => Segment::Index(index),
                _ => Segment::Key(part.to_string()),
            };
            path.segments.push(segment);
        }
        Ok(path)
    }

    /// The path argument passed to the JSON functions.
    pub(crate) fn path_sql(&self) -> String {
        let mut suffix = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Index(index) => {
                    let _ = write!(suffix, "[{index}]");
                }
                Segment::Key(key) if is_plain_label(key) => {
                    let _ = write!(suffix, ".{key}");
                }
                Segment::Key(key) => {
                    let _ = write!(suffix, ".\"{key}\"");
                }
            }
        }

        match &self.anchor {
            None => quote_string(&format!("${suffix}")),
            Some(anchor) if suffix.is_empty() => anchor.clone(),
            Some(anchor) => format!("{anchor} || {}", quote_string(&suffix)),
        }
    }

    /// `json_extract` of the value at this path.
    pub(crate) fn extract(&self) -> String {
        format!("json_extract({}, {})", self.column, self.path_sql())
    }

    /// `json_type` of the value at this path; SQL `NULL` when the path is absent.
    pub(crate) fn json_type(&self) -> String {
        format!("json_type({}, {})", self.column, self.path_sql())
    }

    /// `json_array_length` of the array at this path.
    pub(crate) fn array_length(&self) -> String {
        format!("json_array_length({}, {})", self.column, self.path_sql())
    }

    /// A `json_each` table source iterating the array at this path.
    pub(crate) fn each(&self, alias: &str) -> String {
        format!(
            "json_each({}, {}) AS {}",
            self.column,
            self.path_sql(),
            quote_identifier(alias)
        )
    }
}

fn is_plain_label(key: &str) -> bool {
    key.chars()
        .all(|c| c.is_alphanumeric() || c == '_')
}
