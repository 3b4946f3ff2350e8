//! Relational engine abstraction for the document store.
//!
//! The collection layer builds SQL text (SQLite dialect with the JSON1 function
//! family) and hands it to an implementation of [`SqlEngine`]. Engines own the
//! connection, execute statements in the order they are issued, and translate
//! their native errors into [`DocumentStoreError`](crate::error::DocumentStoreError).
//!
//! # Traits
//!
//! - [`SqlEngine`]: statement execution and row fetching
//! - [`EngineBuilder`]: factory trait for creating engine instances

use async_trait::async_trait;
use std::fmt::Debug;

use crate::error::{DocumentStoreError, DocumentStoreResult};

/// A value bound to a statement parameter or read from a result column.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// SQL `NULL`.
    Null,
    /// A 64-bit signed integer.
    Integer(i64),
    /// A 64-bit float.
    Real(f64),
    /// UTF-8 text.
    Text(String),
    /// Raw bytes.
    Blob(Vec<u8>),
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Integer(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

/// A single result row, with columns in select-list order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SqlRow(Vec<SqlValue>);

impl SqlRow {
    /// Creates a row from its column values.
    pub fn new(values: Vec<SqlValue>) -> Self {
        Self(values)
    }

    /// Returns the value of column `index`, if present.
    pub fn get(&self, index: usize) -> Option<&SqlValue> {
        self.0.get(index)
    }

    /// Returns the number of columns.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Reads column `index` as an integer.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Backend`] if the column is missing or not an integer.
    pub fn integer(&self, index: usize) -> DocumentStoreResult<i64> {
        match self.get(index) {
            Some(SqlValue::Integer(value)) => Ok(*value),
            other => Err(DocumentStoreError::Backend(format!(
                "expected integer in column {index}, got {other:?}"
            ))),
        }
    }

    /// Reads column `index` as text.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Backend`] if the column is missing or not text.
    pub fn text(&self, index: usize) -> DocumentStoreResult<&str> {
        match self.get(index) {
            Some(SqlValue::Text(value)) => Ok(value),
            other => Err(DocumentStoreError::Backend(format!(
                "expected text in column {index}, got {other:?}"
            ))),
        }
    }
}

/// Abstract interface for the embedded relational engine.
///
/// The engine is expected to provide JSON storage, the JSON1 path functions
/// (`json`, `json_extract`, `json_type`, `json_each`, `json_array_length`), a
/// `REGEXP` operator, a stable per-row ordering key (`rowid`) and expression
/// indexes with uniqueness constraints.
///
/// # Thread Safety
///
/// Implementations serialize statement execution on a single logical connection.
/// They must be `Send + Sync` so collections and cursors can share them between tasks.
///
/// # Error Handling
///
/// Uniqueness violations must be reported as
/// [`DocumentStoreError::Constraint`](crate::error::DocumentStoreError::Constraint);
/// the collection layer relies on this to recognise duplicate `_id` values.
#[async_trait]
pub trait SqlEngine: Send + Sync + Debug {
    /// Executes a single statement and returns the number of rows it changed.
    async fn execute(&self, sql: &str, params: Vec<SqlValue>) -> DocumentStoreResult<usize>;

    /// Executes one or more parameterless statements separated by semicolons.
    async fn execute_batch(&self, sql: &str) -> DocumentStoreResult<()>;

    /// Runs a query and returns its first row, if any.
    async fn query_row(
        &self,
        sql: &str,
        params: Vec<SqlValue>,
    ) -> DocumentStoreResult<Option<SqlRow>>;

    /// Runs a query and returns every row.
    async fn query_rows(&self, sql: &str, params: Vec<SqlValue>) -> DocumentStoreResult<Vec<SqlRow>>;

    /// Closes the connection. Later calls fail with
    /// [`DocumentStoreError::Closed`](crate::error::DocumentStoreError::Closed).
    ///
    /// The default implementation is a no-op.
    async fn close(&self) -> DocumentStoreResult<()> {
        Ok(())
    }
}

/// Factory trait for engines that need asynchronous setup.
#[async_trait]
pub trait EngineBuilder {
    type Engine: SqlEngine;

    async fn build(self) -> DocumentStoreResult<Self::Engine>;
}
