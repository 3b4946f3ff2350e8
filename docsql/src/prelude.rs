//! Convenient re-exports of commonly used types from docsql.
//!
//! ```ignore
//! use docsql::prelude::*;
//! ```
//!
//! This provides access to:
//! - Databases, collections and cursors
//! - Documents and the `_id` helpers
//! - Filter builders
//! - Result and error types

pub use docsql_core::{
    collection::{Collection, DeleteResult, InsertManyResult, InsertOneResult, ReplaceResult, Selector},
    cursor::Cursor,
    document::{Document, DocumentExt, ID_FIELD},
    engine::{EngineBuilder, SqlEngine},
    error::{DocumentStoreError, DocumentStoreResult},
    ids::{IdGenerator, ObjectIdGenerator, UuidGenerator},
    query::{Filter, FilterExt},
    store::{Database, DatabaseBuilder},
};
