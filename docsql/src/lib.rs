//! Main docsql crate providing MongoDB-style document collections on SQLite.
//!
//! This crate is the primary entry point for users of docsql. It re-exports the
//! core types from `docsql-core` and the SQLite engine from `docsql-sqlite`.
//!
//! # Features
//!
//! - **Schemaless documents** - Store any JSON object, or any `Serialize` type that serializes to one
//! - **MongoDB filters** - Query with `$eq`, `$in`, `$elemMatch`, `$regex`, `$and`, `$nor` and friends
//! - **Lazy cursors** - Iterate results in insertion order without loading them up front
//! - **Embedded storage** - A bundled SQLite file or in-memory database, no server required
//!
//! # Quick Start
//!
//! ```ignore
//! use docsql::prelude::*;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> DocumentStoreResult<()> {
//!     let db = docsql::open_in_memory().await?;
//!     let inventory = db.collection("inventory")?;
//!
//!     inventory.insert_many(&[
//!         json!({ "item": "journal", "qty": 25, "size": { "h": 14, "w": 21, "uom": "cm" }, "status": "A" }),
//!         json!({ "item": "notebook", "qty": 50, "size": { "h": 8.5, "w": 11, "uom": "in" }, "status": "A" }),
//!         json!({ "item": "paper", "qty": 100, "size": { "h": 8.5, "w": 11, "uom": "in" }, "status": "D" }),
//!     ]).await?;
//!
//!     let mut cursor = inventory.find(&json!({ "status": "A", "qty": { "$lt": 30 } }))?;
//!     while let Some(document) = cursor.next().await? {
//!         println!("{}", document.id().unwrap_or_default());
//!     }
//!
//!     inventory.delete_many(&Filter::eq("status", "D")).await?;
//!     db.close().await
//! }
//! ```
//!
//! # Array fields
//!
//! SQL predicates are compiled once per filter, before any document is read,
//! so the compiler cannot see whether a field holds an array. Declare the
//! paths that may hold arrays when building the database and top-level
//! conditions on them also match array elements:
//!
//! ```ignore
//! use docsql::{prelude::*, sqlite::SqliteEngine};
//! use serde_json::json;
//!
//! let db = Database::builder(SqliteEngine::open_in_memory()?)
//!     .array_paths("inventory", ["tags", "instock"])
//!     .build();
//! let inventory = db.collection("inventory")?;
//! let red = inventory.find(&json!({ "tags": "red" }))?;
//! ```

pub mod prelude;

pub use docsql_core::{collection, cursor, document, engine, error, filter, ids, query, store};

// Filters and documents are serde_json values
pub use serde_json;

use docsql_core::{engine::EngineBuilder, error::DocumentStoreResult, store::Database};
use docsql_sqlite::{SqliteEngine, SqliteEngineBuilder};

/// SQLite engine implementation.
pub mod sqlite {
    pub use docsql_sqlite::{JournalMode, SqliteConfig, SqliteEngine, SqliteEngineBuilder};
}

/// A [`Database`] stored in SQLite.
pub type SqliteDatabase = Database<SqliteEngine>;

/// Opens (or creates) the database file at `path` with default settings.
///
/// # Errors
///
/// Returns [`DocumentStoreError::Initialization`](error::DocumentStoreError::Initialization)
/// if the file cannot be opened.
pub async fn open(path: &str) -> DocumentStoreResult<SqliteDatabase> {
    let engine = SqliteEngineBuilder::new().path(path).build().await?;
    Ok(Database::new(engine))
}

/// Opens a private in-memory database. Its contents are lost when it is closed.
pub async fn open_in_memory() -> DocumentStoreResult<SqliteDatabase> {
    let engine = SqliteEngineBuilder::new().build().await?;
    Ok(Database::new(engine))
}
