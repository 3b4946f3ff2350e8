//! A MongoDB-style document collection layer over a relational JSON engine.
//!
//! This crate is the core of the docsql project and provides:
//!
//! - **Documents** ([`document`]) - The JSON document model and `_id` helpers
//! - **Filters** ([`filter`]) - Compilation of MongoDB filter documents into SQL predicates
//! - **Filter helpers** ([`query`]) - Builders for filter documents
//! - **Collections** ([`collection`]) - Insert, find, count, delete and replace
//! - **Cursors** ([`cursor`]) - Lazy, forward-only iteration over results
//! - **Databases** ([`store`]) - Collection handles over one engine connection
//! - **Engine abstraction** ([`engine`]) - The trait an embedded SQL engine implements
//! - **Identifiers** ([`ids`]) - Generators for documents inserted without an `_id`
//! - **Error handling** ([`error`]) - Error and result types
//!
//! # Example
//!
//! ```ignore
//! use docsql_core::store::Database;
//! use serde_json::json;
//!
//! let db = Database::new(engine);
//! let inventory = db.collection("inventory")?;
//!
//! inventory.insert_many(&[
//!     json!({ "item": "journal", "qty": 25, "status": "A" }),
//!     json!({ "item": "paper", "qty": 100, "status": "D" }),
//! ]).await?;
//!
//! let cursor = inventory.find(&json!({ "status": "D" }))?;
//! let documents = cursor.to_array().await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as docsql_core;

pub mod collection;
pub mod cursor;
pub mod document;
pub mod engine;
pub mod error;
pub mod filter;
pub mod ids;
pub mod query;
pub mod store;
