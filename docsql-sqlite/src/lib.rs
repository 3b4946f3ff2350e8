//! SQLite engine for docsql.
//!
//! This crate implements [`SqlEngine`](docsql_core::engine::SqlEngine) on a
//! bundled SQLite build through `rusqlite`, so no system library is required.
//!
//! # Features
//!
//! - **JSON1** - Documents are stored as JSON text and queried with the JSON1 functions
//! - **REGEXP** - A `regexp` function backed by the `regex` crate is registered on open
//! - **File or memory** - Open a database file or a private in-memory database
//! - **Journal mode and busy timeout** - Configurable through [`SqliteConfig`]
//!
//! # Example
//!
//! ```ignore
//! use docsql_core::engine::EngineBuilder;
//! use docsql_sqlite::{JournalMode, SqliteEngine};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = SqliteEngine::builder()
//!         .path("inventory.db")
//!         .journal_mode(JournalMode::Wal)
//!         .build()
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docsql_sqlite;

pub mod config;
pub mod engine;
mod functions;

pub use config::{JournalMode, SqliteConfig};
pub use engine::{SqliteEngine, SqliteEngineBuilder};
