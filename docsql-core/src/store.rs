//! Database handles.
//!
//! A [`Database`] wraps one engine connection and hands out [`Collection`]
//! handles by name. Each name is validated once and its handle is cached for
//! the lifetime of the database, so the schema for a collection is created at
//! most once.
//!
//! # Example
//!
//! ```ignore
//! use docsql::store::Database;
//! use docsql::ids::UuidGenerator;
//!
//! let db = Database::builder(engine)
//!     .id_generator(UuidGenerator)
//!     .array_paths("inventory", ["tags", "instock"])
//!     .build();
//! let inventory = db.collection("inventory")?;
//! ```

use log::{error, info};
use parking_lot::Mutex;
use std::{collections::HashMap, sync::Arc};

use crate::{
    collection::{Collection, TABLE_PREFIX},
    engine::SqlEngine,
    error::{DocumentStoreError, DocumentStoreResult},
    filter::quote::quote_string,
    ids::{IdGenerator, ObjectIdGenerator},
};

/// Lowercases `name` and checks it against `^[a-z_][a-z0-9_]*$`.
///
/// # Errors
///
/// Returns [`DocumentStoreError::InvalidCollectionName`] if the lowercased name
/// is empty, starts with a digit or contains anything but ASCII letters, digits
/// and underscores.
pub fn validate_collection_name(name: &str) -> DocumentStoreResult<String> {
    let lowercased = name.to_lowercase();
    let mut chars = lowercased.chars();
    let valid = chars
        .next()
        .is_some_and(|first| first.is_ascii_lowercase() || first == '_')
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');

    if valid {
        Ok(lowercased)
    } else {
        Err(DocumentStoreError::InvalidCollectionName(name.to_string()))
    }
}

/// A handle to a database of collections.
///
/// # Type Parameters
///
/// * `E` - The engine implementation
#[derive(Debug)]
pub struct Database<E: SqlEngine> {
    engine: Arc<E>,
    ids: Arc<dyn IdGenerator>,
    array_paths: HashMap<String, Vec<String>>,
    collections: Mutex<HashMap<String, Collection<E>>>,
}

impl<E: SqlEngine> Database<E> {
    /// Creates a database over `engine` with default settings.
    pub fn new(engine: E) -> Self {
        Self::builder(engine).build()
    }

    /// Creates a builder for a database over `engine`.
    pub fn builder(engine: E) -> DatabaseBuilder<E> {
        DatabaseBuilder::new(engine)
    }

    /// Returns the underlying engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Returns the handle for the collection `name`, creating it on first request.
    ///
    /// Names are case-insensitive. No statement is issued here; the table is
    /// created by the first operation on the collection.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::InvalidCollectionName`] for invalid names.
    pub fn collection(&self, name: &str) -> DocumentStoreResult<Collection<E>> {
        let name = validate_collection_name(name)?;

        let mut collections = self.collections.lock();
        let collection = collections.entry(name).or_insert_with_key(|name| {
            Collection::new(
                name.clone(),
                Arc::clone(&self.engine),
                Arc::clone(&self.ids),
                self.array_paths.get(name).cloned().unwrap_or_default(),
            )
        });
        Ok(collection.clone())
    }

    /// Lists the names of collections that have been created in this database.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine query fails.
    pub async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        let sql = format!(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name LIKE {} ESCAPE '\\' ORDER BY name",
            quote_string(&format!("{}%", TABLE_PREFIX.replace('_', "\\_")))
        );

        self.engine
            .query_rows(&sql, Vec::new())
            .await?
            .iter()
            .map(|row| {
                row.text(0)
                    .map(|table| table.strip_prefix(TABLE_PREFIX).unwrap_or(table).to_string())
            })
            .collect()
    }

    /// Closes the engine connection.
    ///
    /// Collection handles obtained earlier fail with
    /// [`DocumentStoreError::Closed`] afterwards.
    pub async fn close(&self) -> DocumentStoreResult<()> {
        self.collections.lock().clear();
        match self.engine.close().await {
            Ok(()) => {
                info!("Closed database");
                Ok(())
            }
            Err(err) => {
                error!("Failed to close database: {}", err);
                Err(err)
            }
        }
    }
}

/// Builder for [`Database`].
#[derive(Debug)]
pub struct DatabaseBuilder<E: SqlEngine> {
    engine: E,
    ids: Arc<dyn IdGenerator>,
    array_paths: HashMap<String, Vec<String>>,
}

impl<E: SqlEngine> DatabaseBuilder<E> {
    /// Creates a builder using [`ObjectIdGenerator`] and no array paths.
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            ids: Arc::new(ObjectIdGenerator),
            array_paths: HashMap::new(),
        }
    }

    /// Sets the generator used for documents inserted without an `_id`.
    pub fn id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Arc::new(ids);
        self
    }

    /// Declares dotted paths of `collection` that may hold arrays.
    ///
    /// Top-level filter conditions on these paths match the value itself or
    /// any element of an array stored there. Calling this again for the same
    /// collection adds to its paths.
    ///
    /// # Arguments
    ///
    /// * `collection` - The collection name, matched case-insensitively
    /// * `paths` - Dotted paths such as `"tags"` or `"instock"`
    pub fn array_paths<I, S>(mut self, collection: &str, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.array_paths
            .entry(collection.to_lowercase())
            .or_default()
            .extend(paths.into_iter().map(Into::into));
        self
    }

    /// Builds the database.
    pub fn build(self) -> Database<E> {
        Database {
            engine: Arc::new(self.engine),
            ids: self.ids,
            array_paths: self.array_paths,
            collections: Mutex::new(HashMap::new()),
        }
    }
}
