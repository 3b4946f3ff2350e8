//! Collections of JSON documents.
//!
//! A [`Collection`] owns one table with a single JSON column and a unique
//! index over the `_id` extracted from it. Collections are created lazily:
//! the schema statements run once, before the first operation that needs
//! them, and every method waits for that initialization to finish.
//!
//! # Example
//!
//! ```ignore
//! use docsql::prelude::*;
//! use serde_json::json;
//!
//! # async fn example() -> DocumentStoreResult<()> {
//! let db = docsql::open_in_memory().await?;
//! let inventory = db.collection("inventory")?;
//!
//! let inserted = inventory.insert_one(&json!({ "item": "journal", "qty": 25 })).await?;
//! let journal = inventory.find_one(inserted.inserted_id.as_str()).await?;
//!
//! inventory.delete_many(&json!({ "qty": { "$lt": 30 } })).await?;
//! # Ok(()) }
//! ```

use log::{debug, error, info, warn};
use mea::mutex::Mutex;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use std::{collections::BTreeMap, fmt, sync::Arc};

use crate::{
    cursor::Cursor,
    document::{Document, DocumentExt, ID_FIELD, from_document, parse_document, to_document},
    engine::{SqlEngine, SqlValue},
    error::{DocumentStoreError, DocumentStoreResult},
    filter::{FilterCompiler, quote::quote_identifier},
    ids::IdGenerator,
};

/// Name of the JSON column holding each document.
pub const DATA_COLUMN: &str = "data";

/// Prefix of every collection table name.
pub const TABLE_PREFIX: &str = "collection_";

/// Outcome of [`Collection::insert_one`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertOneResult {
    /// The `_id` of the stored document.
    pub inserted_id: String,
}

/// Outcome of [`Collection::insert_many`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertManyResult {
    /// Number of documents committed.
    pub inserted_count: usize,
    /// The `_id` of each committed document, keyed by its position in the input.
    pub inserted_ids: BTreeMap<usize, String>,
}

/// Outcome of [`Collection::delete_one`] and [`Collection::delete_many`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub deleted_count: usize,
}

/// Outcome of [`Collection::replace_one`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceResult {
    pub modified_count: usize,
}

/// Selects a single document, either by `_id` or by filter.
///
/// A bare string is shorthand for `{"_id": <string>}`:
///
/// ```ignore
/// collection.find_one("5f1d7a...").await?;
/// collection.find_one(json!({ "status": "A" })).await?;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    Id(String),
    Filter(Value),
}

impl Selector {
    /// Returns the filter document this selector stands for.
    pub fn into_filter(self) -> Value {
        match self {
            Selector::Id(id) => json!({ ID_FIELD: id }),
            Selector::Filter(filter) => filter,
        }
    }
}

impl From<&str> for Selector {
    fn from(id: &str) -> Self {
        Selector::Id(id.to_string())
    }
}

impl From<String> for Selector {
    fn from(id: String) -> Self {
        Selector::Id(id)
    }
}

impl From<&String> for Selector {
    fn from(id: &String) -> Self {
        Selector::Id(id.clone())
    }
}

impl From<Value> for Selector {
    fn from(value: Value) -> Self {
        match value {
            Value::String(id) => Selector::Id(id),
            filter => Selector::Filter(filter),
        }
    }
}

impl From<&Value> for Selector {
    fn from(value: &Value) -> Self {
        Selector::from(value.clone())
    }
}

/// Initialization progress of a collection's schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InitState {
    Uninitialized,
    /// Schema statements are in flight. Seen by a later caller only if the
    /// initializing call was dropped before it finished.
    Initializing,
    Ready,
}

/// Statement text for one collection, built once from its table name.
#[derive(Debug)]
struct Statements {
    schema: String,
    table: String,
    column: String,
    insert: String,
    delete_by_id: String,
    replace_by_id: String,
}

impl Statements {
    fn new(table: &str) -> Self {
        let quoted_table = quote_identifier(table);
        // `$` cannot appear in a collection name, so no table shares this name
        let index = quote_identifier(&format!("{table}${ID_FIELD}"));
        let column = quote_identifier(DATA_COLUMN);
        let id = format!("json_extract({column}, '$.{ID_FIELD}')");

        Self {
            schema: format!(
                "CREATE TABLE IF NOT EXISTS {quoted_table} ({column} JSON NOT NULL);\n\
                 CREATE UNIQUE INDEX IF NOT EXISTS {index} ON {quoted_table} ({id});"
            ),
            insert: format!("INSERT INTO {quoted_table} ({column}) VALUES (json(?1))"),
            delete_by_id: format!("DELETE FROM {quoted_table} WHERE {id} = ?1"),
            replace_by_id: format!("UPDATE {quoted_table} SET {column} = json(?1) WHERE {id} = ?2"),
            table: quoted_table,
            column,
        }
    }

    fn find_one(&self, predicate: &str) -> String {
        format!(
            "SELECT {} FROM {} WHERE ({predicate}) ORDER BY rowid LIMIT 1",
            self.column, self.table
        )
    }

    fn next_after(&self, predicate: &str) -> String {
        format!(
            "SELECT rowid, {} FROM {} WHERE rowid > ?1 AND ({predicate}) ORDER BY rowid LIMIT 1",
            self.column, self.table
        )
    }

    fn count(&self, predicate: &str) -> String {
        format!("SELECT COUNT(*) FROM {} WHERE ({predicate})", self.table)
    }

    fn delete(&self, predicate: &str) -> String {
        format!("DELETE FROM {} WHERE ({predicate})", self.table)
    }
}

struct CollectionInner<E: SqlEngine> {
    name: String,
    table: String,
    engine: Arc<E>,
    ids: Arc<dyn IdGenerator>,
    compiler: FilterCompiler,
    statements: Statements,
    state: Mutex<InitState>,
}

/// A handle to one named collection.
///
/// Handles are cheap to clone and all clones share the same initialization
/// state, so the schema is created at most once per handle obtained from the
/// database.
///
/// # Type Parameters
///
/// * `E` - The engine executing the statements
pub struct Collection<E: SqlEngine> {
    inner: Arc<CollectionInner<E>>,
}

impl<E: SqlEngine> fmt::Debug for Collection<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.inner.name)
            .field("table", &self.inner.table)
            .field("engine", &self.inner.engine)
            .finish_non_exhaustive()
    }
}

impl<E: SqlEngine> Clone for Collection<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: SqlEngine> Collection<E> {
    /// Creates a collection handle (internal use). `name` must already be validated.
    pub(crate) fn new(
        name: String,
        engine: Arc<E>,
        ids: Arc<dyn IdGenerator>,
        array_paths: Vec<String>,
    ) -> Self {
        let table = format!("{TABLE_PREFIX}{name}");
        Self {
            inner: Arc::new(CollectionInner {
                statements: Statements::new(&table),
                compiler: FilterCompiler::new(DATA_COLUMN).with_array_paths(array_paths),
                state: Mutex::new(InitState::Uninitialized),
                name,
                table,
                engine,
                ids,
            }),
        }
    }

    /// Returns the logical name of this collection.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns the name of the table backing this collection.
    pub fn table_name(&self) -> &str {
        &self.inner.table
    }

    /// Compiles `filter` into this collection's predicate. `null` selects every document.
    pub(crate) fn compile(&self, filter: &Value) -> DocumentStoreResult<String> {
        let predicate = match filter {
            Value::Null => "TRUE".to_string(),
            filter => self.inner.compiler.compile(filter)?,
        };
        debug!("Compiled filter for collection {}: {}", self.inner.name, predicate);
        Ok(predicate)
    }

    /// Waits until the collection's table and index exist, creating them on first use.
    ///
    /// A failed initialization leaves the collection uninitialized, so the next
    /// call tries again.
    pub(crate) async fn ready(&self) -> DocumentStoreResult<()> {
        let mut state = self.inner.state.lock().await;
        match *state {
            InitState::Ready => return Ok(()),
            InitState::Initializing => debug!(
                "Retrying interrupted initialization of collection {}",
                self.inner.name
            ),
            InitState::Uninitialized => {}
        }

        *state = InitState::Initializing;
        match self.inner.engine.execute_batch(&self.inner.statements.schema).await {
            Ok(()) => {
                *state = InitState::Ready;
                info!("Initialized collection {} ({})", self.inner.name, self.inner.table);
                Ok(())
            }
            Err(err) => {
                *state = InitState::Uninitialized;
                error!("Failed to initialize collection {}: {}", self.inner.name, err);
                Err(match err {
                    DocumentStoreError::Closed => DocumentStoreError::Closed,
                    other => DocumentStoreError::Initialization(other.to_string()),
                })
            }
        }
    }

    /// Validates a document for insertion and gives it an `_id` if it has none.
    fn prepare<T: Serialize + ?Sized>(&self, document: &T) -> DocumentStoreResult<(String, Document)> {
        let document = to_document(document)?;
        let id = match document.checked_id()? {
            Some(id) => id.to_string(),
            None => self.inner.ids.generate(),
        };
        let document = document.with_id(&id);
        Ok((id, document))
    }

    /// Inserts one document.
    ///
    /// If the document has no `_id`, one is generated and stored as its first field.
    ///
    /// # Arguments
    ///
    /// * `document` - Any value that serializes to a JSON object
    ///
    /// # Errors
    ///
    /// * [`DocumentStoreError::InvalidDocument`] if the document is not an object or its `_id` is not a string
    /// * [`DocumentStoreError::DocumentAlreadyExists`] if the `_id` is already taken
    pub async fn insert_one<T: Serialize>(&self, document: &T) -> DocumentStoreResult<InsertOneResult> {
        match self.insert_many(std::slice::from_ref(document)).await {
            Ok(mut result) => result
                .inserted_ids
                .remove(&0)
                .map(|inserted_id| InsertOneResult { inserted_id })
                .ok_or_else(|| DocumentStoreError::Backend("insert reported no document".to_string())),
            Err(DocumentStoreError::PartialInsert { source, .. }) => Err(*source),
            Err(err) => Err(err),
        }
    }

    /// Inserts documents one at a time, in order.
    ///
    /// Every document is validated before anything is written. The writes are
    /// not wrapped in a transaction: if one fails, the documents before it stay
    /// committed and the rest are never attempted.
    ///
    /// # Arguments
    ///
    /// * `documents` - Values that each serialize to a JSON object
    ///
    /// # Errors
    ///
    /// * [`DocumentStoreError::InvalidDocument`] if any document is invalid; nothing is written
    /// * [`DocumentStoreError::PartialInsert`] if a write fails, carrying the committed
    ///   prefix and the cause ([`DocumentStoreError::DocumentAlreadyExists`] for a duplicate `_id`)
    pub async fn insert_many<T: Serialize>(&self, documents: &[T]) -> DocumentStoreResult<InsertManyResult> {
        let prepared = documents
            .iter()
            .map(|document| self.prepare(document))
            .collect::<DocumentStoreResult<Vec<_>>>()?;
        self.ready().await?;

        let mut result = InsertManyResult::default();
        for (index, (id, document)) in prepared.into_iter().enumerate() {
            let body = serde_json::to_string(&document)?;
            match self
                .inner
                .engine
                .execute(&self.inner.statements.insert, vec![SqlValue::Text(body)])
                .await
            {
                Ok(_) => {
                    result.inserted_count += 1;
                    result.inserted_ids.insert(index, id);
                }
                Err(err) => {
                    let source = match err {
                        DocumentStoreError::Constraint(_) => {
                            DocumentStoreError::DocumentAlreadyExists(id, self.inner.name.clone())
                        }
                        other => other,
                    };
                    warn!(
                        "Insert into collection {} stopped at document {} after {} committed: {}",
                        self.inner.name, index, result.inserted_count, source
                    );
                    return Err(DocumentStoreError::PartialInsert {
                        result,
                        source: Box::new(source),
                    });
                }
            }
        }
        Ok(result)
    }

    /// Returns a cursor over the documents matching `filter`, in insertion order.
    ///
    /// The filter is compiled immediately; no statement runs until the cursor
    /// is advanced. Pass `&Value::Null` or `&json!({})` to iterate everything.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::InvalidFilter`] if the filter does not compile.
    pub fn find(&self, filter: &Value) -> DocumentStoreResult<Cursor<E>> {
        let predicate = self.compile(filter)?;
        Ok(Cursor::new(self.clone(), predicate))
    }

    /// Returns the first document, in insertion order, matching `selector`.
    ///
    /// # Arguments
    ///
    /// * `selector` - An `_id` string or a filter document
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::InvalidFilter`] if the filter does not compile.
    pub async fn find_one(&self, selector: impl Into<Selector>) -> DocumentStoreResult<Option<Document>> {
        let predicate = self.compile(&selector.into().into_filter())?;
        self.ready().await?;
        self.find_one_compiled(&predicate).await
    }

    /// Like [`find_one`](Self::find_one), deserializing the match into `T`.
    pub async fn find_one_as<T: DeserializeOwned>(
        &self,
        selector: impl Into<Selector>,
    ) -> DocumentStoreResult<Option<T>> {
        self.find_one(selector)
            .await?
            .map(from_document)
            .transpose()
    }

    /// Counts the documents matching `filter`.
    pub async fn count_documents(&self, filter: &Value) -> DocumentStoreResult<usize> {
        let predicate = self.compile(filter)?;
        self.ready().await?;

        let count = match self
            .inner
            .engine
            .query_row(&self.inner.statements.count(&predicate), Vec::new())
            .await?
        {
            Some(row) => row.integer(0)?,
            None => 0,
        };
        usize::try_from(count).map_err(|e| DocumentStoreError::Backend(e.to_string()))
    }

    /// Deletes the first document matching `selector`.
    ///
    /// The match is resolved first and then deleted by its `_id`, so at most
    /// one document is removed even when the filter matches several.
    pub async fn delete_one(&self, selector: impl Into<Selector>) -> DocumentStoreResult<DeleteResult> {
        let predicate = self.compile(&selector.into().into_filter())?;
        self.ready().await?;

        let Some(document) = self.find_one_compiled(&predicate).await? else {
            return Ok(DeleteResult::default());
        };
        let id = stored_id(&document, &self.inner.name)?;
        let deleted_count = self
            .inner
            .engine
            .execute(&self.inner.statements.delete_by_id, vec![SqlValue::Text(id)])
            .await?;
        Ok(DeleteResult { deleted_count })
    }

    /// Deletes every document matching `filter`.
    pub async fn delete_many(&self, filter: &Value) -> DocumentStoreResult<DeleteResult> {
        let predicate = self.compile(filter)?;
        self.ready().await?;

        let deleted_count = self
            .inner
            .engine
            .execute(&self.inner.statements.delete(&predicate), Vec::new())
            .await?;
        Ok(DeleteResult { deleted_count })
    }

    /// Replaces the body of the first document matching `selector`.
    ///
    /// The stored `_id` is kept. The replacement may omit `_id` or repeat the
    /// stored one.
    ///
    /// # Errors
    ///
    /// * [`DocumentStoreError::InvalidDocument`] if the replacement is not an object
    /// * [`DocumentStoreError::ImmutableId`] if the replacement carries a different `_id`
    pub async fn replace_one<T: Serialize>(
        &self,
        selector: impl Into<Selector>,
        replacement: &T,
    ) -> DocumentStoreResult<ReplaceResult> {
        let predicate = self.compile(&selector.into().into_filter())?;
        let replacement = to_document(replacement)?;
        let attempted = replacement.checked_id()?.map(str::to_string);
        self.ready().await?;

        let Some(current) = self.find_one_compiled(&predicate).await? else {
            return Ok(ReplaceResult::default());
        };
        let current = stored_id(&current, &self.inner.name)?;
        match attempted {
            Some(attempted) if attempted != current => {
                return Err(DocumentStoreError::ImmutableId { current, attempted });
            }
            _ => {}
        }

        let body = serde_json::to_string(&replacement.with_id(&current))?;
        let modified_count = self
            .inner
            .engine
            .execute(
                &self.inner.statements.replace_by_id,
                vec![SqlValue::Text(body), SqlValue::Text(current)],
            )
            .await?;
        Ok(ReplaceResult { modified_count })
    }

    async fn find_one_compiled(&self, predicate: &str) -> DocumentStoreResult<Option<Document>> {
        self.inner
            .engine
            .query_row(&self.inner.statements.find_one(predicate), Vec::new())
            .await?
            .map(|row| parse_document(row.text(0)?))
            .transpose()
    }

    /// Fetches the first matching row whose `rowid` is greater than `position`.
    pub(crate) async fn next_after(
        &self,
        predicate: &str,
        position: i64,
    ) -> DocumentStoreResult<Option<(i64, Document)>> {
        self.ready().await?;
        let Some(row) = self
            .inner
            .engine
            .query_row(
                &self.inner.statements.next_after(predicate),
                vec![SqlValue::Integer(position)],
            )
            .await?
        else {
            return Ok(None);
        };
        Ok(Some((row.integer(0)?, parse_document(row.text(1)?)?)))
    }
}

fn stored_id(document: &Document, collection: &str) -> DocumentStoreResult<String> {
    document
        .id()
        .map(str::to_string)
        .ok_or_else(|| {
            DocumentStoreError::Serialization(format!(
                "stored document in collection {collection} has no string _id"
            ))
        })
}
