use async_trait::async_trait;
use docsql_core::{
    engine::{EngineBuilder, SqlEngine, SqlRow, SqlValue},
    error::{DocumentStoreError, DocumentStoreResult},
};
use log::{debug, info};
use mea::mutex::Mutex;
use rusqlite::{
    Connection, ErrorCode, params_from_iter,
    types::{Value, ValueRef},
};
use std::{fmt, time::Duration};

use crate::{
    config::{IN_MEMORY, JournalMode, SqliteConfig},
    functions::register_regexp,
};

/// A [`SqlEngine`] backed by a single bundled SQLite connection.
///
/// Statements are serialized through an async mutex and run on the calling
/// task. Prepared statements are cached per connection.
pub struct SqliteEngine {
    connection: Mutex<Option<Connection>>,
    path: String,
}

impl fmt::Debug for SqliteEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteEngine").field("path", &self.path).finish()
    }
}

impl SqliteEngine {
    pub fn builder() -> SqliteEngineBuilder {
        SqliteEngineBuilder::new()
    }

    /// Opens a connection with the given settings and registers `REGEXP`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Initialization`] if the database cannot be
    /// opened or a pragma cannot be applied.
    pub fn open(config: &SqliteConfig) -> DocumentStoreResult<Self> {
        let path = if config.path.is_empty() { IN_MEMORY } else { config.path.as_str() };
        let connection = Connection::open(path).map_err(initialization)?;

        connection
            .busy_timeout(config.busy_timeout())
            .map_err(initialization)?;

        if !config.is_in_memory() {
            let pragma = format!("PRAGMA journal_mode = {}", config.journal_mode.as_str());
            let mode: String = connection
                .query_row(&pragma, [], |row| row.get(0))
                .map_err(initialization)?;
            debug!("Journal mode for {} is {}", path, mode);
        }

        let engine = Self::from_connection(connection, path)?;
        info!("Opened SQLite database at {}", path);
        Ok(engine)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> DocumentStoreResult<Self> {
        Self::open(&SqliteConfig::default())
    }

    /// Wraps an already open connection, registering `REGEXP` on it.
    pub fn from_connection(connection: Connection, path: &str) -> DocumentStoreResult<Self> {
        register_regexp(&connection).map_err(initialization)?;

        Ok(Self {
            connection: Mutex::new(Some(connection)),
            path: path.to_string(),
        })
    }

    /// Returns the path the database was opened with.
    pub fn path(&self) -> &str {
        &self.path
    }

    async fn with_connection<T, F>(&self, f: F) -> DocumentStoreResult<T>
    where
        F: FnOnce(&Connection) -> DocumentStoreResult<T> + Send,
        T: Send,
    {
        let guard = self.connection.lock().await;
        let connection = guard.as_ref().ok_or(DocumentStoreError::Closed)?;
        f(connection)
    }
}

#[async_trait]
impl SqlEngine for SqliteEngine {
    async fn execute(&self, sql: &str, params: Vec<SqlValue>) -> DocumentStoreResult<usize> {
        debug!("Executing: {}", sql);

        self.with_connection(|connection| {
            connection
                .prepare_cached(sql)
                .and_then(|mut statement| statement.execute(params_from_iter(params.into_iter().map(to_sqlite))))
                .map_err(engine_error)
        })
        .await
    }

    async fn execute_batch(&self, sql: &str) -> DocumentStoreResult<()> {
        debug!("Executing batch: {}", sql);

        self.with_connection(|connection| connection.execute_batch(sql).map_err(engine_error))
            .await
    }

    async fn query_row(&self, sql: &str, params: Vec<SqlValue>) -> DocumentStoreResult<Option<SqlRow>> {
        debug!("Querying row: {}", sql);

        self.with_connection(|connection| {
            Ok(fetch(connection, sql, params, Some(1))?.into_iter().next())
        })
        .await
    }

    async fn query_rows(&self, sql: &str, params: Vec<SqlValue>) -> DocumentStoreResult<Vec<SqlRow>> {
        debug!("Querying rows: {}", sql);

        self.with_connection(|connection| fetch(connection, sql, params, None))
            .await
    }

    async fn close(&self) -> DocumentStoreResult<()> {
        let Some(connection) = self.connection.lock().await.take() else {
            return Ok(());
        };

        connection
            .close()
            .map_err(|(_, e)| DocumentStoreError::Backend(e.to_string()))?;
        info!("Closed SQLite database at {}", self.path);
        Ok(())
    }
}

/// Runs `sql` and reads at most `limit` rows.
fn fetch(
    connection: &Connection,
    sql: &str,
    params: Vec<SqlValue>,
    limit: Option<usize>,
) -> DocumentStoreResult<Vec<SqlRow>> {
    let mut statement = connection.prepare_cached(sql).map_err(engine_error)?;
    let columns = statement.column_count();
    let mut rows = statement
        .query(params_from_iter(params.into_iter().map(to_sqlite)))
        .map_err(engine_error)?;

    let mut fetched = Vec::new();
    while let Some(row) = rows.next().map_err(engine_error)? {
        let values = (0..columns)
            .map(|index| from_sqlite(row.get_ref(index).map_err(engine_error)?))
            .collect::<DocumentStoreResult<Vec<_>>>()?;
        fetched.push(SqlRow::new(values));

        if limit.is_some_and(|limit| fetched.len() >= limit) {
            break;
        }
    }
    Ok(fetched)
}

fn to_sqlite(value: SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(value) => Value::Integer(value),
        SqlValue::Real(value) => Value::Real(value),
        SqlValue::Text(value) => Value::Text(value),
        SqlValue::Blob(value) => Value::Blob(value),
    }
}

fn from_sqlite(value: ValueRef<'_>) -> DocumentStoreResult<SqlValue> {
    Ok(match value {
        ValueRef::Null => SqlValue::Null,
        ValueRef::Integer(value) => SqlValue::Integer(value),
        ValueRef::Real(value) => SqlValue::Real(value),
        ValueRef::Text(bytes) => SqlValue::Text(
            String::from_utf8(bytes.to_vec()).map_err(|e| DocumentStoreError::Backend(e.to_string()))?,
        ),
        ValueRef::Blob(bytes) => SqlValue::Blob(bytes.to_vec()),
    })
}

fn engine_error(err: rusqlite::Error) -> DocumentStoreError {
    match err.sqlite_error_code() {
        Some(ErrorCode::ConstraintViolation) => DocumentStoreError::Constraint(err.to_string()),
        _ => DocumentStoreError::Backend(err.to_string()),
    }
}

fn initialization(err: rusqlite::Error) -> DocumentStoreError {
    DocumentStoreError::Initialization(err.to_string())
}

/// Builder for [`SqliteEngine`].
#[derive(Debug, Clone, Default)]
pub struct SqliteEngineBuilder {
    config: SqliteConfig,
}

impl SqliteEngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: SqliteConfig) -> Self {
        Self { config }
    }

    /// Sets the database file. Defaults to `:memory:`.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.config.path = path.into();
        self
    }

    pub fn journal_mode(mut self, journal_mode: JournalMode) -> Self {
        self.config.journal_mode = journal_mode;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.config.busy_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }
}

#[async_trait]
impl EngineBuilder for SqliteEngineBuilder {
    type Engine = SqliteEngine;

    async fn build(self) -> DocumentStoreResult<Self::Engine> {
        SqliteEngine::open(&self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn engine_with_table() -> SqliteEngine {
        let engine = SqliteEngine::builder().build().await.unwrap();
        engine
            .execute_batch(
                "CREATE TABLE items (data TEXT NOT NULL);
                 CREATE UNIQUE INDEX items_id ON items (json_extract(data, '$._id'));",
            )
            .await
            .unwrap();
        engine
    }

    #[tokio::test]
    async fn executes_and_queries_json() {
        let engine = engine_with_table().await;

        for data in [r#"{"_id":"a","qty":25}"#, r#"{"_id":"b","qty":100}"#] {
            let changed = engine
                .execute("INSERT INTO items (data) VALUES (json(?1))", vec![data.into()])
                .await
                .unwrap();
            assert_eq!(changed, 1);
        }

        let rows = engine
            .query_rows(
                "SELECT rowid, json_extract(data, '$._id') FROM items WHERE json_extract(data, '$.qty') > ?1",
                vec![SqlValue::Integer(30)],
            )
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].integer(0).unwrap(), 2);
        assert_eq!(rows[0].text(1).unwrap(), "b");

        let missing = engine
            .query_row("SELECT data FROM items WHERE rowid > 10", Vec::new())
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn reports_unique_violations_as_constraint_errors() {
        let engine = engine_with_table().await;
        let insert = "INSERT INTO items (data) VALUES (json(?1))";

        engine.execute(insert, vec![r#"{"_id":"a"}"#.into()]).await.unwrap();
        let err = engine
            .execute(insert, vec![r#"{"_id":"a"}"#.into()])
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentStoreError::Constraint(_)), "{err:?}");
    }

    #[tokio::test]
    async fn reports_other_failures_as_backend_errors() {
        let engine = engine_with_table().await;
        let err = engine
            .query_rows("SELECT * FROM no_such_table", Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentStoreError::Backend(_)), "{err:?}");
    }

    #[tokio::test]
    async fn registers_regexp() {
        let engine = SqliteEngine::open_in_memory().unwrap();
        let row = engine
            .query_row("SELECT 'notebook' REGEXP '^note', 'paper' REGEXP '^note'", Vec::new())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.integer(0).unwrap(), 1);
        assert_eq!(row.integer(1).unwrap(), 0);
    }

    #[tokio::test]
    async fn fails_with_closed_after_close() {
        let engine = engine_with_table().await;
        engine.close().await.unwrap();
        engine.close().await.unwrap();

        let err = engine.execute_batch("SELECT 1").await.unwrap_err();
        assert!(matches!(err, DocumentStoreError::Closed));
    }

    #[tokio::test]
    async fn applies_journal_mode_to_file_databases() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.db");

        let engine = SqliteEngineBuilder::new()
            .path(path.to_string_lossy())
            .journal_mode(JournalMode::Wal)
            .busy_timeout(Duration::from_millis(250))
            .build()
            .await
            .unwrap();

        let row = engine
            .query_row("PRAGMA journal_mode", Vec::new())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.text(0).unwrap(), "wal");
        engine.close().await.unwrap();
    }
}
