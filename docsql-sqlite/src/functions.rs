//! SQL functions registered on every connection.

use regex::Regex;
use rusqlite::{
    Connection, Error as SqliteError, Result as SqliteResult,
    functions::FunctionFlags,
    types::ValueRef,
};

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Registers `regexp(pattern, text)`, which backs the `text REGEXP pattern` operator.
///
/// Patterns use the `regex` crate syntax and are compiled once per statement.
/// `NULL` text never matches.
pub(crate) fn register_regexp(connection: &Connection) -> SqliteResult<()> {
    connection.create_scalar_function(
        "regexp",
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let pattern = ctx.get_or_create_aux(0, |raw| -> Result<Regex, BoxError> {
                Ok(Regex::new(raw.as_str()?)?)
            })?;

            let matched = match ctx.get_raw(1) {
                ValueRef::Null => false,
                ValueRef::Text(text) => {
                    let text = std::str::from_utf8(text)
                        .map_err(|e| SqliteError::UserFunctionError(e.into()))?;
                    pattern.is_match(text)
                }
                other => {
                    return Err(SqliteError::UserFunctionError(
                        format!("regexp expects text, got {:?}", other.data_type()).into(),
                    ));
                }
            };
            Ok(matched)
        },
    )
}
