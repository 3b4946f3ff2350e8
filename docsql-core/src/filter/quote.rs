//! Literal quoting for generated SQL.
//!
//! Compiled predicates are built as text, so every value taken from a filter
//! document reaches the SQL through one of the functions in this module:
//!
//! - [`quote_string`] for text literals
//! - [`quote_identifier`] for table, column and alias names
//! - [`quote_json`] for objects and arrays, embedded through `json(...)`
//! - [`quote_number`] for numbers
//!
//! Nothing else in the compiler formats user data into SQL.

use serde_json::{Number, Value};
use std::fmt::Write;

/// Quotes `text` as a single-quoted SQL string literal.
///
/// Embedded single quotes are doubled. Text containing NUL bytes is emitted as
/// a hex blob cast to text, since SQLite stops reading statement text at the
/// first NUL.
pub fn quote_string(text: &str) -> String {
    if text.contains('\0') {
        let mut hex = String::with_capacity(text.len() * 2 + 16);
        hex.push_str("CAST(X'");
        for byte in text.as_bytes() {
            let _ = write!(hex, "{byte:02X}");
        }
        hex.push_str("' AS TEXT)");
        return hex;
    }

    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('\'');
    for c in text.chars() {
        if c == '\'' {
            quoted.push('\'');
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}

/// Quotes `name` as a double-quoted SQL identifier.
///
/// Embedded double quotes are doubled and NUL bytes are dropped.
pub fn quote_identifier(name: &str) -> String {
    let mut quoted = String::with_capacity(name.len() + 2);
    quoted.push('"');
    for c in name.chars() {
        match c {
            '"' => quoted.push_str("\"\""),
            '\0' => {}
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

/// Embeds a structured value as `json('<serialized>')`.
///
/// The serialized form is minified JSON, which is also how SQLite stores
/// documents, so the result compares equal to a stored sub-document with the
/// same keys in the same order.
pub fn quote_json(value: &Value) -> String {
    format!("json({})", quote_string(&value.to_string()))
}

/// Renders a JSON number as a SQL numeric literal.
pub fn quote_number(number: &Number) -> String {
    if let Some(value) = number.as_i64() {
        value.to_string()
    } else if let Some(value) = number.as_u64() {
        value.to_string()
    } else {
        // serde_json numbers are always finite
        let value = number.as_f64().unwrap_or_default();
        let text = value.to_string();
        if text.contains(['.', 'e', 'E']) { text } else { format!("{text}.0") }
    }
}

/// Renders any scalar JSON value as the literal `json_extract` would compare against.
///
/// Booleans render as `1`/`0`, matching what `json_extract` yields for `true` and
/// `false`. Objects and arrays go through [`quote_json`].
pub fn quote_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) => "0".to_string(),
        Value::Number(number) => quote_number(number),
        Value::String(text) => quote_string(text),
        Value::Array(_) | Value::Object(_) => quote_json(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_strings_are_wrapped() {
        assert_eq!(quote_string("thomas"), "'thomas'");
        assert_eq!(quote_string(""), "''");
    }

    #[test]
    fn single_quotes_are_doubled() {
        assert_eq!(quote_string("th'omas"), "'th''omas'");
        assert_eq!(quote_string("'"), "''''");
        assert_eq!(quote_string("''"), "''''''");
        assert_eq!(quote_string("a' OR 1=1 --"), "'a'' OR 1=1 --'");
    }

    #[test]
    fn double_quotes_and_backslashes_pass_through_strings() {
        assert_eq!(quote_string(r#"say "hi""#), r#"'say "hi"'"#);
        assert_eq!(quote_string(r"C:\path\'x"), r"'C:\path\''x'");
    }

    #[test]
    fn control_characters_stay_inside_the_literal() {
        assert_eq!(quote_string("line\nbreak"), "'line\nbreak'");
        assert_eq!(quote_string("tab\there"), "'tab\there'");
        assert_eq!(quote_string("\r\u{1b}[0m"), "'\r\u{1b}[0m'");
    }

    #[test]
    fn nul_bytes_become_hex_blobs() {
        assert_eq!(quote_string("a\0b"), "CAST(X'610062' AS TEXT)");
        assert_eq!(quote_string("'\0"), "CAST(X'2700' AS TEXT)");
    }

    #[test]
    fn non_ascii_text_is_preserved() {
        assert_eq!(quote_string("café"), "'café'");
        assert_eq!(quote_string("日本'語"), "'日本''語'");
        assert_eq!(quote_string("🦀"), "'🦀'");
        assert_eq!(quote_string("\u{2019}quote"), "'\u{2019}quote'");
    }

    #[test]
    fn identifiers_double_embedded_quotes() {
        assert_eq!(quote_identifier("data"), "\"data\"");
        assert_eq!(quote_identifier("da\"ta"), "\"da\"\"ta\"");
        assert_eq!(quote_identifier("it's"), "\"it's\"");
        assert_eq!(quote_identifier("a\0b"), "\"ab\"");
    }

    #[test]
    fn json_literals_are_serialized_and_quoted() {
        assert_eq!(quote_json(&json!({ "cat": { "name": "oscar" } })), r#"json('{"cat":{"name":"oscar"}}')"#);
        assert_eq!(quote_json(&json!(["Admin"])), r#"json('["Admin"]')"#);
        assert_eq!(quote_json(&json!({ "cat'": "o'scar" })), r#"json('{"cat''":"o''scar"}')"#);
    }

    #[test]
    fn json_literals_escape_control_characters() {
        assert_eq!(quote_json(&json!(["a\u{0}b"])), r#"json('["a\u0000b"]')"#);
        assert_eq!(quote_json(&json!(["x\ny"])), r#"json('["x\ny"]')"#);
    }

    #[test]
    fn numbers_render_as_numeric_literals() {
        assert_eq!(quote_value(&json!(5)), "5");
        assert_eq!(quote_value(&json!(-12)), "-12");
        assert_eq!(quote_value(&json!(u64::MAX)), u64::MAX.to_string());
        assert_eq!(quote_value(&json!(4.123)), "4.123");
        assert_eq!(quote_value(&json!(2.0)), "2.0");
    }

    #[test]
    fn scalars_render_as_comparable_literals() {
        assert_eq!(quote_value(&json!(null)), "NULL");
        assert_eq!(quote_value(&json!(true)), "1");
        assert_eq!(quote_value(&json!(false)), "0");
        assert_eq!(quote_value(&json!("x'y")), "'x''y'");
    }
}
