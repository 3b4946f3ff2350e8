//! Compilation of filter documents into SQLite boolean expressions.
//!
//! The compiler walks a filter document and produces a single predicate over
//! the JSON document column, using `json_extract`, `json_type`, `json_each` and
//! `json_array_length`. The output is plain SQL text; every literal taken from
//! the filter goes through [`super::quote`].
//!
//! # Null and missing fields
//!
//! `json_extract` yields SQL `NULL` both for a JSON `null` and for a missing
//! path, so `{field: null}` matches either. `$exists` is the only operator that
//! tells them apart, by testing `json_type` instead.
//!
//! # Negations
//!
//! Negated sub-predicates (`$not`, `$nor`, structured `$ne`, `$nin`) are wrapped
//! in `COALESCE(.., FALSE)` so an unknown result counts as "no match" before
//! negation. A document that lacks the field therefore satisfies the negation.

use regex::Regex;
use serde_json::{Map, Value};

use super::operator::Operator;
use super::path::JsonPath;
use super::quote::{quote_json, quote_string, quote_value};
use crate::document::json_kind;
use crate::error::{DocumentStoreError, DocumentStoreResult};

const TRUE: &str = "TRUE";
const FALSE: &str = "FALSE";

const NUMBER_TYPES: &[&str] = &["integer", "real"];
const TEXT_TYPES: &[&str] = &["text"];
const OBJECT_TYPES: &[&str] = &["object"];
const ARRAY_TYPES: &[&str] = &["array"];
const BOOLEAN_TYPES: &[&str] = &["true", "false"];
const NULL_TYPES: &[&str] = &["null"];

/// Compiles filter documents against a JSON document column.
///
/// A compiler is cheap to build and holds no per-compilation state, so one
/// instance can be shared by every query on a collection.
///
/// # Example
///
/// ```ignore
/// use docsql::filter::FilterCompiler;
/// use serde_json::json;
///
/// let sql = FilterCompiler::new("data").compile(&json!({ "status": "D" }))?;
/// assert_eq!(sql, r#"json_extract("data", '$.status') = 'D'"#);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FilterCompiler {
    column: String,
    array_paths: Vec<String>,
}

impl FilterCompiler {
    /// Creates a compiler for documents stored in `column`.
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            array_paths: Vec::new(),
        }
    }

    /// Declares dotted paths that may hold arrays at runtime.
    ///
    /// Top-level conditions on these paths, or on paths beneath them, match
    /// either the value itself or any element of the array stored there.
    pub fn with_array_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.array_paths.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Returns the name of the document column.
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Compiles `filter` into a SQL boolean expression.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::InvalidFilter`] if the filter is not an
    /// object or is structurally invalid anywhere in its tree.
    pub fn compile(&self, filter: &Value) -> DocumentStoreResult<String> {
        let Value::Object(object) = filter else {
            return Err(DocumentStoreError::invalid_filter(format!(
                "filter must be an object, got {}",
                json_kind(filter)
            )));
        };

        let mut compilation = Compilation {
            compiler: self,
            aliases: 0,
        };
        compilation.object(&JsonPath::root(&self.column), object, Position::Fields)
    }

    /// Finds the longest declared array path that `key` names or descends into.
    fn array_path<'k>(&self, key: &'k str) -> Option<(&'k str, Option<&'k str>)> {
        self.array_paths
            .iter()
            .filter_map(|path| {
                if key == path {
                    Some((key, None))
                } else {
                    key.strip_prefix(path.as_str())
                        .and_then(|rest| rest.strip_prefix('.'))
                        .map(|rest| (&key[..path.len()], Some(rest)))
                }
            })
            .max_by_key(|(array, _)| array.len())
    }
}

/// Compiles `filter` against `column` with no declared array paths.
///
/// # Errors
///
/// Returns [`DocumentStoreError::InvalidFilter`] for structurally invalid filters.
pub fn compile(column: &str, filter: &Value) -> DocumentStoreResult<String> {
    FilterCompiler::new(column).compile(filter)
}

/// Whether plain keys of an object name fields or describe a literal value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    /// Top of a filter, an `$elemMatch` sub-filter or a logical branch at one of those.
    Fields,
    /// The value side of a field condition.
    Value,
}

struct Compilation<'c> {
    compiler: &'c FilterCompiler,
    aliases: usize,
}

impl Compilation<'_> {
    fn alias(&mut self) -> String {
        self.aliases += 1;
        format!("_e{}", self.aliases)
    }

    fn value(&mut self, path: &JsonPath, value: &Value, position: Position) -> DocumentStoreResult<String> {
        match value {
            Value::Object(object)
                if position == Position::Value && !object.is_empty() && !has_operator_keys(object) =>
            {
                Ok(equals(path, value))
            }
            Value::Object(object) => self.object(path, object, position),
            other => Ok(equals(path, other)),
        }
    }

    fn object(
        &mut self,
        path: &JsonPath,
        object: &Map<String, Value>,
        position: Position,
    ) -> DocumentStoreResult<String> {
        if object.is_empty() {
            return Ok(TRUE.to_string());
        }
        if position == Position::Value && object.keys().any(|key| !Operator::is_operator_key(key)) {
            return Err(mixed_keys(object));
        }

        let mut parts = Vec::with_capacity(object.len());
        for (key, value) in object {
            if is_regex_options(key, object) {
                continue;
            }
            let part = if Operator::is_operator_key(key) {
                self.operator(path, key, value, object, position)?
            } else {
                self.field(path, key, value)?
            };
            parts.push(part);
        }
        Ok(conjunction(parts))
    }

    fn field(&mut self, path: &JsonPath, key: &str, value: &Value) -> DocumentStoreResult<String> {
        if path.is_document_root() {
            if let Some((array, rest)) = self.compiler.array_path(key) {
                return self.element_or_array(&path.join(array)?, rest, value);
            }
        }
        self.value(&path.join(key)?, value, Position::Value)
    }

    fn operator(
        &mut self,
        path: &JsonPath,
        key: &str,
        value: &Value,
        siblings: &Map<String, Value>,
        position: Position,
    ) -> DocumentStoreResult<String> {
        let operator = lookup(key)?;
        match operator {
            Operator::Eq => Ok(equals(path, value)),
            Operator::Ne => Ok(not_equals(path, value)),
            Operator::Gt => compare(path, ">", value),
            Operator::Gte => compare(path, ">=", value),
            Operator::Lt => compare(path, "<", value),
            Operator::Lte => compare(path, "<=", value),
            Operator::In => is_in(path, value),
            Operator::Nin => not_in(path, value),
            Operator::And | Operator::Or | Operator::Nor => self.logical(path, operator, value, position),
            Operator::Not => self.not(path, value, position),
            Operator::Exists => exists(path, value),
            Operator::Size => size(path, value),
            Operator::All => self.all(path, value),
            Operator::ElemMatch => self.elem_match(path, value),
            Operator::Regex => regex(path, value, siblings.get(Operator::Options.name())),
            Operator::Options => Err(DocumentStoreError::invalid_filter(
                "$options requires a sibling $regex",
            )),
            Operator::Text => text(path, value),
            Operator::Type => type_check(path, value),
            Operator::Mod => modulo(path, value),
        }
    }

    fn logical(
        &mut self,
        path: &JsonPath,
        operator: Operator,
        value: &Value,
        position: Position,
    ) -> DocumentStoreResult<String> {
        let entries = match value {
            Value::Array(entries) if !entries.is_empty() => entries,
            Value::Array(_) => {
                return Err(DocumentStoreError::invalid_filter(format!(
                    "{operator} requires a non-empty array"
                )));
            }
            other => {
                return Err(DocumentStoreError::invalid_filter(format!(
                    "{operator} requires an array, got {}",
                    json_kind(other)
                )));
            }
        };

        let mut parts = Vec::with_capacity(entries.len());
        for entry in entries {
            if !entry.is_object() {
                return Err(DocumentStoreError::invalid_filter(format!(
                    "{operator} entries must be filter objects, got {}",
                    json_kind(entry)
                )));
            }
            let part = self.value(path, entry, position)?;
            parts.push(match operator {
                Operator::Nor => negate(&part),
                _ => part,
            });
        }

        Ok(match operator {
            Operator::Or => disjunction(parts),
            _ => conjunction(parts),
        })
    }

    fn not(&mut self, path: &JsonPath, value: &Value, position: Position) -> DocumentStoreResult<String> {
        if !value.is_object() {
            return Err(DocumentStoreError::invalid_filter(format!(
                "$not requires an object, got {}",
                json_kind(value)
            )));
        }
        Ok(negate(&self.value(path, value, position)?))
    }

    fn all(&mut self, path: &JsonPath, value: &Value) -> DocumentStoreResult<String> {
        let items = list(Operator::All, value)?;

        let mut required: Vec<&Value> = Vec::with_capacity(items.len());
        for item in items {
            if !item.is_null() && !required.contains(&item) {
                required.push(item);
            }
        }
        if required.is_empty() {
            return Ok(FALSE.to_string());
        }

        let mut parts = vec![format!("{} = 'array'", path.json_type())];
        for item in required {
            // {$all: [{$elemMatch: ...}]} requires one matching element per entry
            if let Some(sub) = item
                .as_object()
                .filter(|object| object.len() == 1)
                .and_then(|object| object.get(Operator::ElemMatch.name()))
            {
                parts.push(self.elem_match(path, sub)?);
                continue;
            }
            let alias = self.alias();
            parts.push(format!(
                "EXISTS (SELECT 1 FROM {} WHERE {})",
                path.each(&alias),
                equals(&path.element(&alias), item)
            ));
        }
        Ok(conjunction(parts))
    }

    fn elem_match(&mut self, path: &JsonPath, value: &Value) -> DocumentStoreResult<String> {
        if !value.is_object() {
            return Err(DocumentStoreError::invalid_filter(format!(
                "$elemMatch requires an object, got {}",
                json_kind(value)
            )));
        }
        let alias = self.alias();
        let element = path.element(&alias);
        let condition = self.value(&element, value, Position::Fields)?;
        Ok(format!(
            "({} = 'array' AND EXISTS (SELECT 1 FROM {} WHERE {condition}))",
            path.json_type(),
            path.each(&alias),
        ))
    }

    /// Compiles a condition on a declared array path.
    ///
    /// `array` is the declared path and `rest` the remainder of the field key
    /// beneath it, if any.
    fn element_or_array(
        &mut self,
        array: &JsonPath,
        rest: Option<&str>,
        value: &Value,
    ) -> DocumentStoreResult<String> {
        let object = match value {
            Value::Object(object) if object.is_empty() => return Ok(TRUE.to_string()),
            Value::Object(object) if has_operator_keys(object) => object,
            literal => return self.either(array, rest, |_, path| Ok(equals(path, literal))),
        };
        if object.keys().any(|key| !Operator::is_operator_key(key)) {
            return Err(mixed_keys(object));
        }

        let mut parts = Vec::with_capacity(object.len());
        for (key, operand) in object {
            if is_regex_options(key, object) {
                continue;
            }
            let part = match lookup(key)? {
                Operator::Size | Operator::All | Operator::ElemMatch if rest.is_none() => {
                    self.operator(array, key, operand, object, Position::Value)?
                }
                Operator::Ne => negate(&self.either(array, rest, |_, path| Ok(equals(path, operand)))?),
                Operator::Nin => negate(&self.either(array, rest, |_, path| is_in(path, operand))?),
                Operator::Exists if operand == &Value::Bool(false) => {
                    negate(&self.either(array, rest, |_, path| exists(path, &Value::Bool(true)))?)
                }
                Operator::Not => {
                    if !operand.is_object() {
                        return Err(DocumentStoreError::invalid_filter(format!(
                            "$not requires an object, got {}",
                            json_kind(operand)
                        )));
                    }
                    negate(&self.element_or_array(array, rest, operand)?)
                }
                _ => self.either(array, rest, |compilation, path| {
                    compilation.operator(path, key, operand, object, Position::Value)
                })?,
            };
            parts.push(part);
        }
        Ok(conjunction(parts))
    }

    /// Builds "matches the value itself OR matches some element of the array".
    fn either<F>(&mut self, array: &JsonPath, rest: Option<&str>, mut condition: F) -> DocumentStoreResult<String>
    where
        F: FnMut(&mut Self, &JsonPath) -> DocumentStoreResult<String>,
    {
        let target = match rest {
            Some(rest) => array.join(rest)?,
            None => array.clone(),
        };
        let single = condition(self, &target)?;

        let alias = self.alias();
        let element = match rest {
            Some(rest) => array.element(&alias).join(rest)?,
            None => array.element(&alias),
        };
        let per_element = condition(self, &element)?;

        Ok(format!(
            "({single} OR ({} = 'array' AND EXISTS (SELECT 1 FROM {} WHERE {per_element})))",
            array.json_type(),
            array.each(&alias),
        ))
    }
}

fn lookup(key: &str) -> DocumentStoreResult<Operator> {
    Operator::from_name(key)
        .ok_or_else(|| DocumentStoreError::invalid_filter(format!("unknown operator '{key}'")))
}

fn has_operator_keys(object: &Map<String, Value>) -> bool {
    object.keys().any(|key| Operator::is_operator_key(key))
}

fn is_regex_options(key: &str, object: &Map<String, Value>) -> bool {
    key == Operator::Options.name() && object.contains_key(Operator::Regex.name())
}

fn mixed_keys(object: &Map<String, Value>) -> DocumentStoreError {
    let keys = object.keys().map(String::as_str).collect::<Vec<_>>().join(", ");
    DocumentStoreError::invalid_filter(format!(
        "cannot mix operators and field names in one condition: {{{keys}}}"
    ))
}

fn conjunction(mut parts: Vec<String>) -> String {
    match parts.len() {
        0 => TRUE.to_string(),
        1 => parts.remove(0),
        _ => format!("({})", parts.join(" AND ")),
    }
}

fn disjunction(mut parts: Vec<String>) -> String {
    match parts.len() {
        0 => FALSE.to_string(),
        1 => parts.remove(0),
        _ => format!("({})", parts.join(" OR ")),
    }
}

fn negate(condition: &str) -> String {
    format!("(NOT COALESCE({condition}, FALSE))")
}

fn boolean_type(flag: bool) -> &'static str {
    if flag { "true" } else { "false" }
}

fn list(operator: Operator, value: &Value) -> DocumentStoreResult<&[Value]> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(DocumentStoreError::invalid_filter(format!(
            "{operator} requires an array, got {}",
            json_kind(other)
        ))),
    }
}

fn equals(path: &JsonPath, value: &Value) -> String {
    match value {
        Value::Null => format!("{} IS NULL", path.extract()),
        Value::Bool(flag) => format!("{} = {}", path.json_type(), quote_string(boolean_type(*flag))),
        Value::Number(_) => format!("{} = {}", path.extract(), quote_value(value)),
        // arrays and objects extract as JSON text
        Value::String(_) => format!(
            "({} = 'text' AND {} = {})",
            path.json_type(),
            path.extract(),
            quote_value(value)
        ),
        Value::Array(_) | Value::Object(_) => format!(
            "({} = {} AND {} = {})",
            path.json_type(),
            quote_string(json_kind(value)),
            path.extract(),
            quote_json(value)
        ),
    }
}

fn not_equals(path: &JsonPath, value: &Value) -> String {
    match value {
        Value::Null => format!("{} IS NOT NULL", path.extract()),
        Value::Bool(flag) => format!("{} IS NOT {}", path.json_type(), quote_string(boolean_type(*flag))),
        Value::Number(_) => format!("{} IS NOT {}", path.extract(), quote_value(value)),
        Value::String(_) | Value::Array(_) | Value::Object(_) => negate(&equals(path, value)),
    }
}

fn compare(path: &JsonPath, symbol: &str, operand: &Value) -> DocumentStoreResult<String> {
    let guard = match operand {
        Value::Null if symbol.ends_with('=') => return Ok(format!("{} IS NULL", path.extract())),
        Value::Null => return Ok(FALSE.to_string()),
        Value::Number(_) => "IN ('integer', 'real')",
        Value::String(_) => "= 'text'",
        Value::Bool(_) => "IN ('true', 'false')",
        Value::Array(_) | Value::Object(_) => {
            return Err(DocumentStoreError::invalid_filter(format!(
                "cannot use '{symbol}' against an {}",
                json_kind(operand)
            )));
        }
    };
    Ok(format!(
        "({} {guard} AND {} {symbol} {})",
        path.json_type(),
        path.extract(),
        quote_value(operand)
    ))
}

/// Membership in a non-empty list of non-null values.
fn membership(path: &JsonPath, values: &[&Value]) -> String {
    if let [value] = values {
        return equals(path, value);
    }
    let (numbers, rest): (Vec<&Value>, Vec<&Value>) =
        values.iter().partition(|value| value.is_number());
    let (strings, rest): (Vec<&Value>, Vec<&Value>) =
        rest.into_iter().partition(|value| value.is_string());

    let mut parts = Vec::new();
    match numbers.as_slice() {
        [] => {}
        [number] => parts.push(equals(path, number)),
        _ => parts.push(format!("{} IN ({})", path.extract(), literals(&numbers))),
    }
    match strings.as_slice() {
        [] => {}
        [string] => parts.push(equals(path, string)),
        _ => parts.push(format!(
            "({} = 'text' AND {} IN ({}))",
            path.json_type(),
            path.extract(),
            literals(&strings)
        )),
    }
    parts.extend(rest.into_iter().map(|value| equals(path, value)));
    disjunction(parts)
}

fn literals(values: &[&Value]) -> String {
    values
        .iter()
        .map(|value| quote_value(value))
        .collect::<Vec<_>>()
        .join(", ")
}

fn is_in(path: &JsonPath, value: &Value) -> DocumentStoreResult<String> {
    let (nulls, values): (Vec<&Value>, Vec<&Value>) =
        list(Operator::In, value)?.iter().partition(|item| item.is_null());

    Ok(match (nulls.is_empty(), values.is_empty()) {
        (true, true) => FALSE.to_string(),
        (false, true) => format!("{} IS NULL", path.extract()),
        (true, false) => membership(path, &values),
        (false, false) => format!("({} IS NULL OR {})", path.extract(), membership(path, &values)),
    })
}

fn not_in(path: &JsonPath, value: &Value) -> DocumentStoreResult<String> {
    let (nulls, values): (Vec<&Value>, Vec<&Value>) =
        list(Operator::Nin, value)?.iter().partition(|item| item.is_null());

    Ok(match (nulls.is_empty(), values.as_slice()) {
        (true, []) => TRUE.to_string(),
        (false, []) => format!("{} IS NOT NULL", path.extract()),
        (true, [single]) => not_equals(path, single),
        (true, _) => negate(&membership(path, &values)),
        (false, _) => format!(
            "({} IS NOT NULL AND {})",
            path.extract(),
            negate(&membership(path, &values))
        ),
    })
}

fn exists(path: &JsonPath, value: &Value) -> DocumentStoreResult<String> {
    match value {
        Value::Bool(true) => Ok(format!("{} IS NOT NULL", path.json_type())),
        Value::Bool(false) => Ok(format!("{} IS NULL", path.json_type())),
        other => Err(DocumentStoreError::invalid_filter(format!(
            "$exists requires a boolean, got {}",
            json_kind(other)
        ))),
    }
}

fn size(path: &JsonPath, value: &Value) -> DocumentStoreResult<String> {
    let whole = value
        .as_f64()
        .filter(|length| length.fract() == 0.0 && *length >= 0.0 && *length <= u64::MAX as f64)
        .map(|length| length as u64);
    let length = value.as_u64().or(whole).ok_or_else(|| {
        DocumentStoreError::invalid_filter(format!(
            "$size only supports non-negative integers, got {value}"
        ))
    })?;
    Ok(format!(
        "({} = 'array' AND {} = {length})",
        path.json_type(),
        path.array_length()
    ))
}

fn regex(path: &JsonPath, pattern: &Value, options: Option<&Value>) -> DocumentStoreResult<String> {
    let Value::String(pattern) = pattern else {
        return Err(DocumentStoreError::invalid_filter(format!(
            "$regex requires a string pattern, got {}",
            json_kind(pattern)
        )));
    };
    let options = match options {
        None => "",
        Some(Value::String(options)) => options.as_str(),
        Some(other) => {
            return Err(DocumentStoreError::invalid_filter(format!(
                "$options must be a string, got {}",
                json_kind(other)
            )));
        }
    };

    let mut flags = String::new();
    for flag in options.chars() {
        match flag {
            'i' | 's' | 'm' | 'x' if !flags.contains(flag) => flags.push(flag),
            'i' | 's' | 'm' | 'x' => {}
            other => {
                return Err(DocumentStoreError::invalid_filter(format!(
                    "unsupported $regex option '{other}'"
                )));
            }
        }
    }

    let pattern = if flags.is_empty() {
        pattern.clone()
    } else {
        format!("(?{flags}){pattern}")
    };
    Regex::new(&pattern)
        .map_err(|e| DocumentStoreError::invalid_filter(format!("invalid $regex pattern: {e}")))?;

    Ok(pattern_match(path, &pattern))
}

fn text(path: &JsonPath, value: &Value) -> DocumentStoreResult<String> {
    let Value::Object(arguments) = value else {
        return Err(DocumentStoreError::invalid_filter(format!(
            "$text requires an object, got {}",
            json_kind(value)
        )));
    };

    let mut search = None;
    let mut case_sensitive = false;
    for (key, argument) in arguments {
        match (key.as_str(), argument) {
            ("$search", Value::String(text)) => search = Some(text),
            ("$caseSensitive", Value::Bool(flag)) => case_sensitive = *flag,
            ("$language" | "$diacriticSensitive", _) => {}
            ("$search" | "$caseSensitive", other) => {
                return Err(DocumentStoreError::invalid_filter(format!(
                    "$text argument {key} has the wrong type: {}",
                    json_kind(other)
                )));
            }
            _ => {
                return Err(DocumentStoreError::invalid_filter(format!(
                    "unsupported $text argument '{key}'"
                )));
            }
        }
    }
    let search =
        search.ok_or_else(|| DocumentStoreError::invalid_filter("$text requires a $search string"))?;

    let escaped = regex::escape(search);
    let pattern = if case_sensitive {
        escaped
    } else {
        format!("(?i){escaped}")
    };
    Ok(pattern_match(path, &pattern))
}

fn pattern_match(path: &JsonPath, pattern: &str) -> String {
    format!("CAST({} AS TEXT) REGEXP {}", path.extract(), quote_string(pattern))
}

fn type_names(code: &Value) -> DocumentStoreResult<&'static [&'static str]> {
    let names = match code {
        Value::Number(number) => match number.as_i64() {
            Some(1 | 16 | 18 | 19) => NUMBER_TYPES,
            Some(2) => TEXT_TYPES,
            Some(3) => OBJECT_TYPES,
            Some(4) => ARRAY_TYPES,
            Some(8) => BOOLEAN_TYPES,
            Some(10) => NULL_TYPES,
            _ => return Err(DocumentStoreError::invalid_filter(format!("unsupported $type code {code}"))),
        },
        Value::String(alias) => match alias.as_str() {
            "double" | "int" | "long" | "decimal" | "number" => NUMBER_TYPES,
            "string" => TEXT_TYPES,
            "object" => OBJECT_TYPES,
            "array" => ARRAY_TYPES,
            "bool" | "boolean" => BOOLEAN_TYPES,
            "null" => NULL_TYPES,
            _ => return Err(DocumentStoreError::invalid_filter(format!("unsupported $type alias '{alias}'"))),
        },
        other => {
            return Err(DocumentStoreError::invalid_filter(format!(
                "$type requires a number or string, got {}",
                json_kind(other)
            )));
        }
    };
    Ok(names)
}

fn type_check(path: &JsonPath, value: &Value) -> DocumentStoreResult<String> {
    let codes: Vec<&Value> = match value {
        Value::Array(codes) if codes.is_empty() => {
            return Err(DocumentStoreError::invalid_filter("$type requires at least one type"));
        }
        Value::Array(codes) => codes.iter().collect(),
        code => vec![code],
    };

    let mut names: Vec<&str> = Vec::new();
    for code in codes {
        for &name in type_names(code)? {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }

    let names = names
        .into_iter()
        .map(quote_string)
        .collect::<Vec<_>>()
        .join(", ");
    Ok(format!("{} IN ({names})", path.json_type()))
}

fn modulo(path: &JsonPath, value: &Value) -> DocumentStoreResult<String> {
    let [divisor, remainder] = list(Operator::Mod, value)? else {
        return Err(DocumentStoreError::invalid_filter(
            "$mod requires exactly two operands: [divisor, remainder]",
        ));
    };
    let divisor = integer_operand(divisor)?;
    let remainder = integer_operand(remainder)?;
    if divisor == 0 {
        return Err(DocumentStoreError::invalid_filter("$mod divisor cannot be zero"));
    }
    Ok(format!(
        "({} IN ('integer', 'real') AND CAST({} AS INTEGER) % {divisor} = {remainder})",
        path.json_type(),
        path.extract()
    ))
}

fn integer_operand(value: &Value) -> DocumentStoreResult<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float.trunc() as i64))
            .ok_or_else(|| DocumentStoreError::invalid_filter(format!("$mod operand {number} is out of range"))),
        other => Err(DocumentStoreError::invalid_filter(format!(
            "$mod operands must be numbers, got {}",
            json_kind(other)
        ))),
    }
}
