//! Helpers for building filter documents.
//!
//! Filters are plain JSON values, so they can always be written with
//! `serde_json::json!`. The [`Filter`] helpers build the same documents from
//! Rust values and are handy when field names or operands are computed:
//!
//! ```ignore
//! use docsql::query::{Filter, FilterExt};
//!
//! let filter = Filter::eq("status", "A")
//!     .and(Filter::lt("qty", 30))
//!     .or(Filter::exists("item", false));
//! ```
//!
//! - Comparison: `eq`, `ne`, `gt`, `gte`, `lt`, `lte`
//! - Membership: `is_in`, `not_in`
//! - Structure: `exists`, `size`, `all`, `elem_match`
//! - Text: `regex`, `text`
//! - Logical: `and`, `or`, `nor`, `not`
//! - Identity: `id`

use serde_json::{Map, Value, json};

use crate::document::ID_FIELD;
use crate::filter::Operator;

/// Static constructors for filter documents.
pub struct Filter;

impl Filter {
    fn condition(field: impl Into<String>, operator: Operator, operand: Value) -> Value {
        let mut condition = Map::new();
        condition.insert(operator.name().to_string(), operand);
        let mut filter = Map::new();
        filter.insert(field.into(), Value::Object(condition));
        Value::Object(filter)
    }

    fn combine(operator: Operator, filters: impl IntoIterator<Item = Value>) -> Value {
        json!({ operator.name(): filters.into_iter().collect::<Vec<_>>() })
    }

    /// Matches documents whose `_id` equals `id`.
    pub fn id(id: impl Into<String>) -> Value {
        json!({ ID_FIELD: id.into() })
    }

    /// Matches documents where `field` equals `value`. Objects and arrays match exactly.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Value {
        Self::condition(field, Operator::Eq, value.into())
    }

    /// Matches documents where `field` does not equal `value`, including documents without it.
    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Value {
        Self::condition(field, Operator::Ne, value.into())
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Value {
        Self::condition(field, Operator::Gt, value.into())
    }

    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Value {
        Self::condition(field, Operator::Gte, value.into())
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Value {
        Self::condition(field, Operator::Lt, value.into())
    }

    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Value {
        Self::condition(field, Operator::Lte, value.into())
    }

    /// Matches documents where `field` equals one of `values`.
    ///
    /// A `null` entry also matches documents that lack the field.
    pub fn is_in<V: Into<Value>>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Value {
        Self::condition(field, Operator::In, Value::Array(values.into_iter().map(Into::into).collect()))
    }

    /// Matches documents where `field` equals none of `values`.
    pub fn not_in<V: Into<Value>>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Value {
        Self::condition(field, Operator::Nin, Value::Array(values.into_iter().map(Into::into).collect()))
    }

    /// Matches documents where `field` is present (`true`) or absent (`false`).
    ///
    /// A field holding `null` is present.
    pub fn exists(field: impl Into<String>, present: bool) -> Value {
        Self::condition(field, Operator::Exists, Value::Bool(present))
    }

    /// Matches documents where `field` is an array of exactly `length` elements.
    pub fn size(field: impl Into<String>, length: u64) -> Value {
        Self::condition(field, Operator::Size, Value::from(length))
    }

    /// Matches documents where the array `field` contains every one of `values`.
    pub fn all<V: Into<Value>>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Value {
        Self::condition(field, Operator::All, Value::Array(values.into_iter().map(Into::into).collect()))
    }

    /// Matches documents where the array `field` has an element satisfying `condition`.
    pub fn elem_match(field: impl Into<String>, condition: Value) -> Value {
        Self::condition(field, Operator::ElemMatch, condition)
    }

    /// Matches documents where `field`, read as text, matches `pattern`.
    ///
    /// `options` may combine the flags `i`, `s`, `m` and `x`.
    pub fn regex(field: impl Into<String>, pattern: impl Into<String>, options: &str) -> Value {
        let mut condition = Map::new();
        condition.insert(Operator::Regex.name().to_string(), Value::String(pattern.into()));
        if !options.is_empty() {
            condition.insert(Operator::Options.name().to_string(), Value::String(options.to_string()));
        }
        let mut filter = Map::new();
        filter.insert(field.into(), Value::Object(condition));
        Value::Object(filter)
    }

    /// Case-insensitive literal search over the text of each whole document.
    pub fn text(search: impl Into<String>) -> Value {
        json!({ Operator::Text.name(): { "$search": search.into() } })
    }

    pub fn and(filters: impl IntoIterator<Item = Value>) -> Value {
        Self::combine(Operator::And, filters)
    }

    pub fn or(filters: impl IntoIterator<Item = Value>) -> Value {
        Self::combine(Operator::Or, filters)
    }

    /// Matches documents that satisfy none of `filters`.
    pub fn nor(filters: impl IntoIterator<Item = Value>) -> Value {
        Self::combine(Operator::Nor, filters)
    }

    /// Matches documents where `field` does not satisfy `condition`, including
    /// documents without the field.
    pub fn not(field: impl Into<String>, condition: Value) -> Value {
        Self::condition(field, Operator::Not, condition)
    }
}

/// Chainable combinators for filter documents.
pub trait FilterExt {
    /// Combines this filter with another using `$and`.
    ///
    /// If this filter is already a lone `$and`, `other` is appended to it.
    fn and(self, other: Value) -> Value;

    /// Combines this filter with another using `$or`.
    ///
    /// If this filter is already a lone `$or`, `other` is appended to it.
    fn or(self, other: Value) -> Value;
}

impl FilterExt for Value {
    fn and(self, other: Value) -> Value {
        chain(self, Operator::And, other)
    }

    fn or(self, other: Value) -> Value {
        chain(self, Operator::Or, other)
    }
}

fn chain(filter: Value, operator: Operator, other: Value) -> Value {
    match filter {
        Value::Object(mut object) if object.len() == 1 => match object.get_mut(operator.name()) {
            Some(Value::Array(entries)) => {
                entries.push(other);
                Value::Object(object)
            }
            _ => Filter::combine(operator, [Value::Object(object), other]),
        },
        filter => Filter::combine(operator, [filter, other]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_field_conditions() {
        assert_eq!(Filter::eq("status", "D"), json!({ "status": { "$eq": "D" } }));
        assert_eq!(Filter::gt("qty", 30), json!({ "qty": { "$gt": 30 } }));
        assert_eq!(Filter::is_in("status", ["A", "D"]), json!({ "status": { "$in": ["A", "D"] } }));
        assert_eq!(Filter::exists("item", false), json!({ "item": { "$exists": false } }));
        assert_eq!(Filter::size("tags", 3), json!({ "tags": { "$size": 3 } }));
        assert_eq!(Filter::id("abc"), json!({ "_id": "abc" }));
    }

    #[test]
    fn regex_omits_empty_options() {
        assert_eq!(Filter::regex("name", "^a", ""), json!({ "name": { "$regex": "^a" } }));
        assert_eq!(
            Filter::regex("name", "^a", "i"),
            json!({ "name": { "$regex": "^a", "$options": "i" } })
        );
    }

    #[test]
    fn chaining_appends_to_existing_combinators() {
        let filter = Filter::eq("a", 1).and(Filter::eq("b", 2)).and(Filter::eq("c", 3));
        assert_eq!(
            filter,
            json!({ "$and": [{ "a": { "$eq": 1 } }, { "b": { "$eq": 2 } }, { "c": { "$eq": 3 } }] })
        );

        let filter = Filter::eq("a", 1).and(Filter::eq("b", 2)).or(Filter::eq("c", 3));
        assert_eq!(
            filter,
            json!({ "$or": [{ "$and": [{ "a": { "$eq": 1 } }, { "b": { "$eq": 2 } }] }, { "c": { "$eq": 3 } }] })
        );
    }

    #[test]
    fn built_filters_compile() {
        let filter = Filter::nor([Filter::elem_match("results", json!({ "score": { "$gte": 8 } }))])
            .and(Filter::not("price", json!({ "$gt": 1.99 })))
            .and(Filter::text("oscar"));
        assert!(crate::filter::compile("data", &filter).is_ok());
    }
}
