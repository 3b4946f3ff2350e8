//! Filter documents and their compilation to SQL.
//!
//! Filters use the MongoDB query language: field names map to literal values
//! (implying equality) or to operator objects such as `{"$gt": 30}`, and
//! `$and`, `$or`, `$nor` and `$not` combine sub-filters.
//!
//! [`FilterCompiler`] turns a filter into a boolean SQL expression over the
//! JSON document column. Compilation is pure: it never touches storage and
//! reports every structural problem as
//! [`DocumentStoreError::InvalidFilter`](crate::error::DocumentStoreError::InvalidFilter).

mod compiler;
mod operator;
mod path;
pub mod quote;

pub use compiler::{FilterCompiler, compile};
pub use operator::{OPERATOR_PREFIX, Operator};
