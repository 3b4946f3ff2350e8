//! Filter operator names.

use std::fmt;

/// Every operator understood by the filter compiler.
///
/// Operator keys in a filter document start with `$`. A key that starts with
/// `$` but is not listed here is rejected at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    Nin,
    And,
    Or,
    Nor,
    Not,
    Exists,
    Size,
    All,
    ElemMatch,
    Regex,
    /// Flags for a sibling `$regex`; never valid on its own.
    Options,
    Text,
    Type,
    Mod,
}

/// Wire name to operator lookup table.
const OPERATORS: [(&str, Operator); 21] = [
    ("$eq", Operator::Eq),
    ("$ne", Operator::Ne),
    ("$gt", Operator::Gt),
    ("$gte", Operator::Gte),
    ("$lt", Operator::Lt),
    ("$lte", Operator::Lte),
    ("$in", Operator::In),
    ("$nin", Operator::Nin),
    ("$and", Operator::And),
    ("$or", Operator::Or),
    ("$nor", Operator::Nor),
    ("$not", Operator::Not),
    ("$exists", Operator::Exists),
    ("$size", Operator::Size),
    ("$all", Operator::All),
    ("$elemMatch", Operator::ElemMatch),
    ("$regex", Operator::Regex),
    ("$options", Operator::Options),
    ("$text", Operator::Text),
    ("$type", Operator::Type),
    ("$mod", Operator::Mod),
];

/// The character that marks a filter key as an operator.
pub const OPERATOR_PREFIX: char = '$';

impl Operator {
    /// Looks up an operator by its wire name, e.g. `"$gt"`.
    pub fn from_name(name: &str) -> Option<Self> {
        OPERATORS
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, operator)| *operator)
    }

    /// Returns the wire name of the operator.
    pub fn name(self) -> &'static str {
        OPERATORS
            .iter()
            .find(|(_, operator)| *operator == self)
            .map(|(name, _)| *name)
            .unwrap_or("$unknown")
    }

    /// Returns `true` if `key` is written as an operator, whether or not it is known.
    pub fn is_operator_key(key: &str) -> bool {
        key.starts_with(OPERATOR_PREFIX)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
