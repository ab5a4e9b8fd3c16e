//! Comparison operators of conditions and filters.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Operator symbols understood by the evaluator, in suggestion order.
pub const SUPPORTED_OPERATORS: &[&str] = &[">", "<", "=", "IN"];

/// Comparison applied by a condition or filter.
///
/// Parsing never fails: a symbol outside [`SUPPORTED_OPERATORS`] is kept as
/// [`Operator::Unknown`] and makes its criterion evaluate to `false`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    /// `=`: exact string equality.
    Eq,
    /// `IN`: membership in a comma-separated list.
    In,
    /// `<`: strict numeric less-than.
    Lt,
    /// `>`: strict numeric greater-than.
    Gt,
    Unknown(String),
}

impl Operator {
    pub fn parse(symbol: &str) -> Self {
        match symbol {
            "=" => Operator::Eq,
            "IN" => Operator::In,
            "<" => Operator::Lt,
            ">" => Operator::Gt,
            other => Operator::Unknown(other.to_string()),
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            Operator::Eq => "=",
            Operator::In => "IN",
            Operator::Lt => "<",
            Operator::Gt => ">",
            Operator::Unknown(s) => s,
        }
    }

    /// Whether the operator compares numbers.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Operator::Lt | Operator::Gt)
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Operator::Unknown(_))
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl From<String> for Operator {
    fn from(value: String) -> Self {
        Operator::parse(&value)
    }
}

impl From<&str> for Operator {
    fn from(value: &str) -> Self {
        Operator::parse(value)
    }
}

impl From<Operator> for String {
    fn from(value: Operator) -> Self {
        match value {
            Operator::Unknown(s) => s,
            known => known.symbol().to_string(),
        }
    }
}
