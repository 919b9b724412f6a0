//! Scalar Values
//!
//! The value domain shared by condition clauses and record attributes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

/// Identifier assigned to a record by the underlying store.
pub type RecordId = u64;

// == Scalar Value ==
/// A single condition or attribute value.
///
/// Only shapes that compare exactly are representable; floats are not part
/// of the domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    /// Absent attribute value
    Null,
    Bool(bool),
    Integer(i64),
    Text(String),
}

impl ScalarValue {
    // == From Record Id ==
    /// Builds the value a record identifier compares as in a condition.
    pub fn from_id(id: RecordId) -> Self {
        ScalarValue::Integer(id as i64)
    }

    /// Returns true for the null value.
    pub fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Null => write!(f, "NULL"),
            ScalarValue::Bool(b) => write!(f, "{}", b),
            ScalarValue::Integer(n) => write!(f, "{}", n),
            ScalarValue::Text(s) => write!(f, "'{}'", s),
        }
    }
}

impl From<i64> for ScalarValue {
    fn from(value: i64) -> Self {
        ScalarValue::Integer(value)
    }
}

impl From<bool> for ScalarValue {
    fn from(value: bool) -> Self {
        ScalarValue::Bool(value)
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::Text(value.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        ScalarValue::Text(value)
    }
}

// == JSON Boundary ==
impl TryFrom<serde_json::Value> for ScalarValue {
    type Error = CacheError;

    /// Converts a loosely typed JSON value into the scalar domain.
    ///
    /// Numbers with a fractional part, numbers beyond i64 range, arrays and
    /// objects are rejected.
    fn try_from(value: serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Null => Ok(ScalarValue::Null),
            serde_json::Value::Bool(b) => Ok(ScalarValue::Bool(b)),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(ScalarValue::Integer)
                .ok_or_else(|| CacheError::UnsupportedValue(n.to_string())),
            serde_json::Value::String(s) => Ok(ScalarValue::Text(s)),
            other => Err(CacheError::UnsupportedValue(other.to_string())),
        }
    }
}
