//! Index Keys
//!
//! The addressing unit for cached identifier sequences.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::query::{ConditionSet, ScalarValue};
use crate::schema::IndexDef;

// == Index Key ==
/// Identifies one cached entry: the root entity, the matched index's
/// attributes in declared order, and one value per attribute.
///
/// Keys built from the same logical conditions are equal regardless of
/// the order the caller wrote them in, because values are arranged in the
/// index's declared order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct IndexKey {
    entity: String,
    attributes: Vec<String>,
    values: Vec<ScalarValue>,
}

impl IndexKey {
    // == From Condition Set ==
    /// Builds the key for a condition set that matched the index.
    pub fn from_set(index: &IndexDef, set: &ConditionSet) -> Self {
        let values = index
            .attributes()
            .iter()
            .map(|attr| set.value_of(attr).cloned().unwrap_or(ScalarValue::Null))
            .collect();
        Self {
            entity: index.entity().to_string(),
            attributes: index.attributes().to_vec(),
            values,
        }
    }

    // == From Record Attributes ==
    /// Builds the key a record's current attributes fall under.
    ///
    /// An attribute the record does not carry indexes as NULL.
    pub fn from_record(index: &IndexDef, attrs: &HashMap<String, ScalarValue>) -> Self {
        let values = index
            .attributes()
            .iter()
            .map(|attr| attrs.get(attr).cloned().unwrap_or(ScalarValue::Null))
            .collect();
        Self {
            entity: index.entity().to_string(),
            attributes: index.attributes().to_vec(),
            values,
        }
    }

    /// The root entity the key belongs to.
    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    pub fn values(&self) -> &[ScalarValue] {
        &self.values
    }
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[", self.entity)?;
        for (i, (attr, value)) in self.attributes.iter().zip(&self.values).enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", attr, value)?;
        }
        write!(f, "]")
    }
}
