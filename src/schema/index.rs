//! Index Definitions
//!
//! A declared composite index over a root entity's attributes.

use crate::query::ConditionSet;

// == Index Definition ==
/// One declared index: the entity it belongs to, the attributes it covers
/// in declared order, and whether an entry may hold more than one
/// identifier.
///
/// Definitions are immutable once registration is finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDef {
    entity: String,
    attributes: Vec<String>,
    unique: bool,
}

impl IndexDef {
    /// Built by the registry, which owns all validation.
    pub(crate) fn new(entity: String, attributes: Vec<String>, unique: bool) -> Self {
        Self {
            entity,
            attributes,
            unique,
        }
    }

    /// The root entity the index is declared on.
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Covered attributes in declared order, lowercased.
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    pub fn unique(&self) -> bool {
        self.unique
    }

    // == Matching ==
    /// True when the condition set covers exactly this attribute set.
    ///
    /// A strict subset or superset of the attributes does not match; the
    /// cached entry could not answer such a query.
    pub fn matches(&self, set: &ConditionSet) -> bool {
        set.len() == self.attributes.len()
            && self.attributes.iter().all(|attr| set.value_of(attr).is_some())
    }
}
