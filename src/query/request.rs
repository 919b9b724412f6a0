//! Find Requests
//!
//! The lookup request surface handed to the classifier by the caller.

use serde::{Deserialize, Serialize};

use super::conditions::ConditionExpr;
use super::value::{RecordId, ScalarValue};

// == Find Kind ==
/// Whether the caller wants the first matching record or all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FindKind {
    First,
    #[default]
    All,
}

// == Find Options ==
/// Modifiers attached to a find request.
///
/// Several of these force the request to the store regardless of the
/// conditions: readonly requests, joins, eager-loaded associations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FindOptions {
    #[serde(default)]
    pub kind: FindKind,
    /// Caller asked for readonly records
    #[serde(default)]
    pub readonly: bool,
    /// Join clause text, opaque to the cache
    #[serde(default)]
    pub joins: Option<String>,
    /// Associations to eager-load
    #[serde(default)]
    pub includes: Option<Vec<String>>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
    /// Conditions inherited from an ancestor scope
    #[serde(default)]
    pub scope: Option<ConditionExpr>,
}

// == Find Request ==
/// A single lookup request against one entity.
///
/// Identifier lookups carry `ids`; condition lookups carry `conditions`.
/// Carrying both at once is never cache-served.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindRequest {
    pub entity: String,
    #[serde(default)]
    pub ids: Vec<RecordId>,
    #[serde(default)]
    pub conditions: Option<ConditionExpr>,
    #[serde(default)]
    pub options: FindOptions,
}

impl FindRequest {
    // == Constructors ==
    /// A request with no identifiers and no conditions.
    pub fn new(entity: &str) -> Self {
        Self {
            entity: entity.to_string(),
            ids: Vec::new(),
            conditions: None,
            options: FindOptions::default(),
        }
    }

    /// Lookup of a single record by identifier.
    pub fn by_id(entity: &str, id: RecordId) -> Self {
        Self::by_ids(entity, vec![id])
    }

    /// Lookup of several records by identifier, results in request order.
    pub fn by_ids(entity: &str, ids: Vec<RecordId>) -> Self {
        let mut request = Self::new(entity);
        request.ids = ids;
        request
    }

    /// First record matching the conditions.
    pub fn first(entity: &str, conditions: ConditionExpr) -> Self {
        let mut request = Self::new(entity);
        request.conditions = Some(conditions);
        request.options.kind = FindKind::First;
        request
    }

    /// All records matching the conditions.
    pub fn all(entity: &str, conditions: ConditionExpr) -> Self {
        let mut request = Self::new(entity);
        request.conditions = Some(conditions);
        request
    }

    /// The `find_by_<attribute>` shorthand: first record with the
    /// attribute equal to the value.
    pub fn by_attribute(entity: &str, attribute: &str, value: impl Into<ScalarValue>) -> Self {
        Self::first(entity, ConditionExpr::mapping(vec![(attribute, value.into())]))
    }

    // == Option Setters ==
    pub fn kind(mut self, kind: FindKind) -> Self {
        self.options.kind = kind;
        self
    }

    pub fn readonly(mut self) -> Self {
        self.options.readonly = true;
        self
    }

    pub fn joins(mut self, clause: &str) -> Self {
        self.options.joins = Some(clause.to_string());
        self
    }

    pub fn includes(mut self, associations: &[&str]) -> Self {
        self.options.includes = Some(associations.iter().map(|a| a.to_string()).collect());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.options.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.options.offset = Some(offset);
        self
    }

    /// Attaches conditions inherited from an ancestor scope.
    pub fn scoped(mut self, scope: ConditionExpr) -> Self {
        self.options.scope = Some(scope);
        self
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let request = FindRequest::new("stories");
        assert!(request.ids.is_empty());
        assert!(request.conditions.is_none());
        assert_eq!(request.options.kind, FindKind::All);
        assert!(!request.options.readonly);
    }

    #[test]
    fn test_by_attribute_is_first_kind() {
        let request = FindRequest::by_attribute("stories", "title", "x");
        assert_eq!(request.options.kind, FindKind::First);
        assert!(request.conditions.is_some());
    }

    #[test]
    fn test_option_setters() {
        let request = FindRequest::by_id("stories", 1)
            .readonly()
            .limit(2)
            .offset(1);
        assert!(request.options.readonly);
        assert_eq!(request.options.limit, Some(2));
        assert_eq!(request.options.offset, Some(1));
    }

    #[test]
    fn test_request_deserialize() {
        let json = r#"{"entity": "stories", "ids": [3]}"#;
        let request: FindRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.entity, "stories");
        assert_eq!(request.ids, vec![3]);
        assert!(request.conditions.is_none());
        assert_eq!(request.options.kind, FindKind::All);
    }
}
