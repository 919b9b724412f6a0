//! Condition Expressions
//!
//! The closed set of condition surface forms and their canonical form.

use serde::{Deserialize, Serialize};

use super::fragment;
use super::value::ScalarValue;

// == Condition Expression ==
/// A condition expression as received from the caller.
///
/// Every surface form an eligible query can arrive in is a variant here.
/// Anything that cannot be represented cannot be classified and goes to
/// the store untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConditionExpr {
    /// Attribute to value pairs, order irrelevant
    Mapping(Vec<(String, ScalarValue)>),
    /// Clause text with positional placeholders bound from `params`
    Template {
        text: String,
        params: Vec<ScalarValue>,
    },
    /// Literal clause text
    Fragment(String),
}

impl ConditionExpr {
    /// Builds a mapping expression from attribute/value pairs.
    pub fn mapping<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<ScalarValue>,
    {
        ConditionExpr::Mapping(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// Builds a parameterized template expression.
    pub fn template(text: impl Into<String>, params: Vec<ScalarValue>) -> Self {
        ConditionExpr::Template {
            text: text.into(),
            params,
        }
    }

    /// Builds a literal fragment expression.
    pub fn fragment(text: impl Into<String>) -> Self {
        ConditionExpr::Fragment(text.into())
    }

    // == Normalize ==
    /// Canonicalizes the expression into an attribute/value set.
    ///
    /// Returns None when any part of the expression falls outside the
    /// equality-conjunction subset, including a duplicated attribute name.
    /// Partial canonicalization never happens.
    pub fn normalize(&self) -> Option<ConditionSet> {
        let pairs = match self {
            ConditionExpr::Mapping(pairs) => pairs.clone(),
            ConditionExpr::Template { text, params } => fragment::parse_conditions(text, params)?,
            ConditionExpr::Fragment(text) => fragment::parse_conditions(text, &[])?,
        };
        ConditionSet::from_pairs(pairs)
    }
}

// == Condition Set ==
/// The canonical form of a normalized condition expression.
///
/// Pairs are sorted by attribute name and attribute names are unique, so
/// equality and hashing are independent of the order the caller wrote the
/// conditions in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConditionSet {
    pairs: Vec<(String, ScalarValue)>,
}

impl ConditionSet {
    /// Builds a canonical set from pairs, or None on a duplicated
    /// attribute name. Attribute names are lowercased.
    pub fn from_pairs(pairs: Vec<(String, ScalarValue)>) -> Option<Self> {
        let mut pairs: Vec<(String, ScalarValue)> = pairs
            .into_iter()
            .map(|(attr, value)| (attr.to_ascii_lowercase(), value))
            .collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        if pairs.windows(2).any(|w| w[0].0 == w[1].0) {
            return None;
        }
        Some(Self { pairs })
    }

    /// The set with no conditions.
    pub fn empty() -> Self {
        Self { pairs: Vec::new() }
    }

    /// A set holding exactly one condition.
    pub fn single(attribute: &str, value: ScalarValue) -> Self {
        Self {
            pairs: vec![(attribute.to_ascii_lowercase(), value)],
        }
    }

    /// The sorted attribute/value pairs.
    pub fn pairs(&self) -> &[(String, ScalarValue)] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Looks up the value bound to an attribute.
    pub fn value_of(&self, attribute: &str) -> Option<&ScalarValue> {
        let attribute = attribute.to_ascii_lowercase();
        self.pairs
            .binary_search_by(|(attr, _)| attr.as_str().cmp(attribute.as_str()))
            .ok()
            .map(|i| &self.pairs[i].1)
    }

    // == Merge ==
    /// Unions two sets.
    ///
    /// An attribute bound to the same value on both sides collapses to one
    /// pair. An attribute bound to different values is a contradiction and
    /// yields None.
    pub fn merge(&self, other: &ConditionSet) -> Option<ConditionSet> {
        let mut merged = self.pairs.clone();
        for (attr, value) in &other.pairs {
            match self.value_of(attr) {
                Some(existing) if existing == value => {}
                Some(_) => return None,
                None => merged.push((attr.clone(), value.clone())),
            }
        }
        merged.sort_by(|a, b| a.0.cmp(&b.0));
        Some(ConditionSet { pairs: merged })
    }
}
