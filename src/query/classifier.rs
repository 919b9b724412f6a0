//! Eligibility Classifier
//!
//! Decides, per find request, whether the query provably corresponds to
//! one declared index or must be handed to the store untouched.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::cache::IndexKey;
use crate::error::{CacheError, Result};
use crate::query::{ConditionSet, FindKind, FindOptions, FindRequest, ScalarValue};
use crate::schema::SchemaRegistry;

// == Fallback Reason ==
/// Why a request was routed to the store instead of the cache.
///
/// Carried on the outcome so the caller can run the original query
/// unchanged; also the tag every routing log line carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FallbackReason {
    /// Caller asked for readonly records
    Readonly,
    /// Request carries a join clause
    Joins,
    /// Request eager-loads associations
    EagerLoad,
    /// Ancestor scope could not be canonicalized or contradicts the
    /// request conditions
    ScopeConditions,
    /// Neither identifiers nor conditions were given
    Unconditioned,
    /// Conditions fall outside the equality-conjunction subset
    ConditionShape,
    /// Identifiers and explicit conditions were combined
    IdWithConditions,
    /// No declared index covers exactly this attribute set
    NoMatchingIndex,
    /// Limit or offset on a request shape that cannot be windowed
    Pagination,
}

impl FallbackReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackReason::Readonly => "readonly",
            FallbackReason::Joins => "joins",
            FallbackReason::EagerLoad => "eager-load",
            FallbackReason::ScopeConditions => "scope-conditions",
            FallbackReason::Unconditioned => "unconditioned",
            FallbackReason::ConditionShape => "condition-shape",
            FallbackReason::IdWithConditions => "id-with-conditions",
            FallbackReason::NoMatchingIndex => "no-matching-index",
            FallbackReason::Pagination => "pagination",
        }
    }
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// == Routing Decision ==
/// The classifier's verdict on one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingDecision {
    /// Serve from cache by consulting these keys in order. Identifier
    /// finds produce one key per distinct identifier; condition finds
    /// exactly one.
    CacheEligible(Vec<IndexKey>),
    /// Hand the request to the store untouched.
    Fallback(FallbackReason),
}

// == Classifier ==
/// Applies the routing gates in order against the registered schema.
pub struct Classifier {
    schema: Arc<SchemaRegistry>,
}

impl Classifier {
    pub fn new(schema: Arc<SchemaRegistry>) -> Self {
        Self { schema }
    }

    // == Classify ==
    /// Routes one find request.
    ///
    /// The error channel carries programming errors only; every
    /// legitimate reason not to use the cache is a Fallback decision.
    ///
    /// Gates run in a fixed order: forcing options, ancestor scope,
    /// identifier shorthand, condition normalization, index matching,
    /// and finally windowing.
    pub fn classify(&self, request: &FindRequest) -> Result<RoutingDecision> {
        self.schema.entity(&request.entity)?;

        let options = &request.options;
        if options.readonly {
            return Ok(fallback(request, FallbackReason::Readonly));
        }
        if options.joins.is_some() {
            return Ok(fallback(request, FallbackReason::Joins));
        }
        if options.includes.is_some() {
            return Ok(fallback(request, FallbackReason::EagerLoad));
        }

        let scope = match &options.scope {
            Some(expr) => match expr.normalize() {
                Some(set) => set,
                None => return Ok(fallback(request, FallbackReason::ScopeConditions)),
            },
            None => ConditionSet::empty(),
        };

        if !request.ids.is_empty() {
            if request.conditions.is_some() {
                return Ok(fallback(request, FallbackReason::IdWithConditions));
            }
            return self.classify_by_ids(request, &scope);
        }

        let conditions = match &request.conditions {
            Some(expr) => match expr.normalize() {
                Some(set) => set,
                None => return Ok(fallback(request, FallbackReason::ConditionShape)),
            },
            None => ConditionSet::empty(),
        };
        let merged = match conditions.merge(&scope) {
            Some(set) => set,
            None => return Ok(fallback(request, FallbackReason::ScopeConditions)),
        };
        if merged.is_empty() {
            // A whole-table entry is never enumerable from the cache.
            return Ok(fallback(request, FallbackReason::Unconditioned));
        }

        let index = match self.schema.match_index(&request.entity, &merged)? {
            Some(index) => index,
            None => return Ok(fallback(request, FallbackReason::NoMatchingIndex)),
        };
        if windowed(options) && !window_supported(options, index.unique()) {
            return Ok(fallback(request, FallbackReason::Pagination));
        }

        let key = IndexKey::from_set(index, &merged);
        debug!(entity = %request.entity, %key, "find eligible for cache");
        Ok(RoutingDecision::CacheEligible(vec![key]))
    }

    // == Identifier Shorthand ==
    /// An identifier find is an implicit equality on the primary key.
    /// The condition normalizer is never consulted here. Repeated
    /// identifiers collapse to their first occurrence.
    fn classify_by_ids(
        &self,
        request: &FindRequest,
        scope: &ConditionSet,
    ) -> Result<RoutingDecision> {
        let root = self.schema.root_of(&request.entity)?;
        let pk = match root.primary_key() {
            Some(pk) => pk,
            None => {
                return Err(CacheError::InvalidSchema(format!(
                    "root {} has no primary key",
                    root.name()
                )))
            }
        };

        let mut sets = Vec::with_capacity(request.ids.len());
        let mut seen = Vec::with_capacity(request.ids.len());
        for id in &request.ids {
            if seen.contains(id) {
                continue;
            }
            seen.push(*id);
            let merged = match ConditionSet::single(pk, ScalarValue::from_id(*id)).merge(scope) {
                Some(set) => set,
                None => return Ok(fallback(request, FallbackReason::ScopeConditions)),
            };
            sets.push(merged);
        }
        let Some(first) = sets.first() else {
            return Ok(fallback(request, FallbackReason::Unconditioned));
        };

        // The attribute set is the same for every identifier, so one
        // match covers them all.
        let index = match self.schema.match_index(&request.entity, first)? {
            Some(index) => index,
            None => return Ok(fallback(request, FallbackReason::NoMatchingIndex)),
        };
        if windowed(&request.options) && !window_supported(&request.options, index.unique()) {
            return Ok(fallback(request, FallbackReason::Pagination));
        }

        let keys: Vec<IndexKey> = sets.iter().map(|set| IndexKey::from_set(index, set)).collect();
        debug!(
            entity = %request.entity,
            count = keys.len(),
            "identifier find eligible for cache"
        );
        Ok(RoutingDecision::CacheEligible(keys))
    }
}

fn fallback(request: &FindRequest, reason: FallbackReason) -> RoutingDecision {
    debug!(entity = %request.entity, %reason, "find routed to store");
    RoutingDecision::Fallback(reason)
}

fn windowed(options: &FindOptions) -> bool {
    options.limit.is_some() || options.offset.is_some()
}

/// Windowing only makes sense over an all-results read of an entry that
/// can hold more than one identifier.
fn window_supported(options: &FindOptions, unique: bool) -> bool {
    options.kind == FindKind::All && !unique
}
