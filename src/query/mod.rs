//! Query Module
//!
//! Request types, condition canonicalization and cache-eligibility
//! routing.

mod classifier;
mod conditions;
mod fragment;
mod request;
mod value;

pub use classifier::{Classifier, FallbackReason, RoutingDecision};
pub use conditions::{ConditionExpr, ConditionSet};
pub use request::{FindKind, FindOptions, FindRequest};
pub use value::{RecordId, ScalarValue};
