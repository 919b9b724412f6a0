//! Error types for the lookup cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

use crate::query::RecordId;

// == Cache Error Enum ==
/// Unified error type for the lookup cache.
///
/// Routing a query away from the cache is never an error. Everything here
/// is either a configuration mistake, a programming error, or a reported
/// data-integrity problem.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Entity was never registered with the schema
    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    /// An index over the same attribute set is already declared
    #[error("Ambiguous index on {entity}: attribute set ({attributes}) is already declared")]
    AmbiguousIndex { entity: String, attributes: String },

    /// Schema registration received invalid input
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// A write would put a second identifier into a unique index entry
    #[error("Uniqueness violation on {entity} ({attributes}): entry already holds an identifier other than {id}")]
    UniquenessViolation {
        entity: String,
        attributes: String,
        id: RecordId,
    },

    /// Value outside the supported scalar domain
    #[error("Unsupported value: {0}")]
    UnsupportedValue(String),
}

// == Result Type Alias ==
/// Convenience Result type for the lookup cache.
pub type Result<T> = std::result::Result<T, CacheError>;
