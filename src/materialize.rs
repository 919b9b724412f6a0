//! Result Materialization
//!
//! Turns a cached identifier sequence into the caller's result shape:
//! subtype filtering first, then windowing.

use tracing::warn;

use crate::error::Result;
use crate::query::RecordId;
use crate::schema::SchemaRegistry;
use crate::store::RecordStore;

// == Apply Window ==
/// Applies offset then limit to an identifier sequence.
///
/// An offset past the end yields an empty result; a limit larger than the
/// remainder yields the remainder.
pub fn apply_window(ids: &[RecordId], limit: Option<usize>, offset: Option<usize>) -> Vec<RecordId> {
    let start = offset.unwrap_or(0).min(ids.len());
    let mut window = ids[start..].to_vec();
    if let Some(limit) = limit {
        window.truncate(limit);
    }
    window
}

// == Take First ==
/// The first identifier of the sequence, for first-record requests.
pub fn take_first(ids: &[RecordId]) -> Option<RecordId> {
    ids.first().copied()
}

// == Filter Subtypes ==
/// Drops identifiers whose stored subtype tag falls outside the branch
/// of the hierarchy the query named.
///
/// Root queries accept every subtype and pass through unfiltered. An
/// identifier whose tag cannot be resolved is dropped: serving a record
/// of unknown subtype would be a correctness bet, not a cache hit.
pub fn filter_subtypes<S: RecordStore>(
    schema: &SchemaRegistry,
    store: &S,
    entity: &str,
    ids: Vec<RecordId>,
) -> Result<Vec<RecordId>> {
    if schema.is_root(entity)? {
        return Ok(ids);
    }

    let root = schema.root_of(entity)?;
    let allowed = schema.query_types(entity)?;
    let mut kept = Vec::with_capacity(ids.len());
    for id in ids {
        match store.type_of(root.name(), id) {
            Some(tag) if allowed.iter().any(|t| t == &tag) => kept.push(id),
            Some(_) => {}
            None => warn!(entity, id, "dropping identifier with unresolved subtype"),
        }
    }
    Ok(kept)
}
