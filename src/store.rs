//! Record Store Collaborator
//!
//! The seam between the cache and whatever actually persists records.

use std::sync::Arc;

use crate::cache::IndexKey;
use crate::query::RecordId;

// == Record Store Trait ==
/// The persistence collaborator the cache fronts.
///
/// All three operations are invoked while no cache lock is held, so an
/// implementation is free to block on I/O. Entity names passed in are
/// always hierarchy roots.
pub trait RecordStore {
    /// The hydrated record type.
    type Record;

    /// Hydrates records for the given identifiers, preserving their
    /// order. Identifiers the store does not know are skipped.
    fn fetch(&self, entity: &str, ids: &[RecordId]) -> Vec<Self::Record>;

    /// Answers the equality conditions encoded in the key with the
    /// matching identifiers in natural creation order. Used to populate
    /// entries on a cache miss.
    fn ids_for(&self, key: &IndexKey) -> Vec<RecordId>;

    /// The concrete subtype of a record, named by its registered entity
    /// (a root record reports the root itself), or None when the record
    /// is unknown.
    fn type_of(&self, entity: &str, id: RecordId) -> Option<String>;
}

impl<S: RecordStore + ?Sized> RecordStore for Arc<S> {
    type Record = S::Record;

    fn fetch(&self, entity: &str, ids: &[RecordId]) -> Vec<Self::Record> {
        (**self).fetch(entity, ids)
    }

    fn ids_for(&self, key: &IndexKey) -> Vec<RecordId> {
        (**self).ids_for(key)
    }

    fn type_of(&self, entity: &str, id: RecordId) -> Option<String> {
        (**self).type_of(entity, id)
    }
}
