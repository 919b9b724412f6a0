//! Cache Entry Module
//!
//! Defines the ordered identifier sequence stored under one index key.

use crate::query::RecordId;

// == Index Entry ==
/// The identifier sequence cached for one index key.
///
/// Insertion order is preserved so windowed reads stay stable. An entry
/// holding zero identifiers is the known-empty state: the key was
/// resolved and provably matches no record, which is different from the
/// key never having been populated at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexEntry {
    ids: Vec<RecordId>,
}

impl IndexEntry {
    // == Constructors ==
    /// Creates an entry holding the given identifiers in order.
    pub fn new(ids: Vec<RecordId>) -> Self {
        Self { ids }
    }

    /// Creates the known-empty entry.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The identifiers in insertion order.
    pub fn ids(&self) -> &[RecordId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.ids.contains(&id)
    }

    // == Append ==
    /// Adds an identifier at the end of the sequence.
    ///
    /// An identifier that is already present keeps its original
    /// position; the entry never holds duplicates.
    pub fn append(&mut self, id: RecordId) {
        if !self.contains(id) {
            self.ids.push(id);
        }
    }

    // == Remove ==
    /// Removes the first occurrence of the identifier.
    ///
    /// Removing the last identifier leaves the entry in the known-empty
    /// state rather than deleting it.
    ///
    /// # Returns
    /// - `true` if the identifier was present and removed
    /// - `false` if the entry did not hold it
    pub fn remove(&mut self, id: RecordId) -> bool {
        match self.ids.iter().position(|&held| held == id) {
            Some(index) => {
                self.ids.remove(index);
                true
            }
            None => false,
        }
    }
}
