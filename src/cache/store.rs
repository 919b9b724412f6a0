//! Cache Store Module
//!
//! The composite index cache: per-entity entry tables, read-side
//! population and synchronous write-through mutation.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, error, info, trace, warn};

use crate::cache::{CacheStats, IndexEntry, IndexKey, StatsSnapshot};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::query::{RecordId, ScalarValue};
use crate::schema::{IndexDef, SchemaRegistry};

type Table = HashMap<IndexKey, IndexEntry>;

// == Index Cache ==
/// Cached identifier sequences for every declared index.
///
/// Each hierarchy root owns one entry table behind its own lock. The
/// table map itself is built at construction and never changes, so a
/// lookup takes exactly one lock and operations on different roots never
/// contend.
#[derive(Debug)]
pub struct IndexCache {
    schema: Arc<SchemaRegistry>,
    tables: HashMap<String, RwLock<Table>>,
    stats: CacheStats,
    entry_warn_threshold: usize,
}

impl IndexCache {
    // == Constructor ==
    /// Creates one entry table per registered hierarchy root.
    ///
    /// # Arguments
    /// * `schema` - The finished registry; registration is over by now
    /// * `config` - Capacity and warning knobs
    pub fn new(schema: Arc<SchemaRegistry>, config: &CacheConfig) -> Self {
        let mut tables = HashMap::new();
        for root in schema.roots() {
            tables.insert(
                root.name().to_string(),
                RwLock::new(Table::with_capacity(config.initial_capacity)),
            );
        }
        info!(
            tables = tables.len(),
            capacity = config.initial_capacity,
            "index cache ready"
        );

        Self {
            schema,
            tables,
            stats: CacheStats::new(),
            entry_warn_threshold: config.entry_warn_threshold,
        }
    }

    /// Resolves the entry table for an entity via its hierarchy root.
    fn table(&self, entity: &str) -> Result<&RwLock<Table>> {
        let root = self.schema.root_of(entity)?;
        self.tables
            .get(root.name())
            .ok_or_else(|| CacheError::UnknownEntity(entity.to_string()))
    }

    // == Lookup ==
    /// Reads the identifier sequence cached under a key.
    ///
    /// # Returns
    /// - `Some(ids)` for a populated entry; an empty vec means the key is
    ///   known to match no record
    /// - `None` when the key was never populated
    pub fn lookup(&self, key: &IndexKey) -> Result<Option<Vec<RecordId>>> {
        let table = self.table(key.entity())?;
        let guard = table.read();
        match guard.get(key) {
            Some(entry) => {
                self.stats.record_hit();
                Ok(Some(entry.ids().to_vec()))
            }
            None => {
                self.stats.record_miss();
                Ok(None)
            }
        }
    }

    // == Populate ==
    /// Installs a store-sourced identifier sequence for a key, unless an
    /// entry appeared in the meantime.
    ///
    /// Write-through entries are authoritative: the sequence read from
    /// the store outside the lock may already be stale, so an existing
    /// entry always wins. More than one identifier for a unique index's
    /// key is a store-side integrity violation and is reported instead
    /// of cached.
    ///
    /// # Returns
    /// The identifiers now cached under the key.
    pub fn populate(&self, key: &IndexKey, ids: Vec<RecordId>) -> Result<Vec<RecordId>> {
        let root = self.schema.root_of(key.entity())?;
        let table = self
            .tables
            .get(root.name())
            .ok_or_else(|| CacheError::UnknownEntity(key.entity().to_string()))?;

        let unique = root
            .indexes()
            .iter()
            .any(|index| index.unique() && index.attributes() == key.attributes());
        if unique && ids.len() > 1 {
            error!(%key, count = ids.len(), "store returned several identifiers for a unique key");
            return Err(CacheError::UniquenessViolation {
                entity: root.name().to_string(),
                attributes: key.attributes().join(", "),
                id: ids[1],
            });
        }

        let mut guard = table.write();
        match guard.entry(key.clone()) {
            Entry::Occupied(existing) => {
                trace!(%key, "populate skipped, existing entry wins");
                Ok(existing.get().ids().to_vec())
            }
            Entry::Vacant(slot) => {
                debug!(%key, count = ids.len(), "entry populated from store");
                slot.insert(IndexEntry::new(ids.clone()));
                Ok(ids)
            }
        }
    }

    // == Record Created ==
    /// Write-through hook for a newly created record.
    ///
    /// Unique indexes install the identifier eagerly so a fresh record is
    /// findable without a store round trip. Non-unique indexes only
    /// append to entries that are already populated; absent entries stay
    /// absent and are repaired by the next read-side population.
    pub fn record_created(
        &self,
        entity: &str,
        attrs: &HashMap<String, ScalarValue>,
        id: RecordId,
    ) -> Result<()> {
        let root = self.schema.root_of(entity)?;
        let table = self
            .tables
            .get(root.name())
            .ok_or_else(|| CacheError::UnknownEntity(entity.to_string()))?;
        let mut guard = table.write();

        for index in root.indexes() {
            let key = IndexKey::from_record(index, attrs);
            apply_addition(&mut guard, index, key, id)?;
        }

        self.stats.record_write();
        self.warn_if_large(root.name(), guard.len());
        Ok(())
    }

    // == Record Updated ==
    /// Write-through hook for a record whose attributes changed.
    ///
    /// Per index, the identifier moves from the entry for the old
    /// attribute tuple to the entry for the new one. Indexes whose tuple
    /// did not change are untouched.
    pub fn record_updated(
        &self,
        entity: &str,
        old_attrs: &HashMap<String, ScalarValue>,
        new_attrs: &HashMap<String, ScalarValue>,
        id: RecordId,
    ) -> Result<()> {
        let root = self.schema.root_of(entity)?;
        let table = self
            .tables
            .get(root.name())
            .ok_or_else(|| CacheError::UnknownEntity(entity.to_string()))?;
        let mut guard = table.write();

        for index in root.indexes() {
            let old_key = IndexKey::from_record(index, old_attrs);
            let new_key = IndexKey::from_record(index, new_attrs);
            if old_key == new_key {
                continue;
            }
            if let Some(entry) = guard.get_mut(&old_key) {
                entry.remove(id);
            }
            apply_addition(&mut guard, index, new_key, id)?;
        }

        self.stats.record_write();
        self.warn_if_large(root.name(), guard.len());
        Ok(())
    }

    // == Record Destroyed ==
    /// Write-through hook for a destroyed record.
    ///
    /// Removes the identifier from the entry for its last known attribute
    /// tuple on every index. Removing the last identifier leaves the
    /// known-empty entry in place: the key now provably matches nothing.
    pub fn record_destroyed(
        &self,
        entity: &str,
        attrs: &HashMap<String, ScalarValue>,
        id: RecordId,
    ) -> Result<()> {
        let root = self.schema.root_of(entity)?;
        let table = self
            .tables
            .get(root.name())
            .ok_or_else(|| CacheError::UnknownEntity(entity.to_string()))?;
        let mut guard = table.write();

        for index in root.indexes() {
            let key = IndexKey::from_record(index, attrs);
            match guard.get_mut(&key) {
                Some(entry) => {
                    if !entry.remove(id) {
                        trace!(%key, id, "destroyed identifier was not in entry");
                    }
                }
                None => trace!(%key, id, "no entry for destroyed record"),
            }
        }

        self.stats.record_write();
        Ok(())
    }

    // == Clear ==
    /// Drops every entry in every table. Counters are left as they are.
    pub fn clear(&self) {
        for table in self.tables.values() {
            table.write().clear();
        }
        debug!("index cache cleared");
    }

    // == Length ==
    /// Total number of entries across all tables.
    pub fn len(&self) -> usize {
        self.tables.values().map(|table| table.read().len()).sum()
    }

    /// Returns true if no table holds any entry.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot(self.len())
    }

    /// Counts a request the classifier routed to the store.
    pub fn record_fallback(&self) {
        self.stats.record_fallback();
    }

    fn warn_if_large(&self, entity: &str, entries: usize) {
        if entries > self.entry_warn_threshold {
            warn!(
                entity,
                entries,
                threshold = self.entry_warn_threshold,
                "entry table exceeds warning threshold"
            );
        }
    }
}

/// Adds an identifier to the entry for `key` under the index's rules.
///
/// Unique index: an absent entry is installed as `[id]`; an entry holding
/// a different identifier is a reported integrity violation and is left
/// in its last consistent state. Non-unique index: populated entries get
/// the identifier appended, absent entries stay absent.
fn apply_addition(table: &mut Table, index: &IndexDef, key: IndexKey, id: RecordId) -> Result<()> {
    if index.unique() {
        match table.entry(key) {
            Entry::Occupied(mut slot) => {
                if slot.get().contains(id) {
                    return Ok(());
                }
                if !slot.get().is_empty() {
                    error!(key = %slot.key(), id, "unique index entry already holds another identifier");
                    return Err(CacheError::UniquenessViolation {
                        entity: index.entity().to_string(),
                        attributes: index.attributes().join(", "),
                        id,
                    });
                }
                slot.get_mut().append(id);
            }
            Entry::Vacant(slot) => {
                slot.insert(IndexEntry::new(vec![id]));
            }
        }
    } else if let Some(entry) = table.get_mut(&key) {
        entry.append(id);
    } else {
        trace!(%key, id, "no populated entry for identifier, leaving absent");
    }
    Ok(())
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::ConditionSet;

    fn world() -> (Arc<SchemaRegistry>, IndexCache) {
        let mut registry = SchemaRegistry::new();
        registry.register_entity("stories", "id").unwrap();
        registry.declare_index("stories", &["title"], false).unwrap();
        registry.register_subtype("epics", "stories").unwrap();

        let registry = Arc::new(registry);
        let cache = IndexCache::new(Arc::clone(&registry), &CacheConfig::default());
        (registry, cache)
    }

    fn key_for(registry: &SchemaRegistry, attribute: &str, value: ScalarValue) -> IndexKey {
        let set = ConditionSet::single(attribute, value);
        let index = registry.match_index("stories", &set).unwrap().unwrap();
        IndexKey::from_set(index, &set)
    }

    fn story_attrs(id: RecordId, title: &str) -> HashMap<String, ScalarValue> {
        HashMap::from([
            ("id".to_string(), ScalarValue::from_id(id)),
            ("title".to_string(), ScalarValue::from(title)),
        ])
    }

    #[test]
    fn test_lookup_never_populated() {
        let (registry, cache) = world();
        let key = key_for(&registry, "title", ScalarValue::from("x"));

        assert!(cache.lookup(&key).unwrap().is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_populate_then_lookup() {
        let (registry, cache) = world();
        let key = key_for(&registry, "title", ScalarValue::from("x"));

        cache.populate(&key, vec![1, 2]).unwrap();
        assert_eq!(cache.lookup(&key).unwrap(), Some(vec![1, 2]));
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_populate_existing_entry_wins() {
        let (registry, cache) = world();
        let key = key_for(&registry, "title", ScalarValue::from("x"));

        cache.populate(&key, vec![1]).unwrap();
        let winner = cache.populate(&key, vec![7, 8]).unwrap();

        assert_eq!(winner, vec![1]);
        assert_eq!(cache.lookup(&key).unwrap(), Some(vec![1]));
    }

    #[test]
    fn test_known_empty_is_distinct_from_absent() {
        let (registry, cache) = world();
        let key = key_for(&registry, "title", ScalarValue::from("x"));

        cache.populate(&key, vec![]).unwrap();
        assert_eq!(cache.lookup(&key).unwrap(), Some(vec![]));
    }

    #[test]
    fn test_populate_unique_key_rejects_several_identifiers() {
        let (registry, cache) = world();
        let pk = key_for(&registry, "id", ScalarValue::from_id(1));

        let result = cache.populate(&pk, vec![1, 2]);
        assert!(matches!(result, Err(CacheError::UniquenessViolation { .. })));
        assert!(cache.lookup(&pk).unwrap().is_none());

        // A well-formed sequence for the same key still installs.
        cache.populate(&pk, vec![1]).unwrap();
        assert_eq!(cache.lookup(&pk).unwrap(), Some(vec![1]));
    }

    #[test]
    fn test_record_created_installs_unique_entry() {
        let (registry, cache) = world();
        cache.record_created("stories", &story_attrs(1, "x"), 1).unwrap();

        let pk = key_for(&registry, "id", ScalarValue::from_id(1));
        assert_eq!(cache.lookup(&pk).unwrap(), Some(vec![1]));
    }

    #[test]
    fn test_record_created_appends_in_order() {
        let (registry, cache) = world();
        let key = key_for(&registry, "title", ScalarValue::from("x"));
        cache.populate(&key, vec![]).unwrap();

        cache.record_created("stories", &story_attrs(1, "x"), 1).unwrap();
        cache.record_created("stories", &story_attrs(2, "x"), 2).unwrap();

        assert_eq!(cache.lookup(&key).unwrap(), Some(vec![1, 2]));
    }

    #[test]
    fn test_record_created_leaves_absent_nonunique_absent() {
        let (registry, cache) = world();
        cache.record_created("stories", &story_attrs(1, "x"), 1).unwrap();

        let key = key_for(&registry, "title", ScalarValue::from("x"));
        assert!(cache.lookup(&key).unwrap().is_none());
    }

    #[test]
    fn test_uniqueness_violation_reported_entry_unchanged() {
        let (registry, cache) = world();
        cache.record_created("stories", &story_attrs(1, "x"), 1).unwrap();

        // A second record landing on the same primary-key tuple.
        let result = cache.record_created("stories", &story_attrs(1, "y"), 2);
        assert!(matches!(result, Err(CacheError::UniquenessViolation { .. })));

        let pk = key_for(&registry, "id", ScalarValue::from_id(1));
        assert_eq!(cache.lookup(&pk).unwrap(), Some(vec![1]));
    }

    #[test]
    fn test_record_updated_moves_identifier() {
        let (registry, cache) = world();
        let old_key = key_for(&registry, "title", ScalarValue::from("x"));
        let new_key = key_for(&registry, "title", ScalarValue::from("y"));
        cache.populate(&old_key, vec![1, 2]).unwrap();
        cache.populate(&new_key, vec![]).unwrap();

        cache
            .record_updated("stories", &story_attrs(1, "x"), &story_attrs(1, "y"), 1)
            .unwrap();

        assert_eq!(cache.lookup(&old_key).unwrap(), Some(vec![2]));
        assert_eq!(cache.lookup(&new_key).unwrap(), Some(vec![1]));
    }

    #[test]
    fn test_record_updated_leaves_absent_target_absent() {
        let (registry, cache) = world();
        let old_key = key_for(&registry, "title", ScalarValue::from("x"));
        cache.populate(&old_key, vec![1, 2]).unwrap();

        // The entry for the new title was never populated.
        cache
            .record_updated("stories", &story_attrs(1, "x"), &story_attrs(1, "y"), 1)
            .unwrap();

        assert_eq!(cache.lookup(&old_key).unwrap(), Some(vec![2]));
        let new_key = key_for(&registry, "title", ScalarValue::from("y"));
        assert!(cache.lookup(&new_key).unwrap().is_none());
    }

    #[test]
    fn test_record_updated_unchanged_tuple_is_noop() {
        let (registry, cache) = world();
        let key = key_for(&registry, "title", ScalarValue::from("x"));
        cache.populate(&key, vec![1, 2]).unwrap();

        cache
            .record_updated("stories", &story_attrs(1, "x"), &story_attrs(1, "x"), 1)
            .unwrap();

        assert_eq!(cache.lookup(&key).unwrap(), Some(vec![1, 2]));
    }

    #[test]
    fn test_record_destroyed_leaves_known_empty() {
        let (registry, cache) = world();
        cache.record_created("stories", &story_attrs(1, "x"), 1).unwrap();
        cache.record_destroyed("stories", &story_attrs(1, "x"), 1).unwrap();

        let pk = key_for(&registry, "id", ScalarValue::from_id(1));
        assert_eq!(cache.lookup(&pk).unwrap(), Some(vec![]));
    }

    #[test]
    fn test_record_destroyed_without_entry_is_noop() {
        let (_registry, cache) = world();
        cache.record_destroyed("stories", &story_attrs(9, "x"), 9).unwrap();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_subtype_write_lands_in_root_table() {
        let (registry, cache) = world();
        cache.record_created("epics", &story_attrs(3, "x"), 3).unwrap();

        let pk = key_for(&registry, "id", ScalarValue::from_id(3));
        assert_eq!(cache.lookup(&pk).unwrap(), Some(vec![3]));
    }

    #[test]
    fn test_unknown_entity_everywhere() {
        let (_registry, cache) = world();
        let result = cache.record_created("villages", &HashMap::new(), 1);
        assert!(matches!(result, Err(CacheError::UnknownEntity(_))));
    }

    #[test]
    fn test_clear() {
        let (registry, cache) = world();
        cache.record_created("stories", &story_attrs(1, "x"), 1).unwrap();
        assert!(!cache.is_empty());

        cache.clear();
        assert!(cache.is_empty());

        let pk = key_for(&registry, "id", ScalarValue::from_id(1));
        assert!(cache.lookup(&pk).unwrap().is_none());
    }

    #[test]
    fn test_stats_counts() {
        let (registry, cache) = world();
        let key = key_for(&registry, "title", ScalarValue::from("x"));

        let _ = cache.lookup(&key); // miss
        cache.populate(&key, vec![1]).unwrap();
        let _ = cache.lookup(&key); // hit
        cache.record_created("stories", &story_attrs(1, "x"), 1).unwrap();

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.writes, 1);
    }
}
