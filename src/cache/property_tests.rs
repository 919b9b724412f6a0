//! Property-Based Tests for the Index Cache
//!
//! Uses proptest to verify ordering, uniqueness and statistics properties
//! over generated operation sequences.

use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

use crate::cache::{IndexCache, IndexKey};
use crate::config::CacheConfig;
use crate::materialize::apply_window;
use crate::query::{ConditionExpr, ConditionSet, RecordId, ScalarValue};
use crate::schema::SchemaRegistry;

// == Test World ==
fn world() -> (Arc<SchemaRegistry>, IndexCache) {
    let mut registry = SchemaRegistry::new();
    registry.register_entity("stories", "id").unwrap();
    registry.declare_index("stories", &["title"], false).unwrap();

    let registry = Arc::new(registry);
    let cache = IndexCache::new(Arc::clone(&registry), &CacheConfig::default());
    (registry, cache)
}

fn title_key(registry: &SchemaRegistry, title: &str) -> IndexKey {
    let set = ConditionSet::single("title", ScalarValue::from(title));
    let index = registry.match_index("stories", &set).unwrap().unwrap();
    IndexKey::from_set(index, &set)
}

fn story_attrs(id: RecordId, title: &str) -> HashMap<String, ScalarValue> {
    HashMap::from([
        ("id".to_string(), ScalarValue::from_id(id)),
        ("title".to_string(), ScalarValue::from(title)),
    ])
}

// == Strategies ==
fn scalar_strategy() -> impl Strategy<Value = ScalarValue> {
    prop_oneof![
        Just(ScalarValue::Null),
        any::<bool>().prop_map(ScalarValue::Bool),
        any::<i64>().prop_map(ScalarValue::Integer),
        "[a-z ]{0,12}".prop_map(ScalarValue::from),
    ]
}

/// Attribute/value pairs with distinct attribute names, once in map order
/// and once shuffled.
fn shuffled_pairs_strategy(
) -> impl Strategy<Value = (Vec<(String, ScalarValue)>, Vec<(String, ScalarValue)>)> {
    prop::collection::hash_map("[a-z]{1,8}", scalar_strategy(), 1..5)
        .prop_map(|map| map.into_iter().collect::<Vec<_>>())
        .prop_flat_map(|pairs| (Just(pairs.clone()), Just(pairs).prop_shuffle()))
}

/// One write-through lifecycle event against the shared title entry.
#[derive(Debug, Clone)]
enum LifecycleOp {
    Create(RecordId),
    Destroy(RecordId),
}

fn lifecycle_op_strategy() -> impl Strategy<Value = LifecycleOp> {
    prop_oneof![
        (1u64..20).prop_map(LifecycleOp::Create),
        (1u64..20).prop_map(LifecycleOp::Destroy),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Canonicalization ignores the order the caller wrote the pairs in.
    #[test]
    fn prop_normalization_is_order_independent(
        (pairs, shuffled) in shuffled_pairs_strategy()
    ) {
        let a = ConditionExpr::Mapping(pairs).normalize();
        let b = ConditionExpr::Mapping(shuffled).normalize();
        prop_assert!(a.is_some(), "distinct attributes must canonicalize");
        prop_assert_eq!(a, b, "pair order changed the canonical form");
    }

    // Windowing matches slice semantics for any limit and offset.
    #[test]
    fn prop_window_matches_slice_semantics(
        ids in prop::collection::vec(any::<RecordId>(), 0..32),
        limit in prop::option::of(0usize..40),
        offset in prop::option::of(0usize..40),
    ) {
        let window = apply_window(&ids, limit, offset);

        let start = offset.unwrap_or(0).min(ids.len());
        let end = match limit {
            Some(limit) => (start + limit).min(ids.len()),
            None => ids.len(),
        };
        prop_assert_eq!(window, ids[start..end].to_vec());
    }

    // A populated entry tracks creations and destructions exactly:
    // creation order preserved, never a duplicate identifier.
    #[test]
    fn prop_lifecycle_preserves_order_and_uniqueness(
        ops in prop::collection::vec(lifecycle_op_strategy(), 1..40)
    ) {
        let (registry, cache) = world();
        let key = title_key(&registry, "war");
        cache.populate(&key, vec![]).unwrap();

        let mut model: Vec<RecordId> = Vec::new();
        for op in ops {
            match op {
                LifecycleOp::Create(id) => {
                    cache
                        .record_created("stories", &story_attrs(id, "war"), id)
                        .unwrap();
                    if !model.contains(&id) {
                        model.push(id);
                    }
                }
                LifecycleOp::Destroy(id) => {
                    cache
                        .record_destroyed("stories", &story_attrs(id, "war"), id)
                        .unwrap();
                    if let Some(pos) = model.iter().position(|m| *m == id) {
                        model.remove(pos);
                    }
                }
            }
        }

        let cached = cache.lookup(&key).unwrap();
        prop_assert_eq!(cached, Some(model));
    }

    // Hit and miss counters reflect exactly which keys were populated.
    #[test]
    fn prop_statistics_accuracy(
        populated in prop::collection::hash_set("[a-e]", 0..5),
        lookups in prop::collection::vec("[a-e]", 1..30),
    ) {
        let (registry, cache) = world();
        for title in &populated {
            cache.populate(&title_key(&registry, title), vec![1]).unwrap();
        }

        let mut expected_hits: u64 = 0;
        let mut expected_misses: u64 = 0;
        for title in &lookups {
            let found = cache.lookup(&title_key(&registry, title)).unwrap();
            if populated.contains(title) {
                prop_assert!(found.is_some(), "populated key must hit");
                expected_hits += 1;
            } else {
                prop_assert!(found.is_none(), "unpopulated key must miss");
                expected_misses += 1;
            }
        }

        let stats = cache.stats();
        prop_assert_eq!(stats.hits, expected_hits, "Hits mismatch");
        prop_assert_eq!(stats.misses, expected_misses, "Misses mismatch");
        prop_assert_eq!(stats.total_entries, populated.len(), "Total entries mismatch");
    }
}
