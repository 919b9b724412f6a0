//! Finder
//!
//! The read facade: classify the request, consult the cache, hydrate
//! misses from the store, and shape the results.

use std::sync::Arc;

use tracing::debug;

use crate::cache::{IndexCache, IndexKey};
use crate::error::Result;
use crate::materialize::{apply_window, filter_subtypes, take_first};
use crate::query::{Classifier, FallbackReason, FindKind, FindRequest, RecordId, RoutingDecision};
use crate::schema::SchemaRegistry;
use crate::store::RecordStore;

// == Find Outcome ==
/// What the finder did with a request.
#[derive(Debug, Clone, PartialEq)]
pub enum FindOutcome<T> {
    /// Served from the cache, hydrating never-populated entries on the
    /// way.
    Cached(Vec<T>),
    /// Not cache-eligible; the caller runs the original query against
    /// the store unchanged.
    Fallback(FallbackReason),
}

impl<T> FindOutcome<T> {
    pub fn is_cached(&self) -> bool {
        matches!(self, FindOutcome::Cached(_))
    }

    /// The cached results, or None on a fallback.
    pub fn into_cached(self) -> Option<Vec<T>> {
        match self {
            FindOutcome::Cached(items) => Some(items),
            FindOutcome::Fallback(_) => None,
        }
    }
}

// == Finder ==
/// Serves find requests through the index cache.
pub struct Finder<S: RecordStore> {
    schema: Arc<SchemaRegistry>,
    classifier: Classifier,
    cache: Arc<IndexCache>,
    store: S,
}

impl<S: RecordStore> Finder<S> {
    pub fn new(schema: Arc<SchemaRegistry>, cache: Arc<IndexCache>, store: S) -> Self {
        Self {
            classifier: Classifier::new(Arc::clone(&schema)),
            schema,
            cache,
            store,
        }
    }

    // == Find Identifiers ==
    /// Resolves a request to the matching record identifiers.
    ///
    /// Identifier order inside one entry is creation order; a
    /// multi-identifier find concatenates entries in request order.
    /// Subtype filtering and result shaping (first, limit, offset) run
    /// after every key has been resolved.
    pub fn find_ids(&self, request: &FindRequest) -> Result<FindOutcome<RecordId>> {
        let keys = match self.classifier.classify(request)? {
            RoutingDecision::CacheEligible(keys) => keys,
            RoutingDecision::Fallback(reason) => {
                self.cache.record_fallback();
                return Ok(FindOutcome::Fallback(reason));
            }
        };

        let mut ids = Vec::new();
        for key in &keys {
            ids.extend(self.resolve_key(key)?);
        }
        let ids = filter_subtypes(&self.schema, &self.store, &request.entity, ids)?;

        let ids = match request.options.kind {
            FindKind::First => take_first(&ids).into_iter().collect(),
            FindKind::All => apply_window(&ids, request.options.limit, request.options.offset),
        };
        Ok(FindOutcome::Cached(ids))
    }

    // == Find Records ==
    /// Resolves a request to hydrated records.
    pub fn find_records(&self, request: &FindRequest) -> Result<FindOutcome<S::Record>> {
        let ids = match self.find_ids(request)? {
            FindOutcome::Cached(ids) => ids,
            FindOutcome::Fallback(reason) => return Ok(FindOutcome::Fallback(reason)),
        };
        let root = self.schema.root_of(&request.entity)?;
        Ok(FindOutcome::Cached(self.store.fetch(root.name(), &ids)))
    }

    /// Reads one key, hydrating from the store when the entry has never
    /// been populated.
    fn resolve_key(&self, key: &IndexKey) -> Result<Vec<RecordId>> {
        if let Some(ids) = self.cache.lookup(key)? {
            return Ok(ids);
        }
        // The store read happens with no cache lock held. Whatever entry
        // exists by the time populate runs wins over this read.
        let fetched = self.store.ids_for(key);
        debug!(%key, count = fetched.len(), "hydrated entry from store");
        self.cache.populate(key, fetched)
    }

    pub fn cache(&self) -> &IndexCache {
        &self.cache
    }
}
