//! Cache Statistics Module
//!
//! Tracks routing and cache performance counters.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;

// == Cache Stats ==
/// Live counters, incremented lock-free from any thread.
#[derive(Debug, Default)]
pub struct CacheStats {
    /// Lookups answered by a populated entry
    hits: AtomicU64,
    /// Lookups against a never-populated key
    misses: AtomicU64,
    /// Requests routed to the store by the classifier
    fallbacks: AtomicU64,
    /// Write-through mutations applied
    writes: AtomicU64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Record Hit ==
    /// Increments the hit counter.
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    // == Record Miss ==
    /// Increments the miss counter.
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    // == Record Fallback ==
    /// Increments the fallback counter.
    pub fn record_fallback(&self) {
        self.fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    // == Record Write ==
    /// Increments the write counter.
    pub fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    // == Snapshot ==
    /// Captures the counters together with the current entry count.
    pub fn snapshot(&self, total_entries: usize) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            total_entries,
            captured_at: Utc::now(),
        }
    }
}

// == Stats Snapshot ==
/// A point-in-time view of the counters, serializable for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub fallbacks: u64,
    pub writes: u64,
    pub total_entries: usize,
    pub captured_at: DateTime<Utc>,
}

impl StatsSnapshot {
    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
