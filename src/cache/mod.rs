//! Cache Module
//!
//! Composite index cache: keys, entries, statistics and the store.

mod entry;
mod key;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::IndexEntry;
pub use key::IndexKey;
pub use stats::{CacheStats, StatsSnapshot};
pub use store::IndexCache;
