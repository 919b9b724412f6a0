//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Initial capacity reserved for each entity's entry table
    pub initial_capacity: usize,
    /// Entry count per table above which a warning is logged
    pub entry_warn_threshold: usize,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `ROWCACHE_INITIAL_CAPACITY` - Initial per-table capacity (default: 256)
    /// - `ROWCACHE_ENTRY_WARN_THRESHOLD` - Per-table warning threshold (default: 100000)
    pub fn from_env() -> Self {
        Self {
            initial_capacity: env::var("ROWCACHE_INITIAL_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(256),
            entry_warn_threshold: env::var("ROWCACHE_ENTRY_WARN_THRESHOLD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(100_000),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 256,
            entry_warn_threshold: 100_000,
        }
    }
}
