//! Rowcache - A write-through index cache for record lookups
//!
//! Keeps identifier lists for declared composite indexes in process
//! memory, serves eligible finds from them and hands everything else to
//! the record store unchanged.

pub mod cache;
pub mod config;
pub mod error;
pub mod finder;
pub mod materialize;
pub mod query;
pub mod schema;
pub mod store;

pub use cache::IndexCache;
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use finder::{FindOutcome, Finder};
pub use query::{ConditionExpr, FindRequest};
pub use schema::SchemaRegistry;
pub use store::RecordStore;
