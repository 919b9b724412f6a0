//! Schema Module
//!
//! Entity registration, hierarchy links and index declarations.

mod hierarchy;
mod index;
mod registry;

// Re-export public types
pub use index::IndexDef;
pub use registry::{EntitySchema, SchemaRegistry};
