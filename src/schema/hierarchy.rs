//! Entity Hierarchy
//!
//! Root and subtype resolution over the registered entities.

use crate::error::Result;
use crate::schema::registry::{EntitySchema, SchemaRegistry};

impl SchemaRegistry {
    // == Root Of ==
    /// Walks parent links up to the hierarchy root.
    ///
    /// A root resolves to itself. Registration only accepts parents that
    /// already exist, so the walk always terminates.
    pub fn root_of(&self, entity: &str) -> Result<&EntitySchema> {
        let mut current = self.entity(entity)?;
        while let Some(parent) = current.parent() {
            current = self.entity(parent)?;
        }
        Ok(current)
    }

    /// True when the entity is its own hierarchy root.
    pub fn is_root(&self, entity: &str) -> Result<bool> {
        Ok(self.entity(entity)?.parent().is_none())
    }

    // == Query Types ==
    /// The subtype tags a query on `entity` accepts: the entity itself
    /// and every descendant.
    pub fn query_types(&self, entity: &str) -> Result<Vec<String>> {
        let start = self.entity(entity)?;
        let mut types = vec![start.name().to_string()];
        let mut frontier = vec![start.name()];

        while let Some(current) = frontier.pop() {
            for schema in self.entity_schemas() {
                if schema.parent() == Some(current) {
                    types.push(schema.name().to_string());
                    frontier.push(schema.name());
                }
            }
        }

        Ok(types)
    }
}
