//! Schema Registry
//!
//! Registration of entities, their hierarchy links and their declared
//! indexes. Registration happens once at startup; afterwards the registry
//! is shared read-only.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::error::{CacheError, Result};
use crate::query::ConditionSet;
use crate::schema::IndexDef;

// == Entity Schema ==
/// One registered entity.
///
/// Roots carry a primary key and the index list for their whole
/// hierarchy; subtypes carry only the link to their parent.
#[derive(Debug, Clone)]
pub struct EntitySchema {
    name: String,
    parent: Option<String>,
    primary_key: Option<String>,
    indexes: Vec<IndexDef>,
}

impl EntitySchema {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// The primary key attribute. Always present on roots.
    pub fn primary_key(&self) -> Option<&str> {
        self.primary_key.as_deref()
    }

    pub fn indexes(&self) -> &[IndexDef] {
        &self.indexes
    }
}

// == Schema Registry ==
/// All registered entities and indexes, keyed by entity name.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    entities: HashMap<String, EntitySchema>,
}

impl SchemaRegistry {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Register Entity ==
    /// Declares a hierarchy root and its implicit unique primary-key
    /// index.
    ///
    /// # Arguments
    /// * `name` - Entity name, unique across the registry
    /// * `primary_key` - The identifier attribute, lowercased on intake
    pub fn register_entity(&mut self, name: &str, primary_key: &str) -> Result<()> {
        if self.entities.contains_key(name) {
            return Err(CacheError::InvalidSchema(format!(
                "entity {} is already registered",
                name
            )));
        }
        let primary_key = primary_key.to_ascii_lowercase();
        if primary_key.is_empty() {
            return Err(CacheError::InvalidSchema(format!(
                "entity {} has an empty primary key",
                name
            )));
        }

        let pk_index = IndexDef::new(name.to_string(), vec![primary_key.clone()], true);
        self.entities.insert(
            name.to_string(),
            EntitySchema {
                name: name.to_string(),
                parent: None,
                primary_key: Some(primary_key),
                indexes: vec![pk_index],
            },
        );
        debug!(entity = name, "entity registered");
        Ok(())
    }

    // == Register Subtype ==
    /// Declares a concrete subtype under an already registered parent.
    ///
    /// Subtypes carry no indexes of their own; their records are cached
    /// under the root's indexes.
    pub fn register_subtype(&mut self, name: &str, parent: &str) -> Result<()> {
        if self.entities.contains_key(name) {
            return Err(CacheError::InvalidSchema(format!(
                "entity {} is already registered",
                name
            )));
        }
        if !self.entities.contains_key(parent) {
            return Err(CacheError::InvalidSchema(format!(
                "parent {} of subtype {} is not registered",
                parent, name
            )));
        }

        self.entities.insert(
            name.to_string(),
            EntitySchema {
                name: name.to_string(),
                parent: Some(parent.to_string()),
                primary_key: None,
                indexes: Vec::new(),
            },
        );
        debug!(entity = name, parent, "subtype registered");
        Ok(())
    }

    // == Declare Index ==
    /// Declares a composite index on a root entity.
    ///
    /// Fails fast when an index over the same attribute set already
    /// exists: two indexes answering the same condition shape would make
    /// classification ambiguous.
    pub fn declare_index(&mut self, entity: &str, attributes: &[&str], unique: bool) -> Result<()> {
        let attributes: Vec<String> = attributes
            .iter()
            .map(|attr| attr.to_ascii_lowercase())
            .collect();
        if attributes.is_empty() {
            return Err(CacheError::InvalidSchema(format!(
                "index on {} has no attributes",
                entity
            )));
        }
        let distinct: HashSet<&String> = attributes.iter().collect();
        if distinct.len() != attributes.len() {
            return Err(CacheError::InvalidSchema(format!(
                "index on {} repeats an attribute",
                entity
            )));
        }

        let schema = self
            .entities
            .get_mut(entity)
            .ok_or_else(|| CacheError::UnknownEntity(entity.to_string()))?;
        if schema.parent.is_some() {
            return Err(CacheError::InvalidSchema(format!(
                "{} is a subtype; indexes are declared on the hierarchy root",
                entity
            )));
        }
        if schema
            .indexes
            .iter()
            .any(|index| same_attribute_set(index.attributes(), &attributes))
        {
            return Err(CacheError::AmbiguousIndex {
                entity: entity.to_string(),
                attributes: attributes.join(", "),
            });
        }

        debug!(entity, ?attributes, unique, "index declared");
        schema
            .indexes
            .push(IndexDef::new(entity.to_string(), attributes, unique));
        Ok(())
    }

    // == Lookup ==
    /// Resolves an entity by name. An unknown name is a programming
    /// error, never a silent miss.
    pub fn entity(&self, name: &str) -> Result<&EntitySchema> {
        self.entities
            .get(name)
            .ok_or_else(|| CacheError::UnknownEntity(name.to_string()))
    }

    /// Finds the one index whose attribute set equals the condition set,
    /// looking at the entity's hierarchy root.
    pub fn match_index(&self, entity: &str, set: &ConditionSet) -> Result<Option<&IndexDef>> {
        let root = self.root_of(entity)?;
        Ok(root.indexes.iter().find(|index| index.matches(set)))
    }

    /// All hierarchy roots, in no particular order.
    pub fn roots(&self) -> impl Iterator<Item = &EntitySchema> {
        self.entities.values().filter(|schema| schema.parent.is_none())
    }

    pub(crate) fn entity_schemas(&self) -> impl Iterator<Item = &EntitySchema> {
        self.entities.values()
    }
}

/// Order-independent attribute set equality.
fn same_attribute_set(a: &[String], b: &[String]) -> bool {
    a.len() == b.len() && a.iter().all(|attr| b.contains(attr))
}
