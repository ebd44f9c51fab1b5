//! Mapper inputs: what the setup layer declares per model.

use std::collections::HashMap;

use joinery_foundation::{Error, ErrorKind, Name, Result};
use joinery_storage::RelationSchema;

use crate::relationship::Relationship;

/// A model, its base relation schema, and its declared relationships.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mapper {
    /// Model name (`User`, `SongTag`).
    pub model: Name,
    /// Base relation schema.
    pub schema: RelationSchema,
    /// Relationships, in declaration order.
    pub relationships: Vec<Relationship>,
}

impl Mapper {
    /// Creates a mapper with no relationships.
    #[must_use]
    pub fn new(model: impl Into<Name>, schema: RelationSchema) -> Self {
        Self {
            model: model.into(),
            schema,
            relationships: Vec::new(),
        }
    }

    /// Adds a relationship.
    #[must_use]
    pub fn with_relationship(mut self, relationship: Relationship) -> Self {
        self.relationships.push(relationship);
        self
    }

    /// Looks up a relationship by name.
    #[must_use]
    pub fn relationship(&self, name: &str) -> Option<&Relationship> {
        self.relationships.iter().find(|r| r.name == name)
    }
}

/// Insertion-ordered set of mappers keyed by model name.
#[derive(Clone, Debug, Default)]
pub struct MapperRegistry {
    mappers: Vec<Mapper>,
    index: HashMap<Name, usize>,
}

impl MapperRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a mapper.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::DuplicateMapper`] if the model is already registered.
    pub fn register(&mut self, mapper: Mapper) -> Result<()> {
        if self.index.contains_key(&mapper.model) {
            return Err(Error::new(ErrorKind::DuplicateMapper(mapper.model)));
        }
        self.index.insert(mapper.model.clone(), self.mappers.len());
        self.mappers.push(mapper);
        Ok(())
    }

    /// Looks up a mapper without failing.
    #[must_use]
    pub fn find(&self, model: &str) -> Option<&Mapper> {
        self.index.get(model).map(|&i| &self.mappers[i])
    }

    /// The mapper for `model`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::MissingMapper`] if no mapper is registered.
    pub fn get(&self, model: &str) -> Result<&Mapper> {
        self.find(model)
            .ok_or_else(|| Error::missing_mapper(Name::new(model)))
    }

    /// The relationship `name` declared on `model`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::MissingMapper`] or [`ErrorKind::MissingRelationship`].
    pub fn relationship(&self, model: &str, name: &str) -> Result<&Relationship> {
        let mapper = self.get(model)?;
        mapper
            .relationship(name)
            .ok_or_else(|| Error::missing_relationship(mapper.model.clone(), Name::new(name)))
    }

    /// The mapper of the model that relationship `name` on `model` targets.
    ///
    /// # Errors
    ///
    /// Returns an error if the model, relationship, or target mapper is missing.
    pub fn target_mapper(&self, model: &str, name: &str) -> Result<&Mapper> {
        let relationship = self.relationship(model, name)?;
        self.get(&relationship.target_model)
    }

    /// Iterates mappers in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Mapper> {
        self.mappers.iter()
    }

    /// Returns the number of mappers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mappers.len()
    }

    /// Returns true if no mappers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mappers.is_empty()
    }
}
