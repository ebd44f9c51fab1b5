//! Finalize passes.
//!
//! Finalize runs once, on a single thread, in a fixed order: one base node
//! per mapper, then one connector per declared relationship (in mapper
//! declaration order). Any error aborts the pass.

use joinery_foundation::Result;
use joinery_storage::Engine;
use tracing::debug;

use crate::connector::ConnectorBuilder;
use crate::mapper::MapperRegistry;
use crate::registry::RelationRegistry;

/// Registers one base node per mapper, named after its relation.
#[derive(Clone, Copy, Debug)]
pub struct BaseRelationMappersFinalizer<'a> {
    mappers: &'a MapperRegistry,
}

impl<'a> BaseRelationMappersFinalizer<'a> {
    /// Creates the pass.
    #[must_use]
    pub fn new(mappers: &'a MapperRegistry) -> Self {
        Self { mappers }
    }

    /// Runs the pass.
    ///
    /// # Errors
    ///
    /// Returns an error if a mapper's relation has no data source or its
    /// node name is already taken.
    pub fn run<E: Engine>(&self, registry: &mut RelationRegistry<E>) -> Result<()> {
        for mapper in self.mappers.iter() {
            let node = registry
                .gateway_node(&mapper.schema.name, &mapper.schema)
                .map_err(|e| e.in_model(&mapper.model))?;
            debug!(node = %node.name(), model = %mapper.model, "registered base node");
        }
        Ok(())
    }
}

/// Builds a connector for every declared relationship.
#[derive(Clone, Copy, Debug)]
pub struct RelationshipMappersFinalizer<'a> {
    mappers: &'a MapperRegistry,
}

impl<'a> RelationshipMappersFinalizer<'a> {
    /// Creates the pass.
    #[must_use]
    pub fn new(mappers: &'a MapperRegistry) -> Self {
        Self { mappers }
    }

    /// Runs the pass.
    ///
    /// # Errors
    ///
    /// Returns the first configuration error raised while building a connector.
    pub fn run<E: Engine>(&self, registry: &mut RelationRegistry<E>) -> Result<()> {
        let mut builder = ConnectorBuilder::new(registry, self.mappers);
        for mapper in self.mappers.iter() {
            for relationship in &mapper.relationships {
                builder
                    .call(relationship)
                    .map_err(|e| e.in_model(&mapper.model))?;
            }
        }
        Ok(())
    }
}

/// Runs both passes in order, then freezes the registry if configured to.
#[derive(Clone, Copy, Debug)]
pub struct Finalizer<'a> {
    mappers: &'a MapperRegistry,
}

impl<'a> Finalizer<'a> {
    /// Creates the finalizer.
    #[must_use]
    pub fn new(mappers: &'a MapperRegistry) -> Self {
        Self { mappers }
    }

    /// Runs finalize.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by either pass. The registry is left
    /// as the failing pass left it and is not frozen.
    pub fn run<E: Engine>(&self, registry: &mut RelationRegistry<E>) -> Result<()> {
        BaseRelationMappersFinalizer::new(self.mappers).run(registry)?;
        RelationshipMappersFinalizer::new(self.mappers).run(registry)?;
        if registry.config().freeze_on_finalize {
            registry.freeze();
        }
        debug!(
            nodes = registry.nodes().len(),
            edges = registry.edges().len(),
            connectors = registry.connectors().len(),
            frozen = registry.is_frozen(),
            "finalized relation registry"
        );
        Ok(())
    }
}
