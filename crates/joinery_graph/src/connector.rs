//! Connectors and the algorithm that builds them.
//!
//! A [`Connector`] is the finalized join path of one relationship. The
//! [`ConnectorBuilder`] resolves the hop a relationship needs (directly
//! between two base nodes, or from an intermediary relationship's node to
//! the target), builds or reuses the edge and joined node for it, and
//! registers the connector. Intermediary relationships are built first,
//! recursively, so declaration order does not matter.

use std::sync::Arc;

use joinery_foundation::{ALIAS_SEPARATOR, AttributeAlias, Error, ErrorKind, Name, Result};
use joinery_storage::{Engine, Relation, Tuples};
use tracing::{debug, trace};

use crate::alias_index::{AliasIndex, JoinDefinition};
use crate::edge::Side;
use crate::mapper::{Mapper, MapperRegistry};
use crate::node::RelationNode;
use crate::registry::{ConnectorOf, EdgeOf, NodeOf, RelationRegistry};
use crate::relationship::Relationship;
use crate::via::ViaDefinition;

// =============================================================================
// Connector
// =============================================================================

/// The resolved join path and aliasing for one relationship.
#[derive(Clone, Debug)]
pub struct Connector<R> {
    relationship: Relationship,
    node: RelationNode<R>,
    source_node: Name,
    target_node: Name,
    source_aliases: AliasIndex,
    target_aliases: AliasIndex,
    collection_target: bool,
}

impl<R: Relation> Connector<R> {
    /// Creates a connector for `relationship` from the `source` base node to
    /// the final `node`.
    ///
    /// `target_node` names the base (or aliased) node the target model's
    /// attributes come from.
    #[must_use]
    pub fn new(
        relationship: Relationship,
        source: &RelationNode<R>,
        node: RelationNode<R>,
        target_node: Name,
    ) -> Self {
        let source_aliases = source.aliases().clone();
        let target_aliases = node.aliases().clone();
        let collection_target = relationship.is_collection();
        Self {
            relationship,
            node,
            source_node: source.name().clone(),
            target_node,
            source_aliases,
            target_aliases,
            collection_target,
        }
    }

    /// The relationship name.
    #[must_use]
    pub fn name(&self) -> &Name {
        &self.relationship.name
    }

    /// The relationship this connector resolves.
    #[must_use]
    pub fn relationship(&self) -> &Relationship {
        &self.relationship
    }

    /// The final joined node.
    #[must_use]
    pub fn node(&self) -> &RelationNode<R> {
        &self.node
    }

    /// Name of the source model's base node.
    #[must_use]
    pub fn source_node(&self) -> &Name {
        &self.source_node
    }

    /// Name of the target model's base (or aliased) node.
    #[must_use]
    pub fn target_node(&self) -> &Name {
        &self.target_node
    }

    /// The alias index of the source base node, where the join path starts.
    #[must_use]
    pub fn source_aliases(&self) -> &AliasIndex {
        &self.source_aliases
    }

    /// The alias index of the final node.
    #[must_use]
    pub fn target_aliases(&self) -> &AliasIndex {
        &self.target_aliases
    }

    /// The source model's attributes as visible in the final node.
    #[must_use]
    pub fn source_view(&self) -> AliasIndex {
        self.target_aliases.restricted_to(&self.source_node)
    }

    /// The target model's attributes as visible in the final node.
    #[must_use]
    pub fn target_view(&self) -> AliasIndex {
        self.target_aliases.restricted_to(&self.target_node)
    }

    /// Returns true if the relationship loads a collection.
    #[must_use]
    pub fn is_collection_target(&self) -> bool {
        self.collection_target
    }

    /// The joined relation.
    #[must_use]
    pub fn relation(&self) -> &R {
        self.node.relation()
    }

    /// Iterates the joined tuples.
    pub fn tuples(&self) -> Tuples<'_> {
        self.node.tuples()
    }
}

// =============================================================================
// Connector Builder
// =============================================================================

/// One join step: from the `left` node to the `right` node.
#[derive(Debug)]
struct Hop {
    left: Name,
    right: Name,
    left_keys: Vec<AttributeAlias>,
    right_keys: Vec<Name>,
}

/// Builds connectors for relationships, reusing existing graph structure.
pub struct ConnectorBuilder<'a, E: Engine> {
    registry: &'a mut RelationRegistry<E>,
    mappers: &'a MapperRegistry,
    in_progress: Vec<(Name, Name)>,
}

impl<'a, E: Engine> ConnectorBuilder<'a, E> {
    /// Creates a builder writing into `registry`.
    #[must_use]
    pub fn new(registry: &'a mut RelationRegistry<E>, mappers: &'a MapperRegistry) -> Self {
        Self {
            registry,
            mappers,
            in_progress: Vec::new(),
        }
    }

    /// Builds (or returns the already built) connector for `relationship`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a node, mapper, or intermediary
    /// relationship is missing, a `via` cannot be resolved, or a `through`
    /// chain is cyclic. The error context names the relationship.
    pub fn call(&mut self, relationship: &Relationship) -> Result<Arc<ConnectorOf<E>>> {
        self.build(relationship)
            .map_err(|e| e.in_relationship(&relationship.name))
    }

    fn build(&mut self, relationship: &Relationship) -> Result<Arc<ConnectorOf<E>>> {
        if let Some(existing) = self
            .registry
            .connector_of(&relationship.source_model, &relationship.name)
        {
            if existing.relationship() == relationship {
                trace!(relationship = %relationship.name, "connector already built");
                return Ok(Arc::clone(existing));
            }
            return Err(Error::new(ErrorKind::DuplicateConnector(
                relationship.name.clone(),
            )));
        }
        let key = (
            relationship.source_model.clone(),
            relationship.name.clone(),
        );
        if self.in_progress.contains(&key) {
            return Err(Error::new(ErrorKind::CyclicRelationship(
                relationship.name.clone(),
            )));
        }
        self.in_progress.push(key);
        let result = self.build_connector(relationship);
        self.in_progress.pop();
        result
    }

    fn build_connector(&mut self, relationship: &Relationship) -> Result<Arc<ConnectorOf<E>>> {
        let mappers = self.mappers;
        let source = mappers.get(&relationship.source_model)?;
        let target = mappers.get(&relationship.target_model)?;

        let hop = match &relationship.through {
            None => Hop {
                left: source.schema.name.clone(),
                right: target.schema.name.clone(),
                left_keys: relationship
                    .source_key
                    .iter()
                    .map(|k| AttributeAlias::new(k.clone(), source.schema.name.clone()))
                    .collect(),
                right_keys: relationship.target_key.clone(),
            },
            Some(through) => self.through_hop(relationship, through, target)?,
        };

        let left = self.registry.require_node(&hop.left)?.clone();
        let right = self.right_node(relationship, &hop, &left, target)?;
        let right_keys: Vec<AttributeAlias> = hop
            .right_keys
            .iter()
            .map(|k| AttributeAlias::new(k.clone(), right.name().clone()))
            .collect();
        let definition = JoinDefinition::from_keys(&hop.left_keys, &right_keys)?;

        let edge_name = left
            .name()
            .join(&self.registry.config().node_separator, right.name());
        let edge = self.registry.build_edge(
            edge_name.clone(),
            Side::new(left.clone(), hop.left_keys),
            Side::new(right.clone(), right_keys),
            relationship.operation.clone(),
        );
        let edge = self.registry.add_edge(edge)?;
        let node = self.joined_node(&edge, &left, &definition, &edge_name, relationship)?;

        let origin = self.registry.require_node(&source.schema.name)?;
        let connector = Connector::new(relationship.clone(), origin, node, right.name().clone());
        let connector = self.registry.add_connector(connector)?;
        debug!(
            relationship = %relationship.name,
            node = %connector.node().name(),
            "built connector"
        );
        Ok(connector)
    }

    /// The hop from an intermediary relationship's node to the final target.
    fn through_hop(
        &mut self,
        relationship: &Relationship,
        through: &Name,
        target: &Mapper,
    ) -> Result<Hop> {
        let mappers = self.mappers;
        let through_rel = mappers.relationship(&relationship.source_model, through)?;
        let intermediary = self.call(through_rel)?;

        let (left_keys, right_keys) =
            match ViaDefinition::resolve(relationship, through_rel, mappers)? {
                Some(via) => (via.source_key, via.target_key),
                None if relationship.source_key.is_empty()
                    || relationship.target_key.is_empty() =>
                {
                    return Err(Error::new(ErrorKind::AmbiguousVia {
                        relationship: relationship.name.clone(),
                        reason: format!(
                            "no relationship on {} leads to {}",
                            through_rel.target_model, relationship.target_model
                        ),
                    }));
                }
                None => (
                    relationship.source_key.clone(),
                    relationship.target_key.clone(),
                ),
            };

        let owner = intermediary.target_node().clone();
        Ok(Hop {
            left: intermediary.node().name().clone(),
            right: target.schema.name.clone(),
            left_keys: left_keys
                .into_iter()
                .map(|k| AttributeAlias::new(k, owner.clone()))
                .collect(),
            right_keys,
        })
    }

    /// The target base node, or an aliased copy when the base node's
    /// attributes are already part of the left node (self joins).
    fn right_node(
        &mut self,
        relationship: &Relationship,
        hop: &Hop,
        left: &NodeOf<E>,
        target: &Mapper,
    ) -> Result<NodeOf<E>> {
        let base = self.base_node(&hop.right, target)?;
        let overlaps = base
            .aliases()
            .entries()
            .keys()
            .any(|key| left.aliases().contains(key));
        if !overlaps {
            return Ok(base);
        }
        let aliased = hop
            .right
            .join(&self.registry.config().alias_infix, &relationship.name);
        self.base_node(&aliased, target)
    }

    fn base_node(&mut self, name: &Name, mapper: &Mapper) -> Result<NodeOf<E>> {
        match self.registry.node(name) {
            Some(node) => Ok(node.clone()),
            None => {
                let node = self.registry.gateway_node(name, &mapper.schema)?;
                debug!(node = %node.name(), model = %mapper.model, "registered node");
                Ok(node)
            }
        }
    }

    /// Joined node for the edge, named after it.
    ///
    /// The node is computed once per edge and join definition; later requests
    /// get the registered node. A join under an already taken name is
    /// registered as `"{edge}__{relationship}"`.
    fn joined_node(
        &mut self,
        edge: &Arc<EdgeOf<E>>,
        left: &NodeOf<E>,
        definition: &JoinDefinition,
        name: &Name,
        relationship: &Relationship,
    ) -> Result<NodeOf<E>> {
        if let Some(existing) = self.registry.joined_node(edge, definition) {
            trace!(node = %existing.name(), "reusing joined node");
            return Ok(existing.clone());
        }
        let name = if self.registry.node(name).is_some() {
            name.join(ALIAS_SEPARATOR, &relationship.name)
        } else {
            name.clone()
        };
        let node = edge.node(left.relation(), definition, &name)?;
        self.registry.add_joined_node(edge, definition.clone(), node)
    }
}
