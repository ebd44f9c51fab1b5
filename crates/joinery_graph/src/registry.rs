//! The relation registry: named nodes, deduplicated edges, and connectors.
//!
//! The registry is the only mutable state while finalizing. It is written by
//! a single owner; once frozen, every `add_*` call fails and the registry can
//! be shared read-only across threads.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::Index;
use std::sync::Arc;

use joinery_foundation::{Error, ErrorKind, Name, Result};
use joinery_storage::{Engine, RelationSchema};
use tracing::trace;

use crate::alias_index::{AliasIndex, JoinDefinition};
use crate::config::GraphConfig;
use crate::connector::Connector;
use crate::edge::{Edge, Side};
use crate::node::RelationNode;
use crate::relationship::Operation;

/// Node type of a registry over engine `E`.
pub type NodeOf<E> = RelationNode<<E as Engine>::Relation>;

/// Edge type of a registry over engine `E`.
pub type EdgeOf<E> = Edge<<E as Engine>::Relation>;

/// Connector type of a registry over engine `E`.
pub type ConnectorOf<E> = Connector<<E as Engine>::Relation>;

/// Connector key: source model and relationship name.
pub type ConnectorKey = (Name, Name);

/// Graph of relation nodes for one engine.
pub struct RelationRegistry<E: Engine> {
    engine: E,
    config: GraphConfig,
    nodes: BTreeMap<Name, NodeOf<E>>,
    node_index: HashMap<E::Relation, Name>,
    edges: Vec<Arc<EdgeOf<E>>>,
    edge_index: HashSet<Arc<EdgeOf<E>>>,
    joined: HashMap<Arc<EdgeOf<E>>, HashMap<JoinDefinition, Name>>,
    connectors: BTreeMap<ConnectorKey, Arc<ConnectorOf<E>>>,
    anonymous_nodes: u64,
    frozen: bool,
}

impl<E: Engine> RelationRegistry<E> {
    /// Creates an empty registry with the default configuration.
    #[must_use]
    pub fn new(engine: E) -> Self {
        Self::with_config(engine, GraphConfig::default())
    }

    /// Creates an empty registry with a custom configuration.
    #[must_use]
    pub fn with_config(engine: E, config: GraphConfig) -> Self {
        Self {
            engine,
            config,
            nodes: BTreeMap::new(),
            node_index: HashMap::new(),
            edges: Vec::new(),
            edge_index: HashSet::new(),
            joined: HashMap::new(),
            connectors: BTreeMap::new(),
            anonymous_nodes: 0,
            frozen: false,
        }
    }

    /// The engine.
    #[must_use]
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    // =========================================================================
    // Nodes
    // =========================================================================

    /// Registers a node under its name.
    ///
    /// If a node wrapping the same relation is already registered, that node
    /// is returned and `node` is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::NodeNameTaken`] if the name belongs to a different
    /// node, or [`ErrorKind::RegistryFrozen`] after [`freeze`](Self::freeze).
    pub fn add_node(&mut self, node: NodeOf<E>) -> Result<NodeOf<E>> {
        self.ensure_open("add node")?;
        if let Some(existing) = self.node_for(node.relation()) {
            trace!(node = %existing.name(), requested = %node.name(), "reusing node");
            return Ok(existing.clone());
        }
        if self.nodes.contains_key(node.name()) {
            return Err(Error::node_name_taken(node.name().clone()));
        }
        self.node_index
            .insert(node.relation().clone(), node.name().clone());
        self.nodes.insert(node.name().clone(), node.clone());
        Ok(node)
    }

    /// Builds and registers a node.
    ///
    /// Without `aliases` the relation is treated as a base relation and every
    /// attribute is aliased under `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the node cannot be built or registered.
    pub fn new_node(
        &mut self,
        name: &Name,
        relation: E::Relation,
        aliases: Option<AliasIndex>,
    ) -> Result<NodeOf<E>> {
        let node = match aliases {
            Some(aliases) => RelationNode::with_aliases(name, relation, aliases)?,
            None => RelationNode::base(name, &relation, self.config.join_strategy)?,
        };
        self.add_node(node)
    }

    /// Registers a base node for `schema` bound to the engine's data source.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine has no data source for the schema or the
    /// node cannot be registered.
    pub fn gateway_node(&mut self, name: &Name, schema: &RelationSchema) -> Result<NodeOf<E>> {
        let relation = self
            .engine
            .gateway_relation(self.engine.base_relation(&schema.name, &schema.header))?;
        self.new_node(name, relation, None)
    }

    /// Next counter-based name for an ad hoc join node (`node_1`, `node_2`, ...).
    pub fn next_node_name(&mut self) -> Name {
        self.anonymous_nodes += 1;
        Name::new(format!(
            "{}_{}",
            self.config.anonymous_node_prefix, self.anonymous_nodes
        ))
    }

    /// Joins two registered nodes into a new counter-named node.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::MissingNode`] if either node is unknown, or an
    /// error if the join fails.
    pub fn join_nodes(
        &mut self,
        left: &str,
        right: &str,
        definition: &JoinDefinition,
    ) -> Result<NodeOf<E>> {
        let left = self.require_node(left)?.clone();
        let right = self.require_node(right)?.clone();
        self.ensure_open("add node")?;
        let name = self.next_node_name();
        let node = left.join(&right, definition, &name)?;
        self.add_node(node)
    }

    /// Looks up a node by name.
    #[must_use]
    pub fn node(&self, name: &str) -> Option<&NodeOf<E>> {
        self.nodes.get(name)
    }

    /// Looks up a node by name.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::MissingNode`] if no node has that name.
    pub fn require_node(&self, name: &str) -> Result<&NodeOf<E>> {
        self.node(name)
            .ok_or_else(|| Error::missing_node(Name::new(name)))
    }

    /// The node wrapping `relation`.
    #[must_use]
    pub fn node_for(&self, relation: &E::Relation) -> Option<&NodeOf<E>> {
        self.node_index
            .get(relation)
            .and_then(|name| self.nodes.get(name))
    }

    /// All nodes, by name.
    #[must_use]
    pub fn nodes(&self) -> &BTreeMap<Name, NodeOf<E>> {
        &self.nodes
    }

    // =========================================================================
    // Edges
    // =========================================================================

    /// Builds an edge without registering it.
    #[must_use]
    #[allow(clippy::unused_self)]
    pub fn build_edge(
        &self,
        name: Name,
        left: Side<E::Relation>,
        right: Side<E::Relation>,
        operation: Option<Operation>,
    ) -> EdgeOf<E> {
        Edge::new(name, left, right, operation)
    }

    /// Registers an edge, returning the existing instance if an equal edge
    /// is already registered.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::RegistryFrozen`] after [`freeze`](Self::freeze).
    pub fn add_edge(&mut self, edge: EdgeOf<E>) -> Result<Arc<EdgeOf<E>>> {
        self.ensure_open("add edge")?;
        if let Some(existing) = self.edge_index.get(&edge) {
            trace!(edge = %existing.name(), requested = %edge.name(), "reusing edge");
            return Ok(Arc::clone(existing));
        }
        let edge = Arc::new(edge);
        self.edges.push(Arc::clone(&edge));
        self.edge_index.insert(Arc::clone(&edge));
        Ok(edge)
    }

    /// The first registered edge joining `a` and `b`, in either order.
    #[must_use]
    pub fn edge_for(&self, a: &NodeOf<E>, b: &NodeOf<E>) -> Option<&Arc<EdgeOf<E>>> {
        self.edges
            .iter()
            .find(|edge| edge.connects(a.relation(), b.relation()))
    }

    /// All edges, in registration order.
    #[must_use]
    pub fn edges(&self) -> &[Arc<EdgeOf<E>>] {
        &self.edges
    }

    /// The node registered for joining `edge` on `definition`.
    #[must_use]
    pub fn joined_node(
        &self,
        edge: &EdgeOf<E>,
        definition: &JoinDefinition,
    ) -> Option<&NodeOf<E>> {
        self.joined
            .get(edge)
            .and_then(|nodes| nodes.get(definition))
            .and_then(|name| self.nodes.get(name))
    }

    /// Registers the node joining `edge` on `definition`.
    ///
    /// Later [`joined_node`](Self::joined_node) lookups for the same edge and
    /// definition return the registered node.
    ///
    /// # Errors
    ///
    /// Returns an error if the node cannot be registered.
    pub fn add_joined_node(
        &mut self,
        edge: &Arc<EdgeOf<E>>,
        definition: JoinDefinition,
        node: NodeOf<E>,
    ) -> Result<NodeOf<E>> {
        let node = self.add_node(node)?;
        self.joined
            .entry(Arc::clone(edge))
            .or_default()
            .insert(definition, node.name().clone());
        Ok(node)
    }

    // =========================================================================
    // Connectors
    // =========================================================================

    /// Registers a connector under its source model and relationship name.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::DuplicateConnector`] if the model's relationship
    /// already has a connector, or [`ErrorKind::RegistryFrozen`] after
    /// [`freeze`](Self::freeze).
    pub fn add_connector(&mut self, connector: ConnectorOf<E>) -> Result<Arc<ConnectorOf<E>>> {
        self.ensure_open("add connector")?;
        let relationship = connector.relationship();
        let key = (
            relationship.source_model.clone(),
            relationship.name.clone(),
        );
        if self.connectors.contains_key(&key) {
            return Err(Error::new(ErrorKind::DuplicateConnector(key.1)));
        }
        let connector = Arc::new(connector);
        self.connectors.insert(key, Arc::clone(&connector));
        Ok(connector)
    }

    /// The connector for a relationship name.
    ///
    /// Returns `None` when no model, or more than one model, declares a
    /// relationship of that name; use [`connector_of`](Self::connector_of)
    /// then.
    #[must_use]
    pub fn connector(&self, relationship: &str) -> Option<&Arc<ConnectorOf<E>>> {
        let mut named = self
            .connectors
            .iter()
            .filter(|((_, name), _)| name == relationship)
            .map(|(_, connector)| connector);
        let first = named.next()?;
        named.next().is_none().then_some(first)
    }

    /// The connector for `model`'s relationship.
    #[must_use]
    pub fn connector_of(&self, model: &str, relationship: &str) -> Option<&Arc<ConnectorOf<E>>> {
        self.connectors
            .get(&(Name::new(model), Name::new(relationship)))
    }

    /// All connectors, by source model and relationship name.
    #[must_use]
    pub fn connectors(&self) -> &BTreeMap<ConnectorKey, Arc<ConnectorOf<E>>> {
        &self.connectors
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Rejects every further `add_*` call.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Returns true once [`freeze`](Self::freeze) has been called.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    fn ensure_open(&self, operation: &'static str) -> Result<()> {
        if self.frozen {
            Err(Error::frozen(operation))
        } else {
            Ok(())
        }
    }
}

impl<E: Engine> Index<&str> for RelationRegistry<E> {
    type Output = NodeOf<E>;

    /// # Panics
    ///
    /// Panics if no node has that name. Use [`RelationRegistry::node`] for
    /// a fallible lookup.
    fn index(&self, name: &str) -> &Self::Output {
        match self.nodes.get(name) {
            Some(node) => node,
            None => panic!("no node named {name}"),
        }
    }
}
