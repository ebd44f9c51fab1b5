//! Relation graph and attribute aliasing for Joinery.
//!
//! This crate provides:
//! - [`AliasIndex`] and [`JoinStrategy`] - Collision-free attribute aliasing across joins
//! - [`RelationNode`] and [`Edge`] - Nodes wrapping engine relations, and joins between them
//! - [`RelationRegistry`] - The graph: named nodes, deduplicated edges, connectors
//! - [`ConnectorBuilder`] and [`ViaDefinition`] - Resolving relationships into join paths
//! - [`Finalizer`] - The one-time pass turning declared relationships into a registry
//!
//! # Example
//!
//! ```
//! use joinery_graph::{Finalizer, Mapper, MapperRegistry, RelationRegistry, Relationship};
//! use joinery_storage::{MemoryEngine, RelationSchema};
//!
//! let mut engine = MemoryEngine::new();
//! engine.dataset("users");
//! engine.dataset("tasks");
//!
//! let mut mappers = MapperRegistry::new();
//! mappers.register(
//!     Mapper::new("User", RelationSchema::new("users", ["id", "name"])?)
//!         .with_relationship(Relationship::one_to_many("tasks", "User", "Task")),
//! )?;
//! mappers.register(Mapper::new(
//!     "Task",
//!     RelationSchema::new("tasks", ["id", "user_id", "title"])?,
//! ))?;
//!
//! let mut registry = RelationRegistry::new(engine);
//! Finalizer::new(&mappers).run(&mut registry)?;
//! assert_eq!(registry["users_X_tasks"].name(), "users_X_tasks");
//! # Ok::<(), joinery_foundation::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod alias_index;
pub mod config;
pub mod connector;
pub mod edge;
pub mod finalize;
pub mod mapper;
pub mod node;
pub mod registry;
pub mod relationship;
pub mod via;

pub use alias_index::{AliasIndex, JoinDefinition, JoinStrategy};
pub use config::GraphConfig;
pub use connector::{Connector, ConnectorBuilder};
pub use edge::{Edge, Side};
pub use finalize::{BaseRelationMappersFinalizer, Finalizer, RelationshipMappersFinalizer};
pub use mapper::{Mapper, MapperRegistry};
pub use node::RelationNode;
pub use registry::{ConnectorKey, ConnectorOf, EdgeOf, NodeOf, RelationRegistry};
pub use relationship::{Cardinality, Operation, OperationStep, Relationship};
pub use via::ViaDefinition;
