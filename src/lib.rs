//! Joinery - Relation graph and attribute aliasing engine
//!
//! This crate re-exports all layers of the Joinery system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 2: joinery_graph      - Alias indices, nodes, edges, registry, connectors, finalize
//! Layer 1: joinery_storage    - Relation algebra, engine contract, in-memory engine
//! Layer 0: joinery_foundation - Core types (Name, Value, AttributeAlias, Error)
//! ```

pub use joinery_foundation as foundation;
pub use joinery_graph as graph;
pub use joinery_storage as storage;
