//! Relation algebra capability, engine contract, and in-memory engine for Joinery.
//!
//! This crate provides:
//! - [`Relation`] - The closed algebra a relation graph may ask of an engine
//! - [`Engine`] - The capability a storage backend supplies
//! - [`Header`] and [`RelationSchema`] - Attribute lists and mapper schemas
//! - [`MemoryEngine`] - An in-memory engine with thread-safe datasets

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod criteria;
pub mod engine;
pub mod memory;
pub mod relation;
pub mod schema;

pub use criteria::Criteria;
pub use engine::Engine;
pub use memory::{Dataset, MemoryEngine, MemoryRelation};
pub use relation::{Relation, Renames, Tuples};
pub use schema::{Header, RelationSchema};
