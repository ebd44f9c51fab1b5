//! Storage engine capability.

use joinery_foundation::{Name, Result};

use crate::relation::Relation;
use crate::schema::Header;

/// What a storage backend supplies to build a relation graph.
///
/// The graph is generic over the engine's relation type; it never touches
/// backend types beyond this contract.
pub trait Engine {
    /// The engine's relation handle.
    type Relation: Relation;

    /// Human-readable engine name (`"memory"`, `"postgres"`, ...).
    fn name(&self) -> &str;

    /// Builds an unbound relation with the given name and header.
    fn base_relation(&self, name: &Name, header: &Header) -> Self::Relation;

    /// Binds a base relation to its live data source.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine has no data source for the relation.
    fn gateway_relation(&self, relation: Self::Relation) -> Result<Self::Relation>;
}
