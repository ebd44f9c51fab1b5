//! Relation nodes: an engine relation plus its alias index.

use std::hash::{Hash, Hasher};

use joinery_foundation::{ALIAS_SEPARATOR, Name, Result};
use joinery_storage::{Criteria, Header, Relation, Renames, Tuples};

use crate::alias_index::{AliasIndex, JoinDefinition, JoinStrategy};

/// A named relation in the graph.
///
/// Nodes are immutable: every algebra operation returns a new node. Two
/// nodes are equal when they are of the same kind (base or joined) and wrap
/// equal relations, regardless of name.
#[derive(Clone, Debug)]
pub struct RelationNode<R> {
    name: Name,
    relation: R,
    aliases: AliasIndex,
    base: bool,
}

impl<R: Relation> RelationNode<R> {
    /// Wraps a gateway relation, renaming every attribute `a` to `"{name}__{a}"`.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine rejects the rename.
    pub fn base(name: &Name, relation: &R, strategy: JoinStrategy) -> Result<Self> {
        let aliases = AliasIndex::base(name, relation.header()).with_strategy(strategy);
        let renames: Renames = relation
            .header()
            .iter()
            .map(|attr| (attr.clone(), name.join(ALIAS_SEPARATOR, attr)))
            .collect();
        Ok(Self {
            name: name.clone(),
            relation: relation.rename(&renames)?,
            aliases,
            base: true,
        })
    }

    /// Wraps an already aliased relation with an explicit alias index.
    ///
    /// # Errors
    ///
    /// Returns an error if an alias in the index is not part of the relation's header.
    pub fn with_aliases(name: &Name, relation: R, aliases: AliasIndex) -> Result<Self> {
        let aliased: Vec<Name> = aliases.header().into_iter().collect();
        relation.header().require(name, &aliased)?;
        Ok(Self {
            name: name.clone(),
            relation,
            aliases,
            base: false,
        })
    }

    /// The node name.
    #[must_use]
    pub fn name(&self) -> &Name {
        &self.name
    }

    /// The wrapped engine relation.
    #[must_use]
    pub fn relation(&self) -> &R {
        &self.relation
    }

    /// The alias index.
    #[must_use]
    pub fn aliases(&self) -> &AliasIndex {
        &self.aliases
    }

    /// The relation's header (current aliases).
    #[must_use]
    pub fn header(&self) -> &Header {
        self.relation.header()
    }

    /// Returns true for nodes created directly from a gateway relation.
    #[must_use]
    pub fn is_base(&self) -> bool {
        self.base
    }

    /// Joins two nodes into a new node named `name`.
    ///
    /// Both relations are renamed to the joined alias index first, so the
    /// engine's natural join matches exactly the join-key aliases.
    ///
    /// # Errors
    ///
    /// Returns an error if the alias indices cannot be joined on `definition`
    /// or the engine rejects the rename or join.
    pub fn join(&self, other: &Self, definition: &JoinDefinition, name: &Name) -> Result<Self> {
        let aliases = self.aliases.join(&other.aliases, definition, name)?;
        let left = self.relation.rename(&aliases.renames_from(&self.aliases))?;
        let right = other.relation.rename(&aliases.renames_from(&other.aliases))?;
        Ok(Self {
            name: name.clone(),
            relation: left.join(&right)?,
            aliases,
            base: false,
        })
    }

    /// Keeps tuples matching `criteria` (expressed in current aliases).
    ///
    /// # Errors
    ///
    /// Returns an error if the criteria reference unknown aliases.
    pub fn restrict(&self, criteria: &Criteria) -> Result<Self> {
        Ok(self.derive(self.relation.restrict(criteria)?, self.aliases.clone()))
    }

    /// Keeps only the listed aliases.
    ///
    /// # Errors
    ///
    /// Returns an error if an alias is not visible on this node.
    pub fn project(&self, aliases: &[Name]) -> Result<Self> {
        let index = self.aliases.project(aliases)?;
        Ok(self.derive(self.relation.project(aliases)?, index))
    }

    /// Sorts by the listed aliases.
    ///
    /// # Errors
    ///
    /// Returns an error if an alias is not visible on this node.
    pub fn order(&self, aliases: &[Name]) -> Result<Self> {
        Ok(self.derive(self.relation.order(aliases)?, self.aliases.clone()))
    }

    /// Renames visible aliases.
    ///
    /// # Errors
    ///
    /// Returns an error if an old alias is unknown or a new alias collides.
    pub fn rename(&self, renames: &Renames) -> Result<Self> {
        let index = self.aliases.rename(renames)?;
        Ok(self.derive(self.relation.rename(renames)?, index))
    }

    /// Iterates the node's tuples.
    pub fn tuples(&self) -> Tuples<'_> {
        self.relation.tuples()
    }

    fn derive(&self, relation: R, aliases: AliasIndex) -> Self {
        Self {
            name: self.name.clone(),
            relation,
            aliases,
            base: false,
        }
    }
}

impl<R: PartialEq> PartialEq for RelationNode<R> {
    fn eq(&self, other: &Self) -> bool {
        self.base == other.base && self.relation == other.relation
    }
}

impl<R: Eq> Eq for RelationNode<R> {}

impl<R: Hash> Hash for RelationNode<R> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.base.hash(state);
        self.relation.hash(state);
    }
}
