//! Edges: joins between two nodes.
//!
//! Edge identity is the unordered pair of side relations plus the
//! operation, so requesting `A -> B` and `B -> A` yields the same edge.

use std::collections::BTreeMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use joinery_foundation::{AttributeAlias, Error, Name, Result};
use joinery_storage::Relation;

use crate::alias_index::JoinDefinition;
use crate::node::RelationNode;
use crate::relationship::{Operation, OperationStep};

/// One end of an edge: a node and the keys it joins on.
#[derive(Clone, Debug)]
pub struct Side<R> {
    node: RelationNode<R>,
    keys: Vec<AttributeAlias>,
}

impl<R: Relation> Side<R> {
    /// Creates a side.
    #[must_use]
    pub fn new(node: RelationNode<R>, keys: Vec<AttributeAlias>) -> Self {
        Self { node, keys }
    }

    /// The side's node.
    #[must_use]
    pub fn node(&self) -> &RelationNode<R> {
        &self.node
    }

    /// The join keys, as canonical attribute keys.
    #[must_use]
    pub fn keys(&self) -> &[AttributeAlias] {
        &self.keys
    }

    /// The side's relation.
    #[must_use]
    pub fn relation(&self) -> &R {
        self.node.relation()
    }
}

/// A join between two nodes, optionally followed by an operation.
#[derive(Clone, Debug)]
pub struct Edge<R> {
    name: Name,
    left: Side<R>,
    right: Side<R>,
    operation: Option<Operation>,
}

impl<R: Relation> Edge<R> {
    /// Creates an edge.
    #[must_use]
    pub fn new(name: Name, left: Side<R>, right: Side<R>, operation: Option<Operation>) -> Self {
        Self {
            name,
            left,
            right,
            operation,
        }
    }

    /// The edge name (`users_X_tasks`).
    #[must_use]
    pub fn name(&self) -> &Name {
        &self.name
    }

    /// The side the edge was built from.
    #[must_use]
    pub fn left(&self) -> &Side<R> {
        &self.left
    }

    /// The side the edge was built towards.
    #[must_use]
    pub fn right(&self) -> &Side<R> {
        &self.right
    }

    /// The operation applied after the join.
    #[must_use]
    pub fn operation(&self) -> Option<&Operation> {
        self.operation.as_ref()
    }

    /// Returns true if the edge joins exactly these two relations, in either order.
    #[must_use]
    pub fn connects(&self, a: &R, b: &R) -> bool {
        (self.left.relation() == a && self.right.relation() == b)
            || (self.left.relation() == b && self.right.relation() == a)
    }

    /// The side wrapping `relation`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::NotAnEdgeSide`](joinery_foundation::ErrorKind::NotAnEdgeSide)
    /// if `relation` is not one of the two sides.
    pub fn source_side(&self, relation: &R) -> Result<&Side<R>> {
        if self.left.relation() == relation {
            Ok(&self.left)
        } else if self.right.relation() == relation {
            Ok(&self.right)
        } else {
            Err(self.not_a_side(relation))
        }
    }

    /// The side opposite the one wrapping `relation`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::NotAnEdgeSide`](joinery_foundation::ErrorKind::NotAnEdgeSide)
    /// if `relation` is not one of the two sides.
    pub fn target_side(&self, relation: &R) -> Result<&Side<R>> {
        if self.left.relation() == relation {
            Ok(&self.right)
        } else if self.right.relation() == relation {
            Ok(&self.left)
        } else {
            Err(self.not_a_side(relation))
        }
    }

    /// Join definition oriented from the side wrapping `source`, using the
    /// keys the edge was built with.
    ///
    /// # Errors
    ///
    /// Returns an error if `source` is not a side or the key lists do not pair up.
    pub fn definition(&self, source: &R) -> Result<JoinDefinition> {
        JoinDefinition::from_keys(
            self.source_side(source)?.keys(),
            self.target_side(source)?.keys(),
        )
    }

    /// Joins the side wrapping `source` to the opposite side on `definition`,
    /// then applies the edge operation.
    ///
    /// Attribute names in operation steps refer to the target side's
    /// attributes and are resolved through the joined alias index.
    ///
    /// # Errors
    ///
    /// Returns an error if `source` is not a side, the join fails, or an
    /// operation step names an unknown target attribute.
    pub fn node(
        &self,
        source: &R,
        definition: &JoinDefinition,
        name: &Name,
    ) -> Result<RelationNode<R>> {
        let source_side = self.source_side(source)?;
        let target_side = self.target_side(source)?;
        let joined = source_side
            .node()
            .join(target_side.node(), definition, name)?;
        match &self.operation {
            Some(operation) => apply(joined, operation, target_side.node().name()),
            None => Ok(joined),
        }
    }

    fn not_a_side(&self, relation: &R) -> Error {
        Error::not_an_edge_side(self.name.clone(), relation.name().clone())
    }
}

fn apply<R: Relation>(
    node: RelationNode<R>,
    operation: &Operation,
    target: &Name,
) -> Result<RelationNode<R>> {
    let resolve = |attr: &Name| -> Result<Name> {
        node.aliases()
            .get(&AttributeAlias::new(attr.clone(), target.clone()))
            .map(|alias| alias.name.clone())
            .ok_or_else(|| Error::unknown_attribute(attr, target))
    };
    let mut current = node.clone();
    for step in &operation.steps {
        current = match step {
            OperationStep::Restrict(criteria) => {
                let aliases = criteria
                    .attributes()
                    .iter()
                    .map(|attr| -> Result<(Name, Name)> {
                        Ok((attr.clone(), resolve(attr)?))
                    })
                    .collect::<Result<BTreeMap<_, _>>>()?;
                current.restrict(&criteria.rename_with(|attr| {
                    aliases.get(attr).cloned().unwrap_or_else(|| attr.clone())
                }))?
            }
            OperationStep::Order(names) => {
                let aliases = names.iter().map(&resolve).collect::<Result<Vec<_>>>()?;
                current.order(&aliases)?
            }
        };
    }
    Ok(current)
}

impl<R: Relation> PartialEq for Edge<R> {
    fn eq(&self, other: &Self) -> bool {
        self.operation == other.operation
            && self.connects(other.left.relation(), other.right.relation())
    }
}

impl<R: Relation> Eq for Edge<R> {}

impl<R: Relation> Hash for Edge<R> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let mut sides = [hash_of(self.left.relation()), hash_of(self.right.relation())];
        sides.sort_unstable();
        sides.hash(state);
        self.operation.hash(state);
    }
}

fn hash_of<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}
