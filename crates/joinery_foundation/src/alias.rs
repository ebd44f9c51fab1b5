//! Attribute aliases.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::name::Name;

/// Separator between a relation name and an attribute name in generated aliases.
pub const ALIAS_SEPARATOR: &str = "__";

/// An attribute name qualified by the relation that owns it.
///
/// Used both as the canonical key of an attribute (`tasks.user_id`) and as
/// the currently visible alias of that attribute (`users_X_tasks__join_1`,
/// owned by the node that introduced it).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AttributeAlias {
    /// Attribute name.
    pub name: Name,
    /// Name of the owning relation or node.
    pub relation: Name,
}

impl AttributeAlias {
    /// Creates a new alias.
    #[must_use]
    pub fn new(name: impl Into<Name>, relation: impl Into<Name>) -> Self {
        Self {
            name: name.into(),
            relation: relation.into(),
        }
    }

    /// The namespaced alias `"{relation}__{name}"` for this attribute.
    #[must_use]
    pub fn prefixed(&self) -> Name {
        self.relation.join(ALIAS_SEPARATOR, &self.name)
    }
}

impl fmt::Debug for AttributeAlias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.relation, self.name)
    }
}

impl fmt::Display for AttributeAlias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.relation, self.name)
    }
}
