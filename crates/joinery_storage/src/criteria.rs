//! Restriction criteria.

use joinery_foundation::{Name, Tuple, Value};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Conjunction of `attribute = value` predicates.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Criteria(Vec<(Name, Value)>);

impl Criteria {
    /// Creates empty criteria (matches every tuple).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an equality predicate.
    #[must_use]
    pub fn equal(mut self, attribute: impl Into<Name>, value: impl Into<Value>) -> Self {
        self.0.push((attribute.into(), value.into()));
        self
    }

    /// Returns true if no predicates are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Attribute names referenced by the predicates.
    #[must_use]
    pub fn attributes(&self) -> Vec<Name> {
        self.0.iter().map(|(n, _)| n.clone()).collect()
    }

    /// Iterates the predicates in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&Name, &Value)> {
        self.0.iter().map(|(n, v)| (n, v))
    }

    /// Returns criteria with every attribute name passed through `rename`.
    #[must_use]
    pub fn rename_with(&self, rename: impl Fn(&Name) -> Name) -> Self {
        Self(self.0.iter().map(|(n, v)| (rename(n), v.clone())).collect())
    }

    /// Returns true if `tuple` satisfies every predicate.
    #[must_use]
    pub fn matches(&self, tuple: &Tuple) -> bool {
        self.0
            .iter()
            .all(|(name, value)| tuple.get(name).unwrap_or(&Value::Nil) == value)
    }
}
