//! Relationship descriptors.
//!
//! A [`Relationship`] is declared once per mapper by the setup layer and is
//! read-only for the graph. It says which models are related and on which
//! keys, independent of how the join is physically built.

use joinery_foundation::{Name, underscore};
use joinery_storage::Criteria;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How many target objects a relationship loads per source object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Cardinality {
    /// At most one target (`belongs_to`, `has_one`).
    One,
    /// A collection of targets (`has_many`).
    Many,
}

/// One transform applied to a joined relation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OperationStep {
    /// Keep tuples whose target attributes match.
    Restrict(Criteria),
    /// Sort by target attributes.
    Order(Vec<Name>),
}

/// Ordered transform applied to a relationship's joined relation.
///
/// Attribute names refer to the target model's attributes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Operation {
    /// Steps in application order.
    pub steps: Vec<OperationStep>,
}

impl Operation {
    /// Creates an empty operation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a restriction.
    #[must_use]
    pub fn restrict(mut self, criteria: Criteria) -> Self {
        self.steps.push(OperationStep::Restrict(criteria));
        self
    }

    /// Appends an ordering.
    #[must_use]
    pub fn order<I, N>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Name>,
    {
        self.steps
            .push(OperationStep::Order(names.into_iter().map(Into::into).collect()));
        self
    }
}

/// A declared relationship between two models.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Relationship {
    /// Relationship name, unique within a registry (`tasks`, `parent`).
    pub name: Name,
    /// Model declaring the relationship.
    pub source_model: Name,
    /// Model the relationship loads.
    pub target_model: Name,
    /// Join attributes on the source side.
    pub source_key: Vec<Name>,
    /// Join attributes on the target side.
    pub target_key: Vec<Name>,
    /// One or many targets.
    pub cardinality: Cardinality,
    /// Intermediary relationship (on the source model) to traverse first.
    pub through: Option<Name>,
    /// Relationship on the intermediary's target that leads to the final target.
    pub via: Option<Name>,
    /// Transform applied to the joined relation.
    pub operation: Option<Operation>,
}

impl Relationship {
    fn new(
        name: impl Into<Name>,
        source_model: impl Into<Name>,
        target_model: impl Into<Name>,
        cardinality: Cardinality,
    ) -> Self {
        Self {
            name: name.into(),
            source_model: source_model.into(),
            target_model: target_model.into(),
            source_key: Vec::new(),
            target_key: Vec::new(),
            cardinality,
            through: None,
            via: None,
            operation: None,
        }
    }

    /// `source has_many targets`: source `id` to target `{source}_id`.
    #[must_use]
    pub fn one_to_many(
        name: impl Into<Name>,
        source_model: impl Into<Name>,
        target_model: impl Into<Name>,
    ) -> Self {
        let mut rel = Self::new(name, source_model, target_model, Cardinality::Many);
        rel.source_key = vec![Name::new("id")];
        rel.target_key = vec![underscore(&rel.source_model).join("", "_id")];
        rel
    }

    /// `source has_one target`: keys as for [`Relationship::one_to_many`].
    #[must_use]
    pub fn one_to_one(
        name: impl Into<Name>,
        source_model: impl Into<Name>,
        target_model: impl Into<Name>,
    ) -> Self {
        Self {
            cardinality: Cardinality::One,
            ..Self::one_to_many(name, source_model, target_model)
        }
    }

    /// `source belongs_to target`: source `{name}_id` to target `id`.
    #[must_use]
    pub fn many_to_one(
        name: impl Into<Name>,
        source_model: impl Into<Name>,
        target_model: impl Into<Name>,
    ) -> Self {
        let mut rel = Self::new(name, source_model, target_model, Cardinality::One);
        rel.source_key = vec![rel.name.join("", "_id")];
        rel.target_key = vec![Name::new("id")];
        rel
    }

    /// `source has_many targets through intermediary`.
    ///
    /// The own keys (`{target}_id` to `id`) are only used when no `via`
    /// relationship can be resolved on the intermediary.
    #[must_use]
    pub fn many_to_many(
        name: impl Into<Name>,
        source_model: impl Into<Name>,
        target_model: impl Into<Name>,
        through: impl Into<Name>,
    ) -> Self {
        let mut rel = Self::new(name, source_model, target_model, Cardinality::Many);
        rel.source_key = vec![underscore(&rel.target_model).join("", "_id")];
        rel.target_key = vec![Name::new("id")];
        rel.through = Some(through.into());
        rel
    }

    /// Sets the source-side join attributes.
    #[must_use]
    pub fn with_source_key<I, N>(mut self, key: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Name>,
    {
        self.source_key = key.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the target-side join attributes.
    #[must_use]
    pub fn with_target_key<I, N>(mut self, key: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Name>,
    {
        self.target_key = key.into_iter().map(Into::into).collect();
        self
    }

    /// Routes the relationship through an intermediary relationship.
    #[must_use]
    pub fn through(mut self, through: impl Into<Name>) -> Self {
        self.through = Some(through.into());
        self
    }

    /// Names the intermediary's relationship that leads to the target.
    #[must_use]
    pub fn via(mut self, via: impl Into<Name>) -> Self {
        self.via = Some(via.into());
        self
    }

    /// Sets the transform applied to the joined relation.
    #[must_use]
    pub fn with_operation(mut self, operation: Operation) -> Self {
        self.operation = Some(operation);
        self
    }

    /// Returns true if the mapper loads a collection of targets.
    #[must_use]
    pub fn is_collection(&self) -> bool {
        self.cardinality == Cardinality::Many
    }

    /// Returns true if the relationship traverses an intermediary.
    #[must_use]
    pub fn is_through(&self) -> bool {
        self.through.is_some()
    }
}
