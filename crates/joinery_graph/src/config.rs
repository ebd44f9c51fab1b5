//! Configuration for relation graph construction.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::alias_index::JoinStrategy;

/// Configuration for building a [`RelationRegistry`](crate::RelationRegistry).
///
/// Controls how generated nodes are named and whether the registry is
/// frozen once finalize completes.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GraphConfig {
    /// Separator between left and right node names in a joined node name.
    pub node_separator: String,

    /// Infix naming an aliased copy of a base node (`people_as_parent`).
    pub alias_infix: String,

    /// Prefix for counter-named ad hoc join nodes (`node_1`).
    pub anonymous_node_prefix: String,

    /// Alias policy for base nodes and everything joined onto them.
    pub join_strategy: JoinStrategy,

    /// Freeze the registry after a successful finalize.
    pub freeze_on_finalize: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            node_separator: "_X_".to_string(),
            alias_infix: "_as_".to_string(),
            anonymous_node_prefix: "node".to_string(),
            join_strategy: JoinStrategy::KeyPair,
            freeze_on_finalize: true,
        }
    }
}

impl GraphConfig {
    /// The default configuration: explicit key-pair joins, frozen after finalize.
    #[must_use]
    pub fn strict() -> Self {
        Self::default()
    }

    /// A configuration that leaves the registry open after finalize.
    ///
    /// Useful when tests add nodes or edges after the finalize passes.
    #[must_use]
    pub fn unfrozen() -> Self {
        Self {
            freeze_on_finalize: false,
            ..Self::default()
        }
    }

    /// Builder method to set the node separator.
    #[must_use]
    pub fn with_node_separator(mut self, separator: impl Into<String>) -> Self {
        self.node_separator = separator.into();
        self
    }

    /// Builder method to set the aliased node infix.
    #[must_use]
    pub fn with_alias_infix(mut self, infix: impl Into<String>) -> Self {
        self.alias_infix = infix.into();
        self
    }

    /// Builder method to set the anonymous node prefix.
    #[must_use]
    pub fn with_anonymous_node_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.anonymous_node_prefix = prefix.into();
        self
    }

    /// Builder method to set the join strategy.
    #[must_use]
    pub fn with_join_strategy(mut self, strategy: JoinStrategy) -> Self {
        self.join_strategy = strategy;
        self
    }

    /// Builder method to enable/disable freezing after finalize.
    #[must_use]
    pub fn with_freeze_on_finalize(mut self, freeze: bool) -> Self {
        self.freeze_on_finalize = freeze;
        self
    }
}
