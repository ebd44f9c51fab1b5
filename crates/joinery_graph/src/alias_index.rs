//! Per-node attribute alias indices.
//!
//! An [`AliasIndex`] maps the canonical key of every attribute reachable
//! through a node (`tasks.user_id`) to the alias that attribute is currently
//! visible under (`users_X_tasks__join_1`). Indices are persistent: join,
//! rename and project return new indices sharing structure with the old one.
//!
//! Within one index, two keys map to the same alias only when they are the
//! two sides of a join key pair (and so denote the same column).

use std::collections::{BTreeMap, BTreeSet};

use joinery_foundation::{ALIAS_SEPARATOR, AttributeAlias, Error, ErrorKind, Name, Result};
use joinery_storage::{Header, Renames};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// =============================================================================
// Join Strategy
// =============================================================================

/// How an alias index pairs join keys when joining with another index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum JoinStrategy {
    /// Join only on explicitly listed key pairs.
    #[default]
    KeyPair,
    /// Pair attributes sharing a name when no pairs are listed.
    Natural,
}

// =============================================================================
// Join Definition
// =============================================================================

/// Ordered key pairs a join is performed on: `left key = right key`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct JoinDefinition(Vec<(AttributeAlias, AttributeAlias)>);

impl JoinDefinition {
    /// Creates an empty definition.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a key pair.
    #[must_use]
    pub fn with(mut self, left: AttributeAlias, right: AttributeAlias) -> Self {
        self.0.push((left, right));
        self
    }

    /// Zips two key lists into pairs.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidJoin`] if the lists are empty or differ in length.
    pub fn from_keys(left: &[AttributeAlias], right: &[AttributeAlias]) -> Result<Self> {
        if left.is_empty() || left.len() != right.len() {
            return Err(Error::invalid_join(format!(
                "cannot pair {} left keys with {} right keys",
                left.len(),
                right.len()
            )));
        }
        Ok(Self(left.iter().cloned().zip(right.iter().cloned()).collect()))
    }

    /// Iterates the key pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = &(AttributeAlias, AttributeAlias)> {
        self.0.iter()
    }

    /// Returns the number of key pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no key pairs are listed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The left keys, in pair order.
    #[must_use]
    pub fn left_keys(&self) -> Vec<AttributeAlias> {
        self.0.iter().map(|(l, _)| l.clone()).collect()
    }

    /// The right keys, in pair order.
    #[must_use]
    pub fn right_keys(&self) -> Vec<AttributeAlias> {
        self.0.iter().map(|(_, r)| r.clone()).collect()
    }

    /// The same pairs with left and right swapped.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self(self.0.iter().map(|(l, r)| (r.clone(), l.clone())).collect())
    }
}

// =============================================================================
// Alias Index
// =============================================================================

/// Mapping from canonical attribute keys to their currently visible alias.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AliasIndex {
    node: Name,
    entries: im::OrdMap<AttributeAlias, AttributeAlias>,
    strategy: JoinStrategy,
}

impl AliasIndex {
    /// Index for a base node: every attribute `a` of `node` is visible as
    /// `"{node}__{a}"`.
    #[must_use]
    pub fn base(node: &Name, header: &Header) -> Self {
        let entries = header
            .iter()
            .map(|attr| {
                let key = AttributeAlias::new(attr.clone(), node.clone());
                let alias = AttributeAlias::new(key.prefixed(), node.clone());
                (key, alias)
            })
            .collect();
        Self {
            node: node.clone(),
            entries,
            strategy: JoinStrategy::default(),
        }
    }

    /// Sets the join strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: JoinStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Name of the node this index belongs to.
    #[must_use]
    pub fn node(&self) -> &Name {
        &self.node
    }

    /// The join strategy.
    #[must_use]
    pub fn strategy(&self) -> JoinStrategy {
        self.strategy
    }

    /// All entries, ordered by key.
    #[must_use]
    pub fn entries(&self) -> &im::OrdMap<AttributeAlias, AttributeAlias> {
        &self.entries
    }

    /// Returns the number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the index has no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current alias of `key`.
    #[must_use]
    pub fn get(&self, key: &AttributeAlias) -> Option<&AttributeAlias> {
        self.entries.get(key)
    }

    /// Current alias of the first key with attribute name `name`.
    ///
    /// Keys order by attribute name, then relation. When several joined
    /// relations share `name`, this is the key of the relation sorting first;
    /// use [`find_in`](Self::find_in) to pick one.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&AttributeAlias> {
        self.entries
            .iter()
            .find(|(key, _)| key.name == name)
            .map(|(_, alias)| alias)
    }

    /// Current alias of `relation`'s attribute `name`.
    #[must_use]
    pub fn find_in(&self, relation: &str, name: &str) -> Option<&AttributeAlias> {
        self.entries
            .get(&AttributeAlias::new(name, relation))
    }

    /// Returns true if `key` is part of the index.
    #[must_use]
    pub fn contains(&self, key: &AttributeAlias) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns true if any key has attribute name `name`.
    #[must_use]
    pub fn contains_name(&self, name: &str) -> bool {
        self.entries.keys().any(|key| key.name == name)
    }

    /// The set of currently visible aliases.
    #[must_use]
    pub fn header(&self) -> BTreeSet<Name> {
        self.entries.values().map(|alias| alias.name.clone()).collect()
    }

    /// First key currently visible as `alias`.
    #[must_use]
    pub fn key_for_alias(&self, alias: &str) -> Option<&AttributeAlias> {
        self.entries
            .iter()
            .find(|(_, current)| current.name == alias)
            .map(|(key, _)| key)
    }

    /// Resolves logical attribute names to their current aliases.
    ///
    /// Names never registered fall back to `"{node}__{name}"`.
    #[must_use]
    pub fn aliased(&self, names: &[Name]) -> Vec<Name> {
        names
            .iter()
            .map(|name| match self.find(name) {
                Some(alias) => alias.name.clone(),
                None => self.node.join(ALIAS_SEPARATOR, name),
            })
            .collect()
    }

    /// Resolves `relation`'s attribute names to their current aliases.
    ///
    /// Names never registered fall back to `"{node}__{name}"`.
    #[must_use]
    pub fn aliased_in(&self, relation: &str, names: &[Name]) -> Vec<Name> {
        names
            .iter()
            .map(|name| match self.find_in(relation, name) {
                Some(alias) => alias.name.clone(),
                None => self.node.join(ALIAS_SEPARATOR, name),
            })
            .collect()
    }

    /// The entries whose keys belong to `relation`.
    #[must_use]
    pub fn restricted_to(&self, relation: &str) -> Self {
        Self {
            node: self.node.clone(),
            entries: self
                .entries
                .iter()
                .filter(|(key, _)| key.relation == relation)
                .map(|(key, alias)| (key.clone(), alias.clone()))
                .collect(),
            strategy: self.strategy,
        }
    }

    /// Attribute renames turning a relation with `previous`'s header into
    /// one with this index's header.
    #[must_use]
    pub fn renames_from(&self, previous: &Self) -> Renames {
        previous
            .entries
            .iter()
            .filter_map(|(key, old)| {
                let new = self.entries.get(key)?;
                (new.name != old.name).then(|| (old.name.clone(), new.name.clone()))
            })
            .collect()
    }

    /// Keeps only the entries visible under the listed aliases.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::UnknownAttribute`] if an alias is not visible.
    pub fn project(&self, aliases: &[Name]) -> Result<Self> {
        let header = self.header();
        if let Some(missing) = aliases.iter().find(|a| !header.contains(*a)) {
            return Err(Error::unknown_attribute(missing, &self.node));
        }
        Ok(Self {
            node: self.node.clone(),
            entries: self
                .entries
                .iter()
                .filter(|(_, alias)| aliases.contains(&alias.name))
                .map(|(key, alias)| (key.clone(), alias.clone()))
                .collect(),
            strategy: self.strategy,
        })
    }

    /// Makes entries visible under `old` visible under `new` instead.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::UnknownAttribute`] if an old alias is not visible,
    /// or [`ErrorKind::AliasCollision`] if a new alias is already taken by
    /// another attribute or two old aliases map to the same new one.
    pub fn rename(&self, renames: &Renames) -> Result<Self> {
        let header = self.header();
        let mut targets: BTreeMap<&Name, &Name> = BTreeMap::new();
        for (old, new) in renames.iter().filter(|(old, new)| old != new) {
            if !header.contains(old) {
                return Err(Error::unknown_attribute(old, &self.node));
            }
            if let Some(previous) = targets.insert(new, old) {
                return Err(self.collision(new, previous));
            }
            if header.contains(new) && renames.get(new).is_none_or(|n| n == new) {
                return Err(self.collision(new, new));
            }
        }
        if targets.is_empty() {
            return Ok(self.clone());
        }
        let entries = self
            .entries
            .iter()
            .map(|(key, alias)| match renames.get(&alias.name) {
                Some(new) if *new != alias.name => (
                    key.clone(),
                    AttributeAlias::new(new.clone(), self.node.clone()),
                ),
                _ => (key.clone(), alias.clone()),
            })
            .collect();
        Ok(Self {
            node: self.node.clone(),
            entries,
            strategy: self.strategy,
        })
    }

    /// Index of the relation formed by joining `self` and `other` into `node`.
    ///
    /// The n-th key pair (1-based) collapses onto `"{node}__join_{n}"`.
    /// Remaining entries keep their alias unless it is already taken, in
    /// which case they get a fresh alias under `node`. Left entries are
    /// placed before right entries, so right-side entries are the ones
    /// renamed on a clash.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidJoin`] if a key is visible on both sides,
    /// if no key pairs are listed under [`JoinStrategy::KeyPair`] (or none
    /// can be inferred under [`JoinStrategy::Natural`]), or if a column is
    /// listed in two pairs. Returns [`ErrorKind::UnknownAttribute`] if a
    /// listed key is missing from its side.
    pub fn join(&self, other: &Self, definition: &JoinDefinition, node: &Name) -> Result<Self> {
        if let Some(shared) = other.entries.keys().find(|key| self.entries.contains_key(*key)) {
            return Err(Error::invalid_join(format!(
                "{shared} is visible on both sides of {node}; alias one side"
            )));
        }
        let pairs = self.join_pairs(other, definition, node)?;

        let mut left_memo: BTreeMap<Name, AttributeAlias> = BTreeMap::new();
        let mut right_memo: BTreeMap<Name, AttributeAlias> = BTreeMap::new();
        let mut used: BTreeSet<Name> = BTreeSet::new();

        for (n, (left, right)) in pairs.iter().enumerate() {
            let alias = AttributeAlias::new(
                node.join(ALIAS_SEPARATOR, format!("join_{}", n + 1)),
                node.clone(),
            );
            let left_old = self.require(left)?.name.clone();
            let right_old = other.require(right)?.name.clone();
            if left_memo.insert(left_old, alias.clone()).is_some()
                || right_memo.insert(right_old, alias.clone()).is_some()
            {
                return Err(Error::invalid_join(format!(
                    "{left} = {right} reuses a column already joined in {node}"
                )));
            }
            used.insert(alias.name);
        }

        let mut entries = im::OrdMap::new();
        for (side, memo) in [(self, &mut left_memo), (other, &mut right_memo)] {
            for (key, old) in &side.entries {
                let alias = if let Some(alias) = memo.get(&old.name) {
                    alias.clone()
                } else {
                    let alias = if used.contains(&old.name) {
                        fresh_alias(node, key, &used)
                    } else {
                        old.clone()
                    };
                    used.insert(alias.name.clone());
                    memo.insert(old.name.clone(), alias.clone());
                    alias
                };
                entries.insert(key.clone(), alias);
            }
        }

        Ok(Self {
            node: node.clone(),
            entries,
            strategy: self.strategy,
        })
    }

    fn join_pairs(
        &self,
        other: &Self,
        definition: &JoinDefinition,
        node: &Name,
    ) -> Result<Vec<(AttributeAlias, AttributeAlias)>> {
        if !definition.is_empty() {
            return Ok(definition.0.clone());
        }
        if self.strategy == JoinStrategy::KeyPair {
            return Err(Error::invalid_join(format!(
                "joining {} and {} into {node} requires key pairs",
                self.node, other.node
            )));
        }
        let mut taken: BTreeSet<&AttributeAlias> = BTreeSet::new();
        let mut pairs = Vec::new();
        for left in self.entries.keys() {
            let right = other
                .entries
                .keys()
                .find(|right| right.name == left.name && !taken.contains(right));
            if let Some(right) = right {
                taken.insert(right);
                pairs.push((left.clone(), right.clone()));
            }
        }
        if pairs.is_empty() {
            return Err(Error::invalid_join(format!(
                "{} and {} share no attribute names",
                self.node, other.node
            )));
        }
        Ok(pairs)
    }

    fn require(&self, key: &AttributeAlias) -> Result<&AttributeAlias> {
        self.entries
            .get(key)
            .ok_or_else(|| Error::unknown_attribute(key.to_string(), &self.node))
    }

    fn collision(&self, alias: &Name, visible_as: &Name) -> Error {
        let existing = self
            .key_for_alias(visible_as)
            .cloned()
            .unwrap_or_else(|| AttributeAlias::new(visible_as.clone(), self.node.clone()));
        Error::new(ErrorKind::AliasCollision {
            alias: alias.clone(),
            existing,
        })
    }
}

/// First unused alias out of `"{node}__{attr}"`, `"{node}__{relation}_{attr}"`,
/// then the latter with `_2`, `_3`, ...
fn fresh_alias(node: &Name, key: &AttributeAlias, used: &BTreeSet<Name>) -> AttributeAlias {
    let plain = node.join(ALIAS_SEPARATOR, &key.name);
    let qualified = node.join(ALIAS_SEPARATOR, format!("{}_{}", key.relation, key.name));
    let name = [plain, qualified.clone()]
        .into_iter()
        .chain((2u32..).map(|n| qualified.join("_", n)))
        .find(|candidate| !used.contains(candidate));
    AttributeAlias::new(name.unwrap_or(qualified), node.clone())
}
