//! In-memory storage engine.
//!
//! Datasets hold tuples in a persistent vector behind a lock, so inserts and
//! reads may happen from multiple threads. Relations are expression trees
//! over datasets; they read a snapshot of each dataset only when iterated.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, PoisonError, RwLock};

use joinery_foundation::{Error, ErrorKind, Name, Result, Tuple, Value};

use crate::criteria::Criteria;
use crate::engine::Engine;
use crate::relation::{Relation, Renames, Tuples};
use crate::schema::Header;

// =============================================================================
// Dataset
// =============================================================================

/// Shared, thread-safe tuple storage backing a base relation.
///
/// Clones share the same storage. Equality is identity of that storage.
#[derive(Clone)]
pub struct Dataset {
    name: Name,
    rows: Arc<RwLock<im::Vector<Tuple>>>,
}

impl Dataset {
    /// Creates an empty dataset.
    #[must_use]
    pub fn new(name: impl Into<Name>) -> Self {
        Self {
            name: name.into(),
            rows: Arc::new(RwLock::new(im::Vector::new())),
        }
    }

    /// Returns the dataset name.
    #[must_use]
    pub fn name(&self) -> &Name {
        &self.name
    }

    /// Appends a tuple.
    pub fn insert(&self, tuple: Tuple) {
        self.rows
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(tuple);
    }

    /// Appends many tuples under a single lock.
    pub fn extend(&self, tuples: impl IntoIterator<Item = Tuple>) {
        let mut rows = self.rows.write().unwrap_or_else(PoisonError::into_inner);
        for tuple in tuples {
            rows.push_back(tuple);
        }
    }

    /// Returns the number of stored tuples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns true if the dataset is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// O(1) snapshot of the current rows.
    #[must_use]
    pub fn snapshot(&self) -> im::Vector<Tuple> {
        self.rows
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl PartialEq for Dataset {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.rows, &other.rows)
    }
}

impl Eq for Dataset {}

impl Hash for Dataset {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Debug for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dataset({}, {} rows)", self.name, self.len())
    }
}

// =============================================================================
// Relation
// =============================================================================

#[derive(Debug, PartialEq, Eq, Hash)]
enum Expr {
    Base(Option<Dataset>),
    Rename(MemoryRelation, Renames),
    Join(MemoryRelation, MemoryRelation, Vec<Name>),
    Restrict(MemoryRelation, Criteria),
    Project(MemoryRelation),
    Order(MemoryRelation, Vec<Name>),
}

/// A relation evaluated by the in-memory engine.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MemoryRelation {
    name: Name,
    header: Header,
    expr: Arc<Expr>,
}

impl MemoryRelation {
    fn derived(name: Name, header: Header, expr: Expr) -> Self {
        debug_assert!(!matches!(expr, Expr::Base(_)));
        Self {
            name,
            header,
            expr: Arc::new(expr),
        }
    }

    /// Returns true if this relation reads a dataset directly.
    #[must_use]
    pub fn is_base(&self) -> bool {
        matches!(*self.expr, Expr::Base(_))
    }

    /// Returns true if this relation is bound to a data source.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        match &*self.expr {
            Expr::Base(source) => source.is_some(),
            Expr::Rename(input, _)
            | Expr::Restrict(input, _)
            | Expr::Project(input)
            | Expr::Order(input, _) => input.is_bound(),
            Expr::Join(left, right, _) => left.is_bound() && right.is_bound(),
        }
    }
}

fn join_matches(left: &Tuple, right: &Tuple, on: &[Name]) -> bool {
    on.iter().all(|name| match (left.get(name), right.get(name)) {
        (Some(l), Some(r)) => !l.is_nil() && l == r,
        _ => false,
    })
}

impl Relation for MemoryRelation {
    fn name(&self) -> &Name {
        &self.name
    }

    fn header(&self) -> &Header {
        &self.header
    }

    fn rename(&self, renames: &Renames) -> Result<Self> {
        let effective: Renames = renames
            .iter()
            .filter(|(old, new)| old != new)
            .map(|(old, new)| (old.clone(), new.clone()))
            .collect();
        if effective.is_empty() {
            return Ok(self.clone());
        }
        for old in effective.keys() {
            if !self.header.contains(old) {
                return Err(Error::unknown_attribute(old, &self.name));
            }
        }
        let header = Header::new(
            &self.name,
            self.header
                .iter()
                .map(|n| effective.get(n).unwrap_or(n).clone()),
        )?;
        Ok(Self::derived(
            self.name.clone(),
            header,
            Expr::Rename(self.clone(), effective),
        ))
    }

    fn join(&self, other: &Self) -> Result<Self> {
        let on = self.header.common(&other.header);
        let header = Header::new(
            &self.name,
            self.header
                .iter()
                .chain(other.header.iter().filter(|n| !on.contains(n)))
                .cloned(),
        )?;
        let name = self.name.join("_X_", &other.name);
        Ok(Self::derived(name, header, Expr::Join(self.clone(), other.clone(), on)))
    }

    fn restrict(&self, criteria: &Criteria) -> Result<Self> {
        self.header.require(&self.name, &criteria.attributes())?;
        Ok(Self::derived(
            self.name.clone(),
            self.header.clone(),
            Expr::Restrict(self.clone(), criteria.clone()),
        ))
    }

    fn project(&self, names: &[Name]) -> Result<Self> {
        self.header.require(&self.name, names)?;
        let header = Header::new(&self.name, names.iter().cloned())?;
        Ok(Self::derived(self.name.clone(), header, Expr::Project(self.clone())))
    }

    fn order(&self, names: &[Name]) -> Result<Self> {
        self.header.require(&self.name, names)?;
        Ok(Self::derived(
            self.name.clone(),
            self.header.clone(),
            Expr::Order(self.clone(), names.to_vec()),
        ))
    }

    fn tuples(&self) -> Tuples<'_> {
        match &*self.expr {
            Expr::Base(None) => Box::new(std::iter::empty()),
            Expr::Base(Some(dataset)) => {
                Box::new(std::iter::once(()).flat_map(move |()| dataset.snapshot()))
            }
            Expr::Rename(input, renames) => Box::new(input.tuples().map(move |t| {
                t.rename_with(|n| renames.get(n).unwrap_or(n).clone())
            })),
            Expr::Join(left, right, on) => {
                let mut rows: Option<Vec<Tuple>> = None;
                Box::new(left.tuples().flat_map(move |l| {
                    let rows = rows.get_or_insert_with(|| right.tuples().collect());
                    rows.iter()
                        .filter(|r| join_matches(&l, r, on))
                        .map(|r| l.merge(r))
                        .collect::<Vec<_>>()
                }))
            }
            Expr::Restrict(input, criteria) => {
                Box::new(input.tuples().filter(move |t| criteria.matches(t)))
            }
            Expr::Project(input) => {
                let names = self.header.names();
                Box::new(input.tuples().map(move |t| t.select(names)))
            }
            Expr::Order(input, names) => Box::new(std::iter::once(()).flat_map(move |()| {
                let mut rows: Vec<Tuple> = input.tuples().collect();
                rows.sort_by(|a, b| {
                    names
                        .iter()
                        .map(|n| {
                            let l = a.get(n).unwrap_or(&Value::Nil);
                            let r = b.get(n).unwrap_or(&Value::Nil);
                            l.sort_cmp(r)
                        })
                        .find(|o| o.is_ne())
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
                rows
            })),
        }
    }
}

// =============================================================================
// Engine
// =============================================================================

/// In-memory engine: a named set of datasets.
#[derive(Clone, Debug, Default)]
pub struct MemoryEngine {
    datasets: HashMap<Name, Dataset>,
}

impl MemoryEngine {
    /// Creates an engine with no datasets.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or returns the existing) dataset for `name`.
    pub fn dataset(&mut self, name: impl Into<Name>) -> Dataset {
        let name = name.into();
        self.datasets
            .entry(name.clone())
            .or_insert_with(|| Dataset::new(name))
            .clone()
    }

    /// Looks up a dataset without creating it.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Dataset> {
        self.datasets.get(name)
    }
}

impl Engine for MemoryEngine {
    type Relation = MemoryRelation;

    fn name(&self) -> &str {
        "memory"
    }

    fn base_relation(&self, name: &Name, header: &Header) -> MemoryRelation {
        MemoryRelation {
            name: name.clone(),
            header: header.clone(),
            expr: Arc::new(Expr::Base(None)),
        }
    }

    fn gateway_relation(&self, relation: MemoryRelation) -> Result<MemoryRelation> {
        if !relation.is_base() {
            return Err(Error::new(ErrorKind::Internal(format!(
                "gateway relation must wrap a base relation, got {}",
                relation.name
            ))));
        }
        let dataset = self
            .datasets
            .get(&relation.name)
            .ok_or_else(|| Error::new(ErrorKind::UnknownRelation(relation.name.clone())))?;
        Ok(MemoryRelation {
            expr: Arc::new(Expr::Base(Some(dataset.clone()))),
            ..relation
        })
    }
}
