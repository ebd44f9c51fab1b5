//! The relation algebra every storage engine implements.
//!
//! The set of operations is closed: a relation graph can only ask an engine
//! relation for what is listed on [`Relation`].

use std::collections::BTreeMap;
use std::fmt;
use std::hash::Hash;

use joinery_foundation::{Name, Result, Tuple};

use crate::criteria::Criteria;
use crate::schema::Header;

/// Lazy, pull-based sequence of tuples.
///
/// Nothing is read from the underlying data source until the iterator is
/// advanced.
pub type Tuples<'a> = Box<dyn Iterator<Item = Tuple> + 'a>;

/// Attribute renames, keyed by the current attribute name.
pub type Renames = BTreeMap<Name, Name>;

/// An engine relation: a lazily evaluated collection of tuples plus a header.
///
/// Relations are immutable value handles. Every operation returns a new
/// relation describing the derived collection; equality and hashing are
/// structural, so two handles describing the same expression over the same
/// data source are equal.
pub trait Relation: Clone + fmt::Debug + Eq + Hash {
    /// Name of the relation (the base relation name for derived relations).
    fn name(&self) -> &Name;

    /// Attribute names visible on this relation.
    fn header(&self) -> &Header;

    /// Renames attributes. Names absent from `renames` are kept.
    ///
    /// # Errors
    ///
    /// Returns an error if a renamed attribute is not in the header or if the
    /// result would contain duplicate names.
    fn rename(&self, renames: &Renames) -> Result<Self>;

    /// Natural join on the attribute names both headers share.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot join the two relations.
    fn join(&self, other: &Self) -> Result<Self>;

    /// Keeps tuples matching `criteria`.
    ///
    /// # Errors
    ///
    /// Returns an error if the criteria reference unknown attributes.
    fn restrict(&self, criteria: &Criteria) -> Result<Self>;

    /// Keeps only the listed attributes, in the listed order.
    ///
    /// # Errors
    ///
    /// Returns an error if a name is not in the header.
    fn project(&self, names: &[Name]) -> Result<Self>;

    /// Sorts tuples by the listed attributes, ascending.
    ///
    /// # Errors
    ///
    /// Returns an error if a name is not in the header.
    fn order(&self, names: &[Name]) -> Result<Self>;

    /// Iterates the tuples of this relation.
    fn tuples(&self) -> Tuples<'_>;
}
