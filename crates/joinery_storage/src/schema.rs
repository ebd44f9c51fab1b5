//! Headers and relation schemas.
//!
//! A [`Header`] lists the attribute names a relation exposes. A
//! [`RelationSchema`] is what a mapper declares for its base relation.

use std::fmt;

use joinery_foundation::{Error, ErrorKind, Name, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Ordered, duplicate-free list of attribute names.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Header(Vec<Name>);

impl Header {
    /// Creates a header, rejecting duplicate attribute names.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::DuplicateAttribute`] if a name appears twice.
    pub fn new<I, N>(relation: &Name, names: I) -> Result<Self>
    where
        I: IntoIterator<Item = N>,
        N: Into<Name>,
    {
        let mut out: Vec<Name> = Vec::new();
        for name in names {
            let name = name.into();
            if out.contains(&name) {
                return Err(Error::new(ErrorKind::DuplicateAttribute {
                    attribute: name,
                    relation: relation.clone(),
                }));
            }
            out.push(name);
        }
        Ok(Self(out))
    }

    /// Returns true if the header contains `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|n| n == name)
    }

    /// Returns the number of attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the header has no attributes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates attribute names in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Name> {
        self.0.iter()
    }

    /// Returns the attribute names as a slice.
    #[must_use]
    pub fn names(&self) -> &[Name] {
        &self.0
    }

    /// Attribute names present in both headers, in `self`'s order.
    #[must_use]
    pub fn common(&self, other: &Self) -> Vec<Name> {
        self.0
            .iter()
            .filter(|n| other.contains(n))
            .cloned()
            .collect()
    }

    /// Checks that every name is part of this header.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::UnknownAttribute`] for the first missing name.
    pub fn require(&self, relation: &Name, names: &[Name]) -> Result<()> {
        match names.iter().find(|n| !self.contains(n)) {
            Some(missing) => Err(Error::unknown_attribute(missing, relation)),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

impl<'a> IntoIterator for &'a Header {
    type Item = &'a Name;
    type IntoIter = std::slice::Iter<'a, Name>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Schema definition for a mapper's base relation.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RelationSchema {
    /// Relation name (e.g., `users`, `song_tags`).
    pub name: Name,
    /// Attribute names.
    pub header: Header,
    /// Key attributes identifying a tuple.
    pub key: Vec<Name>,
}

impl RelationSchema {
    /// Creates a schema with the given attributes and an `id` key when present.
    ///
    /// # Errors
    ///
    /// Returns an error if `attributes` contains duplicates.
    pub fn new<I, N>(name: impl Into<Name>, attributes: I) -> Result<Self>
    where
        I: IntoIterator<Item = N>,
        N: Into<Name>,
    {
        let name = name.into();
        let header = Header::new(&name, attributes)?;
        let key = if header.contains("id") {
            vec![Name::new("id")]
        } else {
            Vec::new()
        };
        Ok(Self { name, header, key })
    }

    /// Sets the key attributes.
    ///
    /// # Errors
    ///
    /// Returns an error if a key attribute is not part of the header.
    pub fn with_key<I, N>(mut self, key: I) -> Result<Self>
    where
        I: IntoIterator<Item = N>,
        N: Into<Name>,
    {
        let key: Vec<Name> = key.into_iter().map(Into::into).collect();
        self.header.require(&self.name, &key)?;
        self.key = key;
        Ok(self)
    }
}
