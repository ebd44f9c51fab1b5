//! Resolution of `through ... via` join keys.
//!
//! A through relationship reaches its target by way of the relationship on
//! the intermediary model that leads to the target. That relationship is
//! either named explicitly (`via`) or inferred from the target model name.

use joinery_foundation::{Error, ErrorKind, Name, Result, underscore};

use crate::mapper::MapperRegistry;
use crate::relationship::Relationship;

/// The intermediary relationship a through relationship joins along.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViaDefinition {
    /// Name of the via relationship.
    pub name: Name,
    /// The via relationship, as declared on the intermediary model.
    pub relationship: Relationship,
    /// Join attributes on the intermediary.
    pub source_key: Vec<Name>,
    /// Join attributes on the final target.
    pub target_key: Vec<Name>,
    /// True if the via name was not given explicitly.
    pub inferred: bool,
}

impl ViaDefinition {
    /// Resolves the via relationship for `relationship`, which goes through
    /// `through` (declared on the same source model).
    ///
    /// Without an explicit `via`, the name is inferred as the underscored
    /// target model (`Tag` gives `tag`). If no relationship of that name
    /// exists, the single direct relationship on the intermediary targeting
    /// the same model is used. `Ok(None)` means nothing could be inferred and
    /// the relationship's own keys apply.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::MissingRelationship`] if an explicit `via` does not
    /// exist, [`ErrorKind::AmbiguousVia`] if it is itself a through relationship,
    /// targets another model, or several candidates match, and
    /// [`ErrorKind::MissingMapper`] if the intermediary has no mapper.
    pub fn resolve(
        relationship: &Relationship,
        through: &Relationship,
        mappers: &MapperRegistry,
    ) -> Result<Option<Self>> {
        let intermediary = mappers.get(&through.target_model)?;
        let (name, inferred) = match &relationship.via {
            Some(via) => (via.clone(), false),
            None => (underscore(&relationship.target_model), true),
        };

        if let Some(via) = intermediary.relationship(&name) {
            return Self::accept(relationship, via, inferred).map(Some);
        }
        if !inferred {
            return Err(Error::missing_relationship(intermediary.model.clone(), name));
        }

        let candidates: Vec<&Relationship> = intermediary
            .relationships
            .iter()
            .filter(|r| r.target_model == relationship.target_model && !r.is_through())
            .collect();
        match candidates.as_slice() {
            [] => Ok(None),
            [via] => Self::accept(relationship, via, true).map(Some),
            _ => Err(ambiguous(
                relationship,
                format!(
                    "{} relationships on {} target {}; name one with via",
                    candidates.len(),
                    intermediary.model,
                    relationship.target_model
                ),
            )),
        }
    }

    fn accept(relationship: &Relationship, via: &Relationship, inferred: bool) -> Result<Self> {
        if via.is_through() {
            return Err(ambiguous(
                relationship,
                format!("via {} is itself a through relationship", via.name),
            ));
        }
        if via.target_model != relationship.target_model {
            return Err(ambiguous(
                relationship,
                format!(
                    "via {} targets {}, expected {}",
                    via.name, via.target_model, relationship.target_model
                ),
            ));
        }
        Ok(Self {
            name: via.name.clone(),
            relationship: via.clone(),
            source_key: via.source_key.clone(),
            target_key: via.target_key.clone(),
            inferred,
        })
    }
}

fn ambiguous(relationship: &Relationship, reason: String) -> Error {
    Error::new(ErrorKind::AmbiguousVia {
        relationship: relationship.name.clone(),
        reason,
    })
}
