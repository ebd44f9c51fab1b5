//! Error types for Joinery.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.
//! Every error raised while building the relation graph is fatal for the
//! finalize pass that raised it.

use std::fmt;

use thiserror::Error;

use crate::alias::AttributeAlias;
use crate::name::Name;

/// Result type alias using the Joinery [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for Joinery operations.
#[derive(Debug, Error)]
#[error("{kind}{}", .context.as_ref().map(|c| format!(" ({c})")).unwrap_or_default())]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error, replacing any existing context.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Records the relationship being built when this error surfaced.
    ///
    /// Keeps the innermost relationship and pushes outer ones as frames, so
    /// a failure inside a recursive `through` build names the whole chain.
    #[must_use]
    pub fn in_relationship(mut self, relationship: &Name) -> Self {
        let context = match self.context.take() {
            Some(ctx) if ctx.relationship.is_some() => {
                ctx.with_frame(format!("relationship {relationship}"))
            }
            Some(ctx) => ctx.with_relationship(relationship.clone()),
            None => ErrorContext::new().with_relationship(relationship.clone()),
        };
        self.context = Some(context);
        self
    }

    /// Records the model whose mapper was being finalized, if not yet set.
    #[must_use]
    pub fn in_model(mut self, model: &Name) -> Self {
        let context = self.context.take().unwrap_or_default();
        self.context = Some(match context.model {
            Some(_) => context,
            None => context.with_model(model.clone()),
        });
        self
    }

    /// A node name is already registered for a different relation.
    #[must_use]
    pub fn node_name_taken(name: Name) -> Self {
        Self::new(ErrorKind::NodeNameTaken(name))
    }

    /// A relationship references a node that was never registered.
    #[must_use]
    pub fn missing_node(name: Name) -> Self {
        Self::new(ErrorKind::MissingNode(name))
    }

    /// No mapper is registered for a model.
    #[must_use]
    pub fn missing_mapper(model: Name) -> Self {
        Self::new(ErrorKind::MissingMapper(model))
    }

    /// A `through`/`via` chain names a relationship that does not exist.
    #[must_use]
    pub fn missing_relationship(model: Name, relationship: Name) -> Self {
        Self::new(ErrorKind::MissingRelationship {
            model,
            relationship,
        })
    }

    /// An attribute is not part of a relation's header or alias index.
    #[must_use]
    pub fn unknown_attribute(attribute: impl Into<Name>, relation: impl Into<Name>) -> Self {
        Self::new(ErrorKind::UnknownAttribute {
            attribute: attribute.into(),
            relation: relation.into(),
        })
    }

    /// The relation or edge registry is frozen.
    #[must_use]
    pub fn frozen(operation: &'static str) -> Self {
        Self::new(ErrorKind::RegistryFrozen(operation))
    }

    /// Programmer error: the relation is not one of an edge's sides.
    #[must_use]
    pub fn not_an_edge_side(edge: Name, relation: Name) -> Self {
        Self::new(ErrorKind::NotAnEdgeSide { edge, relation })
    }

    /// A join definition is malformed.
    #[must_use]
    pub fn invalid_join(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidJoin(message.into()))
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// A node name is already taken by a structurally different node.
    #[error("node name already registered: {0}")]
    NodeNameTaken(Name),

    /// A node referenced by a relationship is not registered.
    #[error("missing node: {0}")]
    MissingNode(Name),

    /// No mapper is registered for the model.
    #[error("no mapper registered for model {0}")]
    MissingMapper(Name),

    /// A mapper with the same model name is already registered.
    #[error("mapper already registered for model {0}")]
    DuplicateMapper(Name),

    /// A relationship named in a `through` or `via` chain does not exist.
    #[error("relationship {relationship} not found on model {model}")]
    MissingRelationship {
        /// The model that was searched.
        model: Name,
        /// The relationship name that was not found.
        relationship: Name,
    },

    /// The relationship a `via` resolves to cannot be determined.
    #[error("cannot resolve via for relationship {relationship}: {reason}")]
    AmbiguousVia {
        /// The relationship being resolved.
        relationship: Name,
        /// Why resolution failed.
        reason: String,
    },

    /// A connector for the relationship name already exists.
    #[error("connector already registered for relationship {0}")]
    DuplicateConnector(Name),

    /// A `through` chain refers back to itself.
    #[error("cyclic through chain at relationship {0}")]
    CyclicRelationship(Name),

    /// A mutation was attempted after the registry was frozen.
    #[error("registry is frozen: cannot {0}")]
    RegistryFrozen(&'static str),

    /// The relation passed to an edge is not one of its two sides.
    #[error("relation {relation} is not a side of edge {edge}")]
    NotAnEdgeSide {
        /// The edge that was queried.
        edge: Name,
        /// The relation that was passed.
        relation: Name,
    },

    /// A join definition is malformed.
    #[error("invalid join: {0}")]
    InvalidJoin(String),

    /// An attribute is not known to a relation or alias index.
    #[error("unknown attribute {attribute} on {relation}")]
    UnknownAttribute {
        /// The attribute that was requested.
        attribute: Name,
        /// The relation or node that was queried.
        relation: Name,
    },

    /// Two distinct attributes would become visible under the same alias.
    #[error("alias collision: {alias} is already used by {existing}")]
    AliasCollision {
        /// The colliding alias.
        alias: Name,
        /// The attribute already visible under that alias.
        existing: AttributeAlias,
    },

    /// No data source is registered for a relation.
    #[error("no data source registered for relation {0}")]
    UnknownRelation(Name),

    /// A header lists the same attribute twice.
    #[error("duplicate attribute {attribute} in {relation}")]
    DuplicateAttribute {
        /// The duplicated attribute.
        attribute: Name,
        /// The relation whose header is invalid.
        relation: Name,
    },

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The relationship being finalized.
    pub relationship: Option<Name>,
    /// The model that declared it.
    pub model: Option<Name>,
    /// Outer build steps, innermost first.
    pub stack: Vec<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the relationship.
    #[must_use]
    pub fn with_relationship(mut self, relationship: Name) -> Self {
        self.relationship = Some(relationship);
        self
    }

    /// Sets the declaring model.
    #[must_use]
    pub fn with_model(mut self, model: Name) -> Self {
        self.model = Some(model);
        self
    }

    /// Adds a stack frame.
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.stack.push(frame.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sep = "";
        if let Some(relationship) = &self.relationship {
            write!(f, "in relationship {relationship}")?;
            sep = " ";
        }
        if let Some(model) = &self.model {
            write!(f, "{sep}of model {model}")?;
            sep = " ";
        }
        for frame in &self.stack {
            write!(f, "{sep}via {frame}")?;
            sep = " ";
        }
        Ok(())
    }
}
