//! Core names, values, attribute aliases, and errors for Joinery.
//!
//! This crate provides:
//! - [`Name`] - Shared identifiers for models, relations, attributes, aliases
//! - [`Value`] and [`Tuple`] - Attribute values and persistent rows
//! - [`AttributeAlias`] - An attribute qualified by its owning relation
//! - [`Error`] - Rich error types with context

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod alias;
pub mod error;
pub mod name;
pub mod value;

pub use alias::{ALIAS_SEPARATOR, AttributeAlias};
pub use error::{Error, ErrorContext, ErrorKind, Result};
pub use name::{Name, underscore};
pub use value::{Tuple, Value};
