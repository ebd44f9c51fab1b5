//! Integration tests for Error types
//!
//! Tests error construction, display, context, and error kinds.

use joinery_foundation::{AttributeAlias, Error, ErrorContext, ErrorKind, Name};

// =============================================================================
// Error Construction
// =============================================================================

#[test]
fn error_node_name_taken() {
    let err = Error::node_name_taken(Name::new("users"));
    assert!(matches!(err.kind, ErrorKind::NodeNameTaken(_)));
    assert!(err.to_string().contains("users"));
}

#[test]
fn error_missing_mapper() {
    let err = Error::missing_mapper(Name::new("Tag"));
    assert!(matches!(err.kind, ErrorKind::MissingMapper(_)));
    assert_eq!(err.to_string(), "no mapper registered for model Tag");
}

#[test]
fn error_missing_relationship() {
    let err = Error::missing_relationship(Name::new("SongTag"), Name::new("genre"));
    let msg = err.to_string();
    assert!(msg.contains("SongTag"));
    assert!(msg.contains("genre"));
}

#[test]
fn error_unknown_attribute() {
    let err = Error::unknown_attribute("email", "users");
    assert!(matches!(
        err.kind,
        ErrorKind::UnknownAttribute { ref attribute, ref relation }
            if attribute == "email" && relation == "users"
    ));
}

#[test]
fn error_frozen() {
    let err = Error::frozen("add edge");
    assert_eq!(err.to_string(), "registry is frozen: cannot add edge");
}

#[test]
fn error_not_an_edge_side() {
    let err = Error::not_an_edge_side(Name::new("users_X_tasks"), Name::new("tags"));
    let msg = err.to_string();
    assert!(msg.contains("tags"));
    assert!(msg.contains("users_X_tasks"));
}

#[test]
fn error_alias_collision_names_existing_attribute() {
    let err = Error::new(ErrorKind::AliasCollision {
        alias: Name::new("n__name"),
        existing: AttributeAlias::new("name", "tasks"),
    });
    assert!(err.to_string().contains("tasks.name"));
}

// =============================================================================
// Error Context
// =============================================================================

#[test]
fn error_without_context_displays_kind_only() {
    let err = Error::missing_node(Name::new("tags"));
    assert_eq!(err.to_string(), "missing node: tags");
}

#[test]
fn error_with_explicit_context() {
    let err = Error::missing_node(Name::new("tags")).with_context(
        ErrorContext::new()
            .with_relationship(Name::new("tags"))
            .with_model(Name::new("Song")),
    );
    assert_eq!(
        err.to_string(),
        "missing node: tags (in relationship tags of model Song)"
    );
}

#[test]
fn error_context_records_through_chain() {
    let err = Error::missing_node(Name::new("tags"))
        .in_relationship(&Name::new("song_tags"))
        .in_relationship(&Name::new("tags"))
        .in_model(&Name::new("Song"));
    let msg = err.to_string();
    assert!(msg.contains("in relationship song_tags"));
    assert!(msg.contains("of model Song"));
    assert!(msg.ends_with("via relationship tags)"));
}

#[test]
fn error_model_context_keeps_first_model() {
    let err = Error::missing_node(Name::new("tags"))
        .in_model(&Name::new("Song"))
        .in_model(&Name::new("Album"));
    assert_eq!(err.context.unwrap().model, Some(Name::new("Song")));
}

#[test]
fn error_is_std_error() {
    fn assert_error<E: std::error::Error + Send + Sync + 'static>(_: &E) {}
    assert_error(&Error::invalid_join("no keys"));
}
