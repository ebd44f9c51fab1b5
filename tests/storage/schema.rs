//! Integration tests for headers, schemas, and criteria

use joinery_foundation::{ErrorKind, Name, Tuple, Value};
use joinery_storage::{Criteria, Header, RelationSchema};

// =============================================================================
// Headers
// =============================================================================

#[test]
fn header_keeps_declaration_order() {
    let header = Header::new(&Name::new("tasks"), ["id", "user_id", "title"]).unwrap();
    let names: Vec<&str> = header.iter().map(Name::as_str).collect();
    assert_eq!(names, vec!["id", "user_id", "title"]);
    assert_eq!(header.len(), 3);
}

#[test]
fn header_rejects_duplicates() {
    let err = Header::new(&Name::new("tasks"), ["id", "id"]).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::DuplicateAttribute { .. }));
}

#[test]
fn header_require_reports_first_missing() {
    let name = Name::new("users");
    let header = Header::new(&name, ["id", "name"]).unwrap();
    assert!(header.require(&name, &[Name::new("id")]).is_ok());
    let err = header
        .require(&name, &[Name::new("email"), Name::new("age")])
        .unwrap_err();
    assert!(err.to_string().contains("email"));
}

// =============================================================================
// Relation Schemas
// =============================================================================

#[test]
fn schema_key_defaults_to_id() {
    let schema = RelationSchema::new("users", ["id", "name"]).unwrap();
    assert_eq!(schema.key, vec![Name::new("id")]);

    let join_table = RelationSchema::new("song_tags", ["song_id", "tag_id"]).unwrap();
    assert!(join_table.key.is_empty());
}

#[test]
fn schema_composite_key() {
    let schema = RelationSchema::new("song_tags", ["song_id", "tag_id"])
        .unwrap()
        .with_key(["song_id", "tag_id"])
        .unwrap();
    assert_eq!(schema.key.len(), 2);
}

#[test]
fn schema_key_must_be_in_header() {
    let result = RelationSchema::new("users", ["id"]).unwrap().with_key(["uuid"]);
    assert!(matches!(
        result.unwrap_err().kind,
        ErrorKind::UnknownAttribute { .. }
    ));
}

// =============================================================================
// Criteria
// =============================================================================

#[test]
fn criteria_conjunction() {
    let criteria = Criteria::new().equal("done", true).equal("user_id", 1);
    let hit = Tuple::from([("done", Value::from(true)), ("user_id", Value::from(1))]);
    let miss = Tuple::from([("done", Value::from(false)), ("user_id", Value::from(1))]);
    assert!(criteria.matches(&hit));
    assert!(!criteria.matches(&miss));
    assert_eq!(criteria.attributes().len(), 2);
}

#[test]
fn criteria_rename() {
    let criteria = Criteria::new()
        .equal("done", true)
        .rename_with(|n| Name::new(format!("tasks__{n}")));
    assert_eq!(criteria.attributes(), vec![Name::new("tasks__done")]);
}
