//! Integration tests for names, values, tuples, and attribute aliases
//!
//! Tests construction, equality, ordering, and the tuple operations relations
//! are built from.

use std::collections::HashSet;

use joinery_foundation::{ALIAS_SEPARATOR, AttributeAlias, Name, Tuple, Value, underscore};

// =============================================================================
// Names
// =============================================================================

#[test]
fn name_compares_with_str() {
    let name = Name::new("users");
    assert_eq!(name, "users");
    assert_eq!(name.as_str(), "users");
    assert_eq!(Name::from("users"), name);
}

#[test]
fn name_join() {
    let name = Name::new("users").join("_X_", "tasks");
    assert_eq!(name, "users_X_tasks");
}

#[test]
fn underscore_model_names() {
    assert_eq!(underscore("Tag"), "tag");
    assert_eq!(underscore("SongTag"), "song_tag");
    assert_eq!(underscore("HTTPRequest"), "http_request");
    assert_eq!(underscore("Admin::User"), "admin_user");
    assert_eq!(underscore("song_tag"), "song_tag");
}

// =============================================================================
// Values
// =============================================================================

#[test]
fn value_accessors() {
    assert!(Value::Nil.is_nil());
    assert_eq!(Value::from(7).as_int(), Some(7));
    assert_eq!(Value::from("rock").as_str(), Some("rock"));
    assert_eq!(Value::from(true).as_bool(), Some(true));
    assert_eq!(Value::from(1.5).as_int(), None);
}

#[test]
fn value_equality_is_by_type() {
    assert_ne!(Value::Int(1), Value::Float(1.0));
    assert_eq!(Value::Float(f64::NAN), Value::Float(f64::NAN));
}

#[test]
fn value_hash_dedupes() {
    let set: HashSet<Value> = [Value::from(1), Value::from(1), Value::from("1")]
        .into_iter()
        .collect();
    assert_eq!(set.len(), 2);
}

#[test]
fn value_sort_order() {
    use std::cmp::Ordering;
    assert_eq!(Value::Nil.sort_cmp(&Value::Int(0)), Ordering::Less);
    assert_eq!(Value::Int(2).sort_cmp(&Value::Float(1.5)), Ordering::Greater);
    assert_eq!(Value::from("a").sort_cmp(&Value::from("b")), Ordering::Less);
}

#[test]
fn value_display() {
    assert_eq!(Value::from("Jane").to_string(), "Jane");
    assert_eq!(Value::Int(3).to_string(), "3");
    assert_eq!(Value::Nil.to_string(), "nil");
}

// =============================================================================
// Tuples
// =============================================================================

#[test]
fn tuple_is_persistent() {
    let t1 = Tuple::from([("id", 1)]);
    let t2 = t1.with("name", "Jane");
    assert_eq!(t1.len(), 1);
    assert_eq!(t2.len(), 2);
    assert_eq!(t2.get("name"), Some(&Value::from("Jane")));
}

#[test]
fn tuple_merge_prefers_right() {
    let left = Tuple::from([("k", Value::from(1)), ("a", Value::from("left"))]);
    let right = Tuple::from([("k", Value::from(1)), ("a", Value::from("right"))]);
    let merged = left.merge(&right);
    assert_eq!(merged.len(), 2);
    assert_eq!(merged.get("a"), Some(&Value::from("right")));
}

#[test]
fn tuple_rename_and_select() {
    let t = Tuple::from([("id", 1), ("user_id", 2)]);
    let renamed = t.rename_with(|n| Name::new(format!("tasks__{n}")));
    assert!(renamed.contains("tasks__user_id"));
    assert!(!renamed.contains("id"));

    let selected = t.select(&[Name::new("id"), Name::new("missing")]);
    assert_eq!(selected.get("id"), Some(&Value::Int(1)));
    assert_eq!(selected.get("missing"), Some(&Value::Nil));
}

// =============================================================================
// Attribute Aliases
// =============================================================================

#[test]
fn alias_prefixed() {
    let alias = AttributeAlias::new("user_id", "tasks");
    assert_eq!(alias.prefixed(), format!("tasks{ALIAS_SEPARATOR}user_id").as_str());
    assert_eq!(alias.to_string(), "tasks.user_id");
}

#[test]
fn alias_identity_includes_relation() {
    let a = AttributeAlias::new("id", "users");
    let b = AttributeAlias::new("id", "tasks");
    assert_ne!(a, b);
    assert_eq!(a, AttributeAlias::new("id", "users"));
}

#[test]
fn alias_orders_by_name_then_relation() {
    let mut aliases = vec![
        AttributeAlias::new("name", "users"),
        AttributeAlias::new("id", "users"),
        AttributeAlias::new("id", "tasks"),
    ];
    aliases.sort();
    assert_eq!(aliases[0], AttributeAlias::new("id", "tasks"));
    assert_eq!(aliases[2], AttributeAlias::new("name", "users"));
}
