//! Integration tests for the in-memory engine
//!
//! Tests gateway binding, lazy evaluation, and the relation algebra.

use std::sync::Arc;
use std::thread;

use joinery_foundation::{ErrorKind, Name, Tuple, Value};
use joinery_storage::{
    Criteria, Engine, Header, MemoryEngine, MemoryRelation, Relation, Renames,
};

fn setup() -> (MemoryEngine, MemoryRelation, MemoryRelation) {
    let mut engine = MemoryEngine::new();
    engine.dataset("users").extend([
        Tuple::from([("id", Value::from(1)), ("name", Value::from("Jane"))]),
        Tuple::from([("id", Value::from(2)), ("name", Value::from("John"))]),
    ]);
    engine.dataset("tasks").extend([
        Tuple::from([("id", Value::from(10)), ("user_id", Value::from(2))]),
        Tuple::from([("id", Value::from(11)), ("user_id", Value::from(1))]),
        Tuple::from([("id", Value::from(12)), ("user_id", Value::Nil)]),
    ]);
    let users = gateway(&engine, "users", &["id", "name"]);
    let tasks = gateway(&engine, "tasks", &["id", "user_id"]);
    (engine, users, tasks)
}

fn gateway(engine: &MemoryEngine, name: &str, attrs: &[&str]) -> MemoryRelation {
    let name = Name::new(name);
    let header = Header::new(&name, attrs.iter().copied()).unwrap();
    engine
        .gateway_relation(engine.base_relation(&name, &header))
        .unwrap()
}

fn renames(pairs: &[(&str, &str)]) -> Renames {
    pairs
        .iter()
        .map(|(a, b)| (Name::new(a), Name::new(b)))
        .collect()
}

// =============================================================================
// Gateway
// =============================================================================

#[test]
fn engine_name() {
    assert_eq!(MemoryEngine::new().name(), "memory");
}

#[test]
fn unbound_base_relation_is_empty() {
    let engine = MemoryEngine::new();
    let name = Name::new("users");
    let relation = engine.base_relation(&name, &Header::new(&name, ["id"]).unwrap());
    assert!(!relation.is_bound());
    assert_eq!(relation.tuples().count(), 0);
}

#[test]
fn gateway_without_dataset_fails() {
    let engine = MemoryEngine::new();
    let name = Name::new("users");
    let base = engine.base_relation(&name, &Header::new(&name, ["id"]).unwrap());
    let err = engine.gateway_relation(base).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownRelation(_)));
}

#[test]
fn gateway_rejects_derived_relations() {
    let (engine, users, _) = setup();
    let derived = users.rename(&renames(&[("id", "uid")])).unwrap();
    let err = engine.gateway_relation(derived).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Internal(_)));
}

// =============================================================================
// Laziness
// =============================================================================

#[test]
fn relations_see_rows_inserted_after_construction() {
    let (engine, users, _) = setup();
    let named_jane = users
        .restrict(&Criteria::new().equal("name", "Jane"))
        .unwrap();
    assert_eq!(named_jane.tuples().count(), 1);

    engine
        .get("users")
        .unwrap()
        .insert(Tuple::from([("id", Value::from(3)), ("name", Value::from("Jane"))]));
    assert_eq!(named_jane.tuples().count(), 2);
}

// =============================================================================
// Algebra
// =============================================================================

#[test]
fn natural_join_matches_shared_names() {
    let (_engine, users, tasks) = setup();
    let users = users.rename(&renames(&[("id", "k")])).unwrap();
    let tasks = tasks
        .rename(&renames(&[("id", "task_id"), ("user_id", "k")]))
        .unwrap();
    let joined = users.join(&tasks).unwrap();

    let names: Vec<&str> = joined.header().iter().map(Name::as_str).collect();
    assert_eq!(names, vec!["k", "name", "task_id"]);

    let mut rows: Vec<(i64, i64)> = joined
        .tuples()
        .map(|t| {
            (
                t.get("k").and_then(Value::as_int).unwrap(),
                t.get("task_id").and_then(Value::as_int).unwrap(),
            )
        })
        .collect();
    rows.sort_unstable();
    assert_eq!(rows, vec![(1, 11), (2, 10)]);
}

#[test]
fn rename_swap_is_allowed() {
    let (_engine, users, _) = setup();
    let swapped = users
        .rename(&renames(&[("id", "name"), ("name", "id")]))
        .unwrap();
    let jane = swapped
        .tuples()
        .find(|t| t.get("id") == Some(&Value::from("Jane")))
        .unwrap();
    assert_eq!(jane.get("name"), Some(&Value::Int(1)));
}

#[test]
fn rename_unknown_attribute_fails() {
    let (_engine, users, _) = setup();
    let err = users.rename(&renames(&[("email", "mail")])).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownAttribute { .. }));
}

#[test]
fn project_then_order() {
    let (_engine, _, tasks) = setup();
    let ordered = tasks
        .project(&[Name::new("user_id")])
        .unwrap()
        .order(&[Name::new("user_id")])
        .unwrap();
    let values: Vec<Value> = ordered
        .tuples()
        .map(|t| t.get("user_id").cloned().unwrap())
        .collect();
    assert_eq!(values, vec![Value::Nil, Value::Int(1), Value::Int(2)]);
}

#[test]
fn equal_expressions_are_equal_relations() {
    let (_engine, users, _) = setup();
    let r = renames(&[("id", "users__id")]);
    assert_eq!(users.rename(&r).unwrap(), users.rename(&r).unwrap());
    assert_ne!(users.rename(&r).unwrap(), users);
}

// =============================================================================
// Concurrency
// =============================================================================

#[test]
fn relations_are_readable_from_many_threads() {
    let (_engine, users, tasks) = setup();
    let joined = Arc::new(
        users
            .rename(&renames(&[("id", "k")]))
            .unwrap()
            .join(
                &tasks
                    .rename(&renames(&[("id", "task_id"), ("user_id", "k")]))
                    .unwrap(),
            )
            .unwrap(),
    );

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let joined = Arc::clone(&joined);
            thread::spawn(move || joined.tuples().count())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 2);
    }
}
