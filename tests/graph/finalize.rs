//! Integration tests for the finalize passes
//!
//! Tests the base and relationship passes, operations on relationships,
//! self-referential relationships, and error reporting.

use joinery_foundation::{ErrorKind, Name, Tuple, Value};
use joinery_graph::{
    BaseRelationMappersFinalizer, Finalizer, GraphConfig, Mapper, MapperRegistry, Operation,
    RelationRegistry, Relationship, RelationshipMappersFinalizer,
};
use joinery_storage::{Criteria, MemoryEngine, RelationSchema};

fn engine() -> MemoryEngine {
    let mut engine = MemoryEngine::new();
    engine.dataset("users").extend([
        Tuple::from([("id", Value::from(1)), ("name", Value::from("Jane"))]),
        Tuple::from([("id", Value::from(2)), ("name", Value::from("John"))]),
    ]);
    engine.dataset("tasks").extend([
        Tuple::from([
            ("id", Value::from(10)),
            ("user_id", Value::from(1)),
            ("title", Value::from("Write")),
            ("done", Value::from(false)),
        ]),
        Tuple::from([
            ("id", Value::from(11)),
            ("user_id", Value::from(1)),
            ("title", Value::from("Review")),
            ("done", Value::from(true)),
        ]),
        Tuple::from([
            ("id", Value::from(12)),
            ("user_id", Value::from(2)),
            ("title", Value::from("Ship")),
            ("done", Value::from(true)),
        ]),
    ]);
    engine.dataset("people").extend([
        Tuple::from([
            ("id", Value::from(1)),
            ("name", Value::from("Ann")),
            ("parent_id", Value::Nil),
        ]),
        Tuple::from([
            ("id", Value::from(2)),
            ("name", Value::from("Bob")),
            ("parent_id", Value::from(1)),
        ]),
        Tuple::from([
            ("id", Value::from(3)),
            ("name", Value::from("Cy")),
            ("parent_id", Value::from(1)),
        ]),
    ]);
    engine
}

fn user(relationships: Vec<Relationship>) -> Mapper {
    relationships.into_iter().fold(
        Mapper::new("User", RelationSchema::new("users", ["id", "name"]).unwrap()),
        Mapper::with_relationship,
    )
}

fn task() -> Mapper {
    Mapper::new(
        "Task",
        RelationSchema::new("tasks", ["id", "user_id", "title", "done"]).unwrap(),
    )
}

fn person() -> Mapper {
    Mapper::new(
        "Person",
        RelationSchema::new("people", ["id", "name", "parent_id"]).unwrap(),
    )
    .with_relationship(Relationship::many_to_one("parent", "Person", "Person"))
    .with_relationship(
        Relationship::one_to_many("children", "Person", "Person").with_target_key(["parent_id"]),
    )
}

fn finalize(mappers: &[Mapper]) -> RelationRegistry<MemoryEngine> {
    let mut registry = RelationRegistry::new(engine());
    Finalizer::new(&register(mappers)).run(&mut registry).unwrap();
    registry
}

fn register(mappers: &[Mapper]) -> MapperRegistry {
    let mut registry = MapperRegistry::new();
    for mapper in mappers {
        registry.register(mapper.clone()).unwrap();
    }
    registry
}

fn column(rows: impl Iterator<Item = Tuple>, name: &str) -> Vec<String> {
    let mut values: Vec<String> = rows.map(|t| t.get(name).unwrap().to_string()).collect();
    values.sort();
    values
}

// =============================================================================
// Passes
// =============================================================================

#[test]
fn base_pass_registers_one_node_per_mapper() {
    let mappers = register(&[user(vec![]), task(), person()]);
    let mut registry = RelationRegistry::new(engine());
    BaseRelationMappersFinalizer::new(&mappers)
        .run(&mut registry)
        .unwrap();

    let names: Vec<&str> = registry.nodes().keys().map(Name::as_str).collect();
    assert_eq!(names, vec!["people", "tasks", "users"]);
    assert!(registry.edges().is_empty());
    assert!(registry.connectors().is_empty());
    assert!(!registry.is_frozen());
}

#[test]
fn passes_can_run_separately() {
    let mappers = register(&[
        user(vec![Relationship::one_to_many("tasks", "User", "Task")]),
        task(),
    ]);
    let mut registry = RelationRegistry::new(engine());
    BaseRelationMappersFinalizer::new(&mappers)
        .run(&mut registry)
        .unwrap();
    RelationshipMappersFinalizer::new(&mappers)
        .run(&mut registry)
        .unwrap();

    assert!(!registry.is_frozen());
    assert_eq!(registry.connector("tasks").unwrap().tuples().count(), 3);
}

#[test]
fn missing_dataset_names_the_model() {
    let mappers = register(&[user(vec![]), task()]);
    let mut registry = RelationRegistry::new(MemoryEngine::new());
    let err = Finalizer::new(&mappers).run(&mut registry).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownRelation(_)));
    assert!(err.to_string().ends_with("(of model User)"));
    assert!(!registry.is_frozen());
}

#[test]
fn missing_target_mapper_is_fatal() {
    let mappers = register(&[user(vec![Relationship::one_to_many("tasks", "User", "Task")])]);
    let mut registry = RelationRegistry::new(engine());
    let err = Finalizer::new(&mappers).run(&mut registry).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::MissingMapper(_)));
    let context = err.context.unwrap();
    assert_eq!(context.relationship, Some(Name::new("tasks")));
    assert_eq!(context.model, Some(Name::new("User")));
}

#[test]
fn unknown_key_attribute_is_fatal() {
    let mappers = register(&[
        user(vec![
            Relationship::one_to_many("tasks", "User", "Task").with_target_key(["owner_id"]),
        ]),
        task(),
    ]);
    let mut registry = RelationRegistry::new(engine());
    let err = Finalizer::new(&mappers).run(&mut registry).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownAttribute { .. }));
}

#[test]
fn custom_node_separator() {
    let mappers = register(&[
        user(vec![Relationship::one_to_many("tasks", "User", "Task")]),
        task(),
    ]);
    let config = GraphConfig::default().with_node_separator("_to_");
    let mut registry = RelationRegistry::with_config(engine(), config);
    Finalizer::new(&mappers).run(&mut registry).unwrap();
    assert!(registry.node("users_to_tasks").is_some());
}

// =============================================================================
// Operations
// =============================================================================

#[test]
fn operation_restricts_and_orders_target() {
    let registry = finalize(&[
        user(vec![
            Relationship::one_to_many("tasks", "User", "Task"),
            Relationship::one_to_many("done_tasks", "User", "Task").with_operation(
                Operation::new()
                    .restrict(Criteria::new().equal("done", true))
                    .order(["title"]),
            ),
        ]),
        task(),
    ]);

    assert_eq!(registry.edges().len(), 2);
    let done = registry.connector("done_tasks").unwrap();
    assert_eq!(done.node().name(), "users_X_tasks__done_tasks");
    let titles: Vec<String> = done
        .tuples()
        .map(|t| t.get("tasks__title").unwrap().to_string())
        .collect();
    assert_eq!(titles, vec!["Review", "Ship"]);

    let all = registry.connector("tasks").unwrap();
    assert_eq!(all.node().name(), "users_X_tasks");
    assert_eq!(all.tuples().count(), 3);
}

#[test]
fn operation_on_unknown_attribute_is_fatal() {
    let mappers = register(&[
        user(vec![Relationship::one_to_many("tasks", "User", "Task").with_operation(
            Operation::new().order(["priority"]),
        )]),
        task(),
    ]);
    let mut registry = RelationRegistry::new(engine());
    let err = Finalizer::new(&mappers).run(&mut registry).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownAttribute { .. }));
}

// =============================================================================
// Self-Referential Relationships
// =============================================================================

#[test]
fn self_join_aliases_the_target_node() {
    let registry = finalize(&[person()]);

    let parent = registry.connector("parent").unwrap();
    assert_eq!(parent.source_node(), "people");
    assert_eq!(parent.target_node(), "people_as_parent");
    assert_eq!(parent.node().name(), "people_X_people_as_parent");
    assert!(!parent.is_collection_target());
    assert_eq!(parent.source_aliases(), registry["people"].aliases());
    assert_eq!(parent.target_aliases().len(), 6);
    assert_eq!(parent.source_view().len(), 3);
    assert_eq!(parent.target_view().len(), 3);

    let children = registry.connector("children").unwrap();
    assert_eq!(children.target_node(), "people_as_children");
    assert!(children.is_collection_target());

    assert!(registry["people_as_parent"].is_base());
    assert_eq!(registry.nodes().len(), 5);
}

#[test]
fn self_join_tuples() {
    let registry = finalize(&[person()]);

    let parent = registry.connector("parent").unwrap();
    let rows: Vec<(String, String)> = parent
        .tuples()
        .map(|t| {
            (
                t.get("people__name").unwrap().to_string(),
                t.get("people_as_parent__name").unwrap().to_string(),
            )
        })
        .collect();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|(_, parent)| parent == "Ann"));

    let children = registry.connector("children").unwrap();
    assert_eq!(
        column(children.tuples(), "people_as_children__name"),
        vec!["Bob", "Cy"]
    );
}
