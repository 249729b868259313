use graft::{
    Constructor, ErrorCategory, ErrorKind, Instance, JsonDeserializer, MemberMapping, ObjectRef,
    ObjectShape, ReferenceResolver, ReferenceTable, Materializer, JsonReader, ScalarKind, Settings,
    TypeCatalog, TypeName, TypeRef, Value,
};
use std::sync::Arc;

fn catalog() -> Arc<TypeCatalog> {
    let catalog = TypeCatalog::new();
    catalog.register(
        ObjectShape::builder("Person")
            .default_constructor()
            .member(MemberMapping::new("name", TypeRef::Scalar(ScalarKind::String)))
            .member(MemberMapping::new("spouse", TypeRef::named("Person")))
            .member(MemberMapping::new("friends", TypeRef::list(TypeRef::named("Person"))))
            .member(MemberMapping::new("self", TypeRef::named("Person")))
            .build()
            .unwrap(),
    );
    Arc::new(catalog)
}

fn read(json: &str, ty: TypeRef) -> Result<Value, graft::Error> {
    JsonDeserializer::new()
        .with_catalog(catalog())
        .value_from_str(json, Some(&ty))
}

#[test]
fn self_reference_is_same_instance() {
    let value = read(r#"{"$id": "1", "self": {"$ref": "1"}}"#, TypeRef::named("Person")).unwrap();
    let person = value.as_object().unwrap();
    assert!(person.get("self").unwrap().same_instance(&value));
}

#[test]
fn mutual_references() {
    let json = r#"[
        {"$id": "a", "name": "Ann", "spouse": {"$id": "b", "name": "Bob", "spouse": {"$ref": "a"}}},
        {"$ref": "b"}
    ]"#;
    let value = read(json, TypeRef::list(TypeRef::named("Person"))).unwrap();
    let people = value.as_list().unwrap().to_vec();
    let ann = people[0].as_object().unwrap();
    let bob = ann.get("spouse").unwrap();
    assert!(bob.same_instance(&people[1]));
    assert!(bob.as_object().unwrap().get("spouse").unwrap().same_instance(&people[0]));
    assert_eq!(bob.as_object().unwrap().get("name"), Some(Value::from("Bob")));
}

#[test]
fn wrapped_list_is_shared() {
    let json = r#"{
        "name": "Ann",
        "friends": {"$id": "f", "$values": [{"name": "Cy"}]},
        "spouse": {"name": "Bob", "friends": {"$ref": "f"}}
    }"#;
    let value = read(json, TypeRef::named("Person")).unwrap();
    let ann = value.as_object().unwrap();
    let bob = ann.get("spouse").unwrap();
    let shared = bob.as_object().unwrap().get("friends").unwrap();
    assert!(shared.same_instance(&ann.get("friends").unwrap()));
    assert_eq!(shared.as_list().unwrap().len(), 1);
}

#[test]
fn unresolved_reference() {
    let err = read(r#"{"$ref": "99"}"#, TypeRef::named("Person")).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Reference);
    assert!(matches!(err.kind(), ErrorKind::UnresolvedReference { id } if id == "99"));
}

#[test]
fn duplicate_id() {
    let json = r#"[{"$id": "1"}, {"$id": "1"}]"#;
    let err = read(json, TypeRef::list(TypeRef::named("Person"))).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::DuplicateReference { .. }));
    assert_eq!(err.path(), "$[1]");
}

#[test]
fn numeric_ids() {
    let json = r#"[{"$id": 1, "name": "x"}, {"$ref": 1}]"#;
    let value = read(json, TypeRef::list(TypeRef::named("Person"))).unwrap();
    let people = value.as_list().unwrap().to_vec();
    assert!(people[0].same_instance(&people[1]));
}

#[test]
fn references_are_scoped_to_a_call() {
    let deserializer = JsonDeserializer::new().with_catalog(catalog());
    let ty = TypeRef::named("Person");
    deserializer.value_from_str(r#"{"$id": "1"}"#, Some(&ty)).unwrap();
    deserializer.value_from_str(r#"{"$id": "1"}"#, Some(&ty)).unwrap();
    let err = deserializer.value_from_str(r#"{"$ref": "1"}"#, Some(&ty)).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Reference);
}

#[test]
fn caller_resolver_spans_calls() {
    let catalog = catalog();
    let settings = Settings::new();
    let ty = TypeRef::named("Person");
    let mut table = ReferenceTable::new();

    let first = {
        let mut materializer = Materializer::with_resolver(&catalog, &settings, &mut table);
        materializer
            .deserialize(&mut JsonReader::new(r#"{"$id": "1", "name": "Ann"}"#), Some(&ty))
            .unwrap()
    };

    let second = {
        let mut materializer = Materializer::with_resolver(&catalog, &settings, &mut table);
        materializer
            .deserialize(&mut JsonReader::new(r#"{"$ref": "1"}"#), Some(&ty))
            .unwrap()
    };

    assert!(first.same_instance(&second));
    assert_eq!(table.len(), 1);
    assert!(table.resolve_reference("1").unwrap().same_instance(&first));
}

fn family() -> Arc<TypeCatalog> {
    let catalog = TypeCatalog::new();
    catalog.register(
        ObjectShape::builder("Child")
            .default_constructor()
            .member(MemberMapping::new("v", TypeRef::Scalar(ScalarKind::I32)))
            .build()
            .unwrap(),
    );
    catalog.register(
        ObjectShape::builder("Parent")
            .constructor(Constructor::parameterless_with("Parent", |instance| {
                let child = ObjectRef::new(Instance::new(TypeName::from("Child")));
                instance.set("child", Value::Object(child));
            }))
            .member(MemberMapping::new("first", TypeRef::named("Child")))
            .member(MemberMapping::new("child", TypeRef::named("Child")))
            .build()
            .unwrap(),
    );
    Arc::new(catalog)
}

#[test]
fn reference_replaces_member_instance() {
    let json = r#"{"first": {"$id": "1", "v": 7}, "child": {"$ref": "1"}}"#;
    let value = JsonDeserializer::new()
        .with_catalog(family())
        .value_from_str(json, Some(&TypeRef::named("Parent")))
        .unwrap();
    let parent = value.as_object().unwrap();
    let first = parent.get("first").unwrap();
    let child = parent.get("child").unwrap();
    assert!(child.same_instance(&first));
    assert_eq!(child.as_object().unwrap().get("v"), Some(Value::from(7i32)));
}

#[test]
fn object_without_reference_populates_member_instance() {
    let catalog = family();
    let settings = Settings::new();
    let mut materializer = Materializer::new(&catalog, &settings);
    let parent = materializer
        .deserialize(&mut JsonReader::new("{}"), Some(&TypeRef::named("Parent")))
        .unwrap();
    let original = parent.as_object().unwrap().get("child").unwrap();

    materializer
        .populate(&mut JsonReader::new(r#"{"child": {"v": 3}}"#), &parent)
        .unwrap();
    let child = parent.as_object().unwrap().get("child").unwrap();
    assert!(child.same_instance(&original));
    assert_eq!(child.as_object().unwrap().get("v"), Some(Value::from(3i32)));
}
