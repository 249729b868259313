use graft::{
    Converter, EnumShape, ErrorCategory, ErrorKind, JsonDeserializer, MemberMapping, Nested,
    ObjectShape, Scalar, ScalarKind, SequenceKind, Token, TokenStream, TypeCatalog, TypeRef, Value,
};
use std::sync::Arc;

fn zoo() -> TypeCatalog {
    let catalog = TypeCatalog::new();
    catalog.register(
        ObjectShape::builder("Animal")
            .abstract_type()
            .member(MemberMapping::new("name", TypeRef::Scalar(ScalarKind::String)))
            .build()
            .unwrap(),
    );
    catalog.register(
        ObjectShape::builder("Dog")
            .assembly("Zoo")
            .base("Animal")
            .default_constructor()
            .member(MemberMapping::new("name", TypeRef::Scalar(ScalarKind::String)))
            .member(MemberMapping::new("good", TypeRef::Scalar(ScalarKind::Bool)))
            .build()
            .unwrap(),
    );
    catalog.register(
        ObjectShape::builder("Cage")
            .default_constructor()
            .member(MemberMapping::new("animal", TypeRef::named("Animal")))
            .member(MemberMapping::new("size", TypeRef::named("Size")))
            .member(MemberMapping::new("note", TypeRef::Raw))
            .member(MemberMapping::new("extra", TypeRef::Any))
            .build()
            .unwrap(),
    );
    catalog.register(ObjectShape::builder("Rock").default_constructor().build().unwrap());
    catalog.register(EnumShape::new("Size", [("Small", 0), ("Large", 1)]));
    catalog
}

fn read(catalog: TypeCatalog, json: &str, ty: TypeRef) -> Result<Value, graft::Error> {
    JsonDeserializer::new()
        .with_catalog(Arc::new(catalog))
        .value_from_str(json, Some(&ty))
}

#[test]
fn type_name_narrows_abstract_member() {
    let json = r#"{"animal": {"$type": "Dog, Zoo", "name": "Rex", "good": true}, "size": "large"}"#;
    let value = read(zoo(), json, TypeRef::named("Cage")).unwrap();
    let cage = value.as_object().unwrap();
    let animal = cage.get("animal").unwrap();
    let dog = animal.as_object().unwrap();
    assert_eq!(dog.type_name().as_ref(), "Dog");
    assert_eq!(dog.get("good"), Some(Value::from(true)));

    match cage.get("size") {
        Some(Value::Scalar(Scalar::Enum(x))) => assert_eq!(x.name(), "Large"),
        x => panic!("unexpected size {:?}", x),
    }
}

#[test]
fn abstract_target_without_type_name() {
    let err = read(zoo(), r#"{"name": "Rex"}"#, TypeRef::named("Animal")).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::AbstractType { .. }));
    assert_eq!(err.category(), ErrorCategory::Construction);
}

#[test]
fn non_assignable_type_name() {
    let err = read(zoo(), r#"{"$type": "Rock"}"#, TypeRef::named("Animal")).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::TypeMismatch { .. }));
    assert_eq!(err.category(), ErrorCategory::TypeResolution);

    let err = read(zoo(), r#"{"$type": "Dog, Farm"}"#, TypeRef::named("Animal")).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::TypeResolution { .. }));
}

#[test]
fn type_name_ignored_when_disabled() {
    let settings = graft::Settings::new().with_type_name_handling(graft::TypeNameHandling::None);
    let value = JsonDeserializer::new()
        .with_settings(settings)
        .with_catalog(Arc::new(zoo()))
        .value_from_str(r#"{"$type": "Rock", "name": "Rex"}"#, Some(&TypeRef::named("Dog")))
        .unwrap();
    assert_eq!(value.as_object().unwrap().type_name().as_ref(), "Dog");
}

#[test]
fn untyped_members_become_trees_and_raw_text() {
    let json = r#"{"extra": {"a": [1, 2.5], "$type": "Nope"}, "note": {"b" : [ 1 ,2 ]}}"#;
    let value = read(zoo(), json, TypeRef::named("Cage")).unwrap();
    let cage = value.as_object().unwrap();
    assert_eq!(
        cage.get("extra"),
        Some(Value::Tree(serde_json::json!({"a": [1, 2.5], "$type": "Nope"})))
    );
    match cage.get("note") {
        Some(Value::Raw(raw)) => assert_eq!(raw.as_str(), r#"{"b":[1,2]}"#),
        x => panic!("unexpected note {:?}", x),
    }
}

#[test]
fn map_targets_use_dictionary_protocol() {
    let ty = TypeRef::map(TypeRef::Scalar(ScalarKind::String), TypeRef::named("Dog"));
    let json = r#"{"$id": "m", "rex": {"name": "Rex"}, "$type": {"name": "Odd"}}"#;
    let value = read(zoo(), json, ty).unwrap();
    let map = value.as_map().unwrap();
    assert_eq!(map.len(), 2);
    let odd = map.get(&Scalar::String(String::from("$type"))).unwrap();
    assert_eq!(odd.as_object().unwrap().get("name"), Some(Value::from("Odd")));
}

#[test]
fn read_only_lists_are_frozen() {
    let ty = TypeRef::Sequence(SequenceKind::ReadOnly, Box::new(TypeRef::Scalar(ScalarKind::U8)));
    let value = read(zoo(), "[1, 2]", ty).unwrap();
    let list = value.as_list().unwrap();
    assert_eq!(list.kind(), SequenceKind::ReadOnly);
    assert_eq!(list.len(), 2);
    assert!(!list.borrow_mut().push(Value::from(3u8)));
}

#[test]
fn dates_are_scalars() {
    let ty = TypeRef::list(TypeRef::Scalar(ScalarKind::Date));
    let value = read(zoo(), r#"["\/Date(86400000)\/", "1970-01-03T00:00:00Z"]"#, ty).unwrap();
    let items: Vec<String> = value
        .as_list()
        .unwrap()
        .to_vec()
        .iter()
        .map(|x| x.as_scalar().unwrap().to_string())
        .collect();
    assert_eq!(items, vec!["1970-01-02T00:00:00Z", "1970-01-03T00:00:00Z"]);
}

struct UpperConverter;

impl Converter for UpperConverter {
    fn can_convert(&self, ty: &TypeRef) -> bool {
        *ty == TypeRef::Scalar(ScalarKind::String)
    }

    fn read_json(
        &self,
        stream: &mut dyn TokenStream,
        _ty: &TypeRef,
        _nested: &mut Nested<'_, '_>,
    ) -> Result<Value, graft::Error> {
        match stream.token() {
            Token::String(x) => Ok(Value::from(x.to_uppercase())),
            _ => Err(graft::Error::custom("expected string")),
        }
    }
}

/// Reads `[tag, value]` pairs, handing the value back to the materializer
struct TaggedConverter;

impl Converter for TaggedConverter {
    fn can_convert(&self, ty: &TypeRef) -> bool {
        *ty == TypeRef::named("Tagged")
    }

    fn read_json(
        &self,
        stream: &mut dyn TokenStream,
        _ty: &TypeRef,
        nested: &mut Nested<'_, '_>,
    ) -> Result<Value, graft::Error> {
        stream.advance()?;
        let tag = nested.deserialize(stream, &TypeRef::Scalar(ScalarKind::String))?;
        stream.advance()?;
        let value = nested.deserialize(stream, &TypeRef::named("Dog"))?;
        stream.advance()?;
        Ok(Value::list(TypeRef::Any, vec![tag, value]))
    }
}

#[test]
fn catalog_converters_take_precedence() {
    let catalog = zoo().with_converter(Arc::new(UpperConverter));
    let value = read(catalog, r#"{"name": "rex"}"#, TypeRef::named("Dog")).unwrap();
    assert_eq!(value.as_object().unwrap().get("name"), Some(Value::from("REX")));
}

#[test]
fn converters_recurse_through_nested() {
    let catalog = zoo()
        .with_converter(Arc::new(UpperConverter))
        .with_converter(Arc::new(TaggedConverter));
    let ty = TypeRef::list(TypeRef::named("Tagged"));
    let value = read(catalog, r#"[["a", {"name": "rex"}], ["b", {"name": "max"}]]"#, ty).unwrap();
    let items = value.as_list().unwrap().to_vec();
    assert_eq!(items.len(), 2);
    let second = items[1].as_list().unwrap().to_vec();
    assert_eq!(second[0], Value::from("B"));
    assert_eq!(second[1].as_object().unwrap().get("name"), Some(Value::from("MAX")));
}

#[test]
fn member_converter_overrides_catalog() {
    let catalog = TypeCatalog::new().with_converter(Arc::new(UpperConverter));
    catalog.register(
        ObjectShape::builder("Label")
            .default_constructor()
            .member(MemberMapping::new("raw", TypeRef::Scalar(ScalarKind::String)))
            .member(
                MemberMapping::new("shout", TypeRef::named("Tagged"))
                    .with_converter(Arc::new(TaggedConverter)),
            )
            .build()
            .unwrap(),
    );
    catalog.register(
        ObjectShape::builder("Dog")
            .default_constructor()
            .member(MemberMapping::new("name", TypeRef::Scalar(ScalarKind::String)))
            .build()
            .unwrap(),
    );
    let json = r#"{"raw": "a", "shout": ["b", {"name": "c"}]}"#;
    let value = read(catalog, json, TypeRef::named("Label")).unwrap();
    let label = value.as_object().unwrap();
    assert_eq!(label.get("raw"), Some(Value::from("A")));
    assert_eq!(label.get("shout").unwrap().as_list().unwrap().len(), 2);
}
