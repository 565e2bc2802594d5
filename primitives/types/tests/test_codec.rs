//! Wire contract tests for the model instance codec

use serde_json::json;
use types::*;

fn prop(name: &str, ty: IType, required: bool) -> ClientModelProperty {
    ClientModelProperty {
        name: name.to_string(),
        serialized_name: name.to_string(),
        description: String::new(),
        wire_type: ty.wire_type(),
        client_type: ty,
        required,
        read_only: false,
        is_discriminator: false,
        constant_value: None,
    }
}

fn enum_type(name: &str, expandable: bool) -> EnumType {
    let mut e = EnumType::placeholder(name, "pets", name);
    e.expandable = expandable;
    e.accessor = EnumType::accessor_for(PrimitiveType::String, expandable);
    e.members = ["ValueOne", "ValueTwo"]
        .iter()
        .map(|v| EnumMember { name: v.to_string(), value: v.to_string(), description: String::new() })
        .collect();
    e
}

/// Pet{name} -> Cat{age} -> Siamese{smart}, optionally discriminated by `kind`
fn pet_graph(discriminated: bool) -> ClientModelGraph {
    let mut graph = ClientModelGraph::new("pets");

    let mut pet = ClientModel::placeholder("Pet", "pets", "Pet");
    if discriminated {
        let mut kind = prop("kind", IType::string(), true);
        kind.is_discriminator = true;
        pet.properties.push(kind);
        pet.discriminator = Some("kind".to_string());
        pet.discriminator_value = Some("pet".to_string());
    }
    pet.properties.push(prop("name", IType::string(), true));
    pet.derived.push(TypeRef::new(1, "Cat"));

    let mut cat = ClientModel::placeholder("Cat", "pets", "Cat");
    cat.parent = Some(TypeRef::new(0, "Pet"));
    cat.properties.push(prop("age", IType::Primitive(PrimitiveType::Int32), false));
    cat.derived.push(TypeRef::new(2, "Siamese"));

    let mut siamese = ClientModel::placeholder("Siamese", "pets", "Siamese");
    siamese.parent = Some(TypeRef::new(1, "Cat"));
    siamese.properties.push(prop("smart", IType::Primitive(PrimitiveType::Boolean), false));

    if discriminated {
        cat.discriminator = Some("kind".to_string());
        cat.discriminator_value = Some("cat".to_string());
        siamese.discriminator = Some("kind".to_string());
        siamese.discriminator_value = Some("siamese".to_string());
    }

    graph.models = vec![pet, cat, siamese];
    graph
}

fn tom() -> ModelInstance {
    ModelInstance::new("Siamese").with("name", "Tom").with("age", 3).with("smart", true)
}

#[test]
fn test_three_level_round_trip_base_to_derived_order() {
    let graph = pet_graph(false);
    let wire = graph.serialize_instance(&tom()).expect("serialize Siamese");
    assert_eq!(serde_json::to_string(&wire).expect("to string"), r#"{"name":"Tom","age":3,"smart":true}"#);

    let back = graph.deserialize_instance("Siamese", &wire).expect("deserialize Siamese");
    assert_eq!(back, tom());
}

#[test]
fn test_discriminator_selects_most_derived() {
    let graph = pet_graph(true);
    let wire = graph.serialize_instance(&tom()).expect("serialize Siamese");
    let text = serde_json::to_string(&wire).expect("to string");
    assert_eq!(text, r#"{"kind":"siamese","name":"Tom","age":3,"smart":true}"#);

    let back = graph.deserialize_instance("Pet", &wire).expect("deserialize through base");
    assert_eq!(back, tom());

    let unknown = json!({"kind": "lion", "name": "Leo"});
    let fallback = graph.deserialize_instance("Pet", &unknown).expect("unknown literal falls back");
    assert_eq!(fallback.model, "Pet");
}

#[test]
fn test_missing_required_property_fails() {
    let graph = pet_graph(false);
    let err = graph
        .serialize_instance(&ModelInstance::new("Cat").with("age", 2))
        .expect_err("name is required");
    assert_eq!(err, CodecError::MissingProperty { model: "Cat".to_string(), property: "name".to_string() });

    let err = graph.deserialize_instance("Pet", &json!({})).expect_err("name is required");
    assert!(matches!(err, CodecError::MissingProperty { .. }));
}

#[test]
fn test_enum_openness() {
    let mut graph = ClientModelGraph::new("pets");
    graph.enums = vec![enum_type("Fixed", false), enum_type("Open", true)];
    let mut holder = ClientModel::placeholder("Holder", "pets", "Holder");
    holder.properties.push(prop("fixed", IType::Enum(TypeRef::new(0, "Fixed")), false));
    holder.properties.push(prop("open", IType::Enum(TypeRef::new(1, "Open")), false));
    graph.models.push(holder);

    let err = graph
        .deserialize_instance("Holder", &json!({"fixed": "UnknownValue"}))
        .expect_err("closed enum rejects unknown literal");
    assert_eq!(
        err,
        CodecError::UnknownEnumValue { enum_name: "Fixed".to_string(), value: "UnknownValue".to_string() }
    );

    let wire = json!({"open": "UnknownValue"});
    let instance = graph.deserialize_instance("Holder", &wire).expect("open enum accepts unknown literal");
    assert_eq!(instance.values["open"], json!("UnknownValue"));
    assert_eq!(graph.serialize_instance(&instance).expect("round trip"), wire);
}

#[test]
fn test_type_mismatch_reports_path() {
    let graph = pet_graph(false);
    let err = graph
        .serialize_instance(&ModelInstance::new("Cat").with("name", "Tom").with("age", "three"))
        .expect_err("age must be an integer");
    assert!(matches!(err, CodecError::InvalidValue { ref path, .. } if path == "Cat.age"));
}
