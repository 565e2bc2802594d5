use config::GenerationSettings;
use ir::{
    ArraySchema, ConstantSchema, DictionarySchema, Discriminator, EnumChoice, EnumOpenness, EnumSchema,
    ModelError, ObjectSchema, PrimitiveKind, PrimitiveSchema, Property, Schema, SchemaGraph, SchemaKind,
    SchemaRef, SchemaUsage,
};
use mapper::{MapperOutput, MapperRegistry, VisitState};
use types::{ClientModelGraph, EnumAccessor, IType, PrimitiveType};

fn primitive(key: &str, kind: PrimitiveKind) -> Schema {
    Schema::new(key, key, SchemaKind::Primitive(PrimitiveSchema { kind }))
}

fn object(key: &str, properties: Vec<Property>) -> Schema {
    Schema::new(key, key, SchemaKind::Object(ObjectSchema { properties, ..Default::default() }))
}

fn with_object(mut schema: Schema, edit: impl FnOnce(&mut ObjectSchema)) -> Schema {
    if let SchemaKind::Object(o) = &mut schema.kind {
        edit(o);
    }
    schema
}

fn enumeration(key: &str, value_type: PrimitiveKind, openness: EnumOpenness, values: &[&str]) -> Schema {
    Schema::new(
        key,
        key,
        SchemaKind::Enum(EnumSchema {
            value_type,
            openness,
            choices: values
                .iter()
                .map(|v| EnumChoice { name: v.to_string(), value: v.to_string(), description: String::new() })
                .collect(),
        }),
    )
}

fn map(schemas: Vec<Schema>) -> MapperOutput {
    let graph = SchemaGraph::build(&schemas).expect("valid graph");
    let mut registry = MapperRegistry::new("pets", &GenerationSettings::default());
    registry.map_all(&graph).expect("maps");
    registry.finish()
}

fn map_err(schemas: Vec<Schema>) -> ModelError {
    let graph = SchemaGraph::build(&schemas).expect("valid graph");
    let mut registry = MapperRegistry::new("pets", &GenerationSettings::default());
    registry.map_all(&graph).expect_err("mapping fails")
}

#[test]
fn self_referential_object_maps_to_itself() {
    let node = object(
        "Node",
        vec![
            Property::new("value", SchemaRef::new("string"), true),
            Property::new("next", SchemaRef::new("Node"), false),
        ],
    );
    let output = map(vec![primitive("string", PrimitiveKind::String), node]);

    assert_eq!(output.models.len(), 1);
    let model = &output.models[0];
    assert_eq!(model.name, "Node");
    assert_eq!(model.properties[0].client_type, IType::string());
    match &model.properties[1].client_type {
        IType::Model(r) => {
            assert_eq!(r.index, 0);
            assert_eq!(r.name, "Node");
        }
        other => panic!("expected model reference, got {:?}", other),
    }
    assert!(model.properties[1].is_optional());
}

#[test]
fn mutual_recursion_through_lists_terminates() {
    let tree = object("Tree", vec![Property::new("children", SchemaRef::new("Forest"), false)]);
    let forest = Schema::new("Forest", "Forest", SchemaKind::Array(ArraySchema { element: SchemaRef::new("Tree") }));
    let output = map(vec![tree, forest]);

    assert_eq!(output.models.len(), 1);
    assert_eq!(
        output.models[0].properties[0].client_type,
        IType::List(Box::new(IType::Model(types::TypeRef::new(0, "Tree"))))
    );
}

#[test]
fn cycle_through_value_schemas_fails() {
    let list = Schema::new("List", "List", SchemaKind::Array(ArraySchema { element: SchemaRef::new("Map") }));
    let dict = Schema::new("Map", "Map", SchemaKind::Dictionary(DictionarySchema { value: SchemaRef::new("List") }));
    match map_err(vec![list, dict]) {
        ModelError::SchemaValidation { path, message } => {
            assert_eq!(path, "schemas/List");
            assert!(message.contains("cycle"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn three_level_hierarchy_links_parents_and_subtypes() {
    let pet = with_object(
        object(
            "Pet",
            vec![
                {
                    let mut kind = Property::new("kind", SchemaRef::new("string"), true);
                    kind.is_discriminator = true;
                    kind
                },
                Property::new("name", SchemaRef::new("string"), true),
            ],
        ),
        |o| o.discriminator = Some(Discriminator { property_name: "kind".into(), serialized_name: "kind".into() }),
    );
    let cat = with_object(object("Cat", vec![Property::new("age", SchemaRef::new("int"), true)]), |o| {
        o.parents = vec![SchemaRef::new("Pet")];
        o.discriminator_value = Some("cat".into());
    });
    let siamese = with_object(object("Siamese", vec![Property::new("smart", SchemaRef::new("bool"), true)]), |o| {
        o.parents = vec![SchemaRef::new("Cat")];
        o.discriminator_value = Some("siamese".into());
    });
    let dog = with_object(object("Dog", vec![]), |o| {
        o.parents = vec![SchemaRef::new("Pet")];
        o.discriminator_value = Some("dog".into());
    });
    let output = map(vec![
        siamese,
        dog,
        cat,
        pet,
        primitive("string", PrimitiveKind::String),
        primitive("int", PrimitiveKind::Int32),
        primitive("bool", PrimitiveKind::Boolean),
    ]);
    let graph = ClientModelGraph { models: output.models, enums: output.enums, ..Default::default() };

    let (pet_index, pet) = graph.model_by_name("Pet").expect("Pet");
    let derived: Vec<&str> = pet.derived.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(derived, vec!["Cat", "Dog"]);
    assert_eq!(pet.discriminator.as_deref(), Some("kind"));
    assert!(pet.properties[0].is_discriminator);

    let (siamese_index, siamese) = graph.model_by_name("Siamese").expect("Siamese");
    assert_eq!(siamese.parent.as_ref().map(|p| p.name.as_str()), Some("Cat"));
    assert_eq!(siamese.discriminator.as_deref(), Some("kind"));
    assert_eq!(siamese.discriminator_value.as_deref(), Some("siamese"));

    let names: Vec<&str> = graph.all_properties(siamese_index).iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["kind", "name", "age", "smart"]);
    assert_eq!(graph.descendants(pet_index).len(), 3);
}

#[test]
fn polymorphic_model_without_discriminator_fails() {
    let pet = object("Pet", vec![]);
    let cat = with_object(object("Cat", vec![]), |o| {
        o.parents = vec![SchemaRef::new("Pet")];
        o.discriminator_value = Some("cat".into());
    });
    assert!(matches!(map_err(vec![pet, cat]), ModelError::SchemaValidation { .. }));
}

#[test]
fn multiple_parents_are_unsupported() {
    let a = object("A", vec![]);
    let b = object("B", vec![]);
    let c = with_object(object("C", vec![]), |o| o.parents = vec![SchemaRef::new("A"), SchemaRef::new("B")]);
    assert!(matches!(map_err(vec![a, b, c]), ModelError::UnsupportedSchemaShape { .. }));
}

#[test]
fn identity_not_shape_decides_deduplication() {
    let a = object("Left", vec![Property::new("x", SchemaRef::new("string"), true)]);
    let b = object("Right", vec![Property::new("x", SchemaRef::new("string"), true)]);
    let holder = object(
        "Holder",
        vec![
            Property::new("first", SchemaRef::new("Left"), true),
            Property::new("second", SchemaRef::new("Left"), true),
            Property::new("third", SchemaRef::new("Right"), true),
        ],
    );
    let output = map(vec![primitive("string", PrimitiveKind::String), a, b, holder]);
    assert_eq!(output.models.len(), 3);

    let graph = ClientModelGraph { models: output.models, ..Default::default() };
    let (_, holder) = graph.model_by_name("Holder").expect("Holder");
    assert_eq!(holder.properties[0].client_type, holder.properties[1].client_type);
    assert_ne!(holder.properties[0].client_type, holder.properties[2].client_type);
}

#[test]
fn enum_accessor_follows_openness_and_value_type() {
    let output = map(vec![
        enumeration("Fixed", PrimitiveKind::String, EnumOpenness::Fixed, &["ValueOne", "ValueTwo"]),
        enumeration("Open", PrimitiveKind::String, EnumOpenness::Extensible, &["a"]),
        enumeration("Numbers", PrimitiveKind::Int32, EnumOpenness::Fixed, &["1", "2"]),
    ]);
    let by_name = |name: &str| output.enums.iter().find(|e| e.name == name).expect("enum");

    let fixed = by_name("Fixed");
    assert_eq!(fixed.accessor, EnumAccessor::StringLookup);
    assert!(!fixed.accepts("UnknownValue"));
    assert_eq!(fixed.members.iter().map(|m| m.name.as_str()).collect::<Vec<_>>(), vec!["ValueOne", "ValueTwo"]);

    let open = by_name("Open");
    assert_eq!(open.accessor, EnumAccessor::ValueAccessor);
    assert!(open.accepts("UnknownValue"));

    let numbers = by_name("Numbers");
    assert_eq!(numbers.accessor, EnumAccessor::ValueAccessor);
    assert_eq!(numbers.value_type, PrimitiveType::Int32);
    assert_eq!(numbers.members[0].name, "V1");
}

#[test]
fn colliding_names_get_path_suffix_independent_of_order() {
    let first = Schema::new("Error", "Error", SchemaKind::Object(ObjectSchema::default()));
    let second = Schema::new("storage.Error", "Error", SchemaKind::Object(ObjectSchema::default()));

    let forward = map(vec![first.clone(), second.clone()]);
    let backward = map(vec![second, first]);
    for output in [forward, backward] {
        let mut names: Vec<(&str, &str)> =
            output.models.iter().map(|m| (m.schema_key.as_str(), m.name.as_str())).collect();
        names.sort();
        assert_eq!(names, vec![("Error", "Error"), ("storage.Error", "ErrorStorage")]);
    }
}

#[test]
fn wire_and_client_types_differ_for_string_encoded_values() {
    let event = object(
        "Event",
        vec![
            Property::new("at", SchemaRef::new("datetime"), true),
            Property::new("payload", SchemaRef::new("bytes"), false),
            Property::new("count", SchemaRef::new("long"), false),
        ],
    );
    let output = map(vec![
        primitive("datetime", PrimitiveKind::DateTime),
        primitive("bytes", PrimitiveKind::Bytes),
        primitive("long", PrimitiveKind::Int64),
        event,
    ]);
    let props = &output.models[0].properties;
    assert_eq!(props[0].client_type, IType::Primitive(PrimitiveType::DateTime));
    assert_eq!(props[0].wire_type, IType::string());
    assert_eq!(props[1].wire_type, IType::string());
    assert_eq!(props[2].wire_type, props[2].client_type);
}

#[test]
fn required_constant_keeps_literal_and_output_models_are_immutable() {
    let constant = Schema::new(
        "KindConst",
        "KindConst",
        SchemaKind::Constant(ConstantSchema { value_type: SchemaRef::new("string"), value: "pet".into() }),
    );
    let report = with_object(object("Report", vec![Property::new("kind", SchemaRef::new("KindConst"), true)]), |o| {
        o.usage.insert(SchemaUsage::Output);
    });
    let output = map(vec![primitive("string", PrimitiveKind::String), constant, report]);

    let model = &output.models[0];
    assert!(model.immutable);
    assert_eq!(model.properties[0].client_type, IType::string());
    assert_eq!(model.properties[0].constant_value.as_deref(), Some("pet"));
    assert!(output.enums.is_empty());
}

#[test]
fn flattened_properties_are_lifted_onto_the_owner() {
    let props = object(
        "Props",
        vec![Property::new("size", SchemaRef::new("int"), false), Property::new("name", SchemaRef::new("string"), false)],
    );
    let mut via = Property::new("properties", SchemaRef::new("Props"), false);
    via.flatten = true;
    let resource = object("Resource", vec![Property::new("name", SchemaRef::new("string"), true), via]);
    let output = map(vec![
        primitive("int", PrimitiveKind::Int32),
        primitive("string", PrimitiveKind::String),
        props,
        resource,
    ]);

    let resource = output.models.iter().find(|m| m.name == "Resource").expect("Resource");
    let lifted: Vec<(&str, &str)> =
        resource.flattened.iter().map(|f| (f.via.as_str(), f.property.name.as_str())).collect();
    assert_eq!(lifted, vec![("properties", "size"), ("properties", "properties_name")]);
}

#[test]
fn nested_flattening_reaches_every_level() {
    let limits = object("Limits", vec![Property::new("size", SchemaRef::new("int"), true)]);
    let mut limits_via = Property::new("limits", SchemaRef::new("Limits"), false);
    limits_via.flatten = true;
    let props = object("Props", vec![Property::new("size", SchemaRef::new("int"), false), limits_via]);
    let mut props_via = Property::new("properties", SchemaRef::new("Props"), true);
    props_via.flatten = true;
    let resource = object("Resource", vec![Property::new("name", SchemaRef::new("string"), true), props_via]);
    let output = map(vec![
        primitive("int", PrimitiveKind::Int32),
        primitive("string", PrimitiveKind::String),
        limits,
        props,
        resource,
    ]);

    let resource = output.models.iter().find(|m| m.name == "Resource").expect("Resource");
    let lifted: Vec<(&str, &str)> =
        resource.flattened.iter().map(|f| (f.via.as_str(), f.property.name.as_str())).collect();
    assert_eq!(
        lifted,
        vec![("properties", "size"), ("properties", "limits"), ("properties.limits", "properties_limits_size")]
    );

    let props = output.models.iter().find(|m| m.name == "Props").expect("Props");
    let lifted: Vec<(&str, &str)> = props.flattened.iter().map(|f| (f.via.as_str(), f.property.name.as_str())).collect();
    assert_eq!(lifted, vec![("limits", "limits_size")]);
}

#[test]
fn flatten_cycles_stop_at_the_repeated_model() {
    let mut back = Property::new("owner", SchemaRef::new("Outer"), false);
    back.flatten = true;
    let inner = object("Inner", vec![Property::new("depth", SchemaRef::new("int"), false), back]);
    let mut down = Property::new("inner", SchemaRef::new("Inner"), false);
    down.flatten = true;
    let outer = object("Outer", vec![Property::new("id", SchemaRef::new("int"), true), down]);
    let output = map(vec![primitive("int", PrimitiveKind::Int32), inner, outer]);

    let outer = output.models.iter().find(|m| m.name == "Outer").expect("Outer");
    let vias: Vec<&str> = outer.flattened.iter().map(|f| f.via.as_str()).collect();
    assert_eq!(vias, vec!["inner", "inner"]);
}

#[test]
fn registry_maps_lazily_and_tracks_state() {
    let mut schemas = vec![primitive("string", PrimitiveKind::String)];
    let graph = SchemaGraph::build(&schemas).expect("graph");
    let mut registry = MapperRegistry::new("pets", &GenerationSettings::default());
    registry.map_all(&graph).expect("maps");
    assert_eq!(registry.state("Late"), VisitState::Unvisited);

    schemas.push(object("Late", vec![Property::new("id", SchemaRef::new("string"), true)]));
    let graph = SchemaGraph::build(&schemas).expect("graph");
    let ty = registry.map_schema(&graph, &SchemaRef::new("Late"), "operations/get").expect("maps lazily");
    assert!(matches!(ty, IType::Model(_)));
    assert_eq!(registry.state("Late"), VisitState::Resolved);
    assert_eq!(registry.models()[0].properties.len(), 1);

    let err = registry.map_schema(&graph, &SchemaRef::new("Missing"), "operations/get").expect_err("unresolved");
    assert_eq!(err, ModelError::UnresolvedReference { path: "operations/get".into(), reference: "Missing".into() });
}
