use analysis::{
    CompilerContext, CompilerPhase, ConstantPromotion, DiscriminatorNormalizer, FlattenMarker, NameNormalizer,
    PagingNextOperations, PhaseError, Transformer,
};
use config::GenerationSettings;
use ir::{
    CodeModel, ConstantSchema, Discriminator, EnumChoice, EnumOpenness, EnumSchema, HttpMethod, ModelError,
    ObjectSchema, Operation, OperationGroup, OperationResponse, Paging, Parameter, ParameterLocation,
    PrimitiveKind, PrimitiveSchema, Property, Request, Schema, SchemaKind, SchemaRef, StatusCode,
};

fn primitive(key: &str, kind: PrimitiveKind) -> Schema {
    Schema::new(key, key, SchemaKind::Primitive(PrimitiveSchema { kind }))
}

fn object(key: &str, properties: Vec<Property>) -> Schema {
    Schema::new(key, key, SchemaKind::Object(ObjectSchema { properties, ..Default::default() }))
}

fn child(key: &str, parent: &str, properties: Vec<Property>) -> Schema {
    Schema::new(
        key,
        key,
        SchemaKind::Object(ObjectSchema {
            properties,
            parents: vec![SchemaRef::new(parent)],
            ..Default::default()
        }),
    )
}

fn constant(key: &str, value_type: &str, value: &str) -> Schema {
    Schema::new(
        key,
        key,
        SchemaKind::Constant(ConstantSchema { value_type: SchemaRef::new(value_type), value: value.into() }),
    )
}

fn operation(name: &str, method: HttpMethod, path: &str, parameters: Vec<Parameter>) -> Operation {
    Operation {
        name: name.into(),
        description: format!("  {} description  ", name),
        request: Request { method, path: path.into(), content_type: None, parameters },
        responses: vec![OperationResponse { status: StatusCode::Code(200), schema: None, headers: vec![], success: true }],
        paging: None,
        long_running: None,
        api_versions: vec![],
        convenience_api: true,
    }
}

fn context(schemas: Vec<Schema>, operations: Vec<Operation>) -> CompilerContext {
    let mut model = CodeModel::new("PetStore", "");
    model.schemas = schemas;
    model.operation_groups = vec![OperationGroup { name: "Pets".into(), description: String::new(), operations }];
    CompilerContext::new(model, GenerationSettings::default())
}

fn object_of<'a>(ctx: &'a CompilerContext, key: &str) -> &'a ObjectSchema {
    ctx.model.schema(key).and_then(|s| s.as_object()).expect("object schema")
}

fn pet_hierarchy(discriminator: Option<&str>) -> Vec<Schema> {
    let mut pet = object("Pet", vec![Property::new("name", SchemaRef::new("string"), true)]);
    if let (Some(name), SchemaKind::Object(o)) = (discriminator, &mut pet.kind) {
        o.discriminator = Some(Discriminator { property_name: name.into(), serialized_name: String::new() });
    }
    let mut cat = child("Cat", "Pet", vec![Property::new("age", SchemaRef::new("int"), true)]);
    if let SchemaKind::Object(o) = &mut cat.kind {
        o.discriminator_value = Some("cat".into());
    }
    let siamese = child("Siamese", "Cat", vec![Property::new("smart", SchemaRef::new("bool"), true)]);
    vec![
        primitive("string", PrimitiveKind::String),
        primitive("int", PrimitiveKind::Int32),
        primitive("bool", PrimitiveKind::Boolean),
        pet,
        cat,
        siamese,
    ]
}

#[test]
fn discriminator_defaults_literals_and_inserts_root_property() {
    let mut ctx = context(pet_hierarchy(Some("kind")), vec![]);
    DiscriminatorNormalizer::new().run(&mut ctx).expect("normalizes");

    let pet = object_of(&ctx, "Pet");
    assert_eq!(pet.properties[0].name, "kind");
    assert!(pet.properties[0].is_discriminator);
    assert!(pet.properties[0].required);
    assert_eq!(pet.properties[1].name, "name");
    assert_eq!(pet.discriminator.as_ref().map(|d| d.serialized_name.as_str()), Some("kind"));
    assert_eq!(object_of(&ctx, "Cat").discriminator_value.as_deref(), Some("cat"));
    assert_eq!(object_of(&ctx, "Siamese").discriminator_value.as_deref(), Some("Siamese"));

    DiscriminatorNormalizer::new().run(&mut ctx).expect("idempotent");
    assert_eq!(object_of(&ctx, "Pet").properties.len(), 2);
}

#[test]
fn discriminator_missing_is_a_validation_error() {
    let mut ctx = context(pet_hierarchy(None), vec![]);
    let err = DiscriminatorNormalizer::new().run(&mut ctx).expect_err("no discriminator");
    match err {
        PhaseError::Model(ModelError::SchemaValidation { path, message }) => {
            assert_eq!(path, "schemas/Pet");
            assert!(message.contains("missing a discriminator"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn discriminator_literals_must_be_unique() {
    let mut schemas = pet_hierarchy(Some("kind"));
    if let SchemaKind::Object(o) = &mut schemas[5].kind {
        o.discriminator_value = Some("cat".into());
    }
    let mut ctx = context(schemas, vec![]);
    let err = DiscriminatorNormalizer::new().run(&mut ctx).expect_err("duplicate literal");
    assert!(matches!(err, PhaseError::Model(ModelError::SchemaValidation { .. })));
}

#[test]
fn normalizer_recases_and_deduplicates_parameters() {
    let string = SchemaRef::new("string");
    let mut content_type = Parameter::new("contentType", string.clone(), ParameterLocation::Header, false);
    content_type.location = None;
    let params = vec![
        Parameter::new("$maxpagesize", string.clone(), ParameterLocation::Query, false),
        Parameter::new("$orderby", string.clone(), ParameterLocation::Query, false),
        content_type,
        Parameter::new("petId", string.clone(), ParameterLocation::Path, true),
        Parameter::new("petId", string.clone(), ParameterLocation::Path, true),
        Parameter::new("pet_id", string.clone(), ParameterLocation::Query, false),
        Parameter::new("type", string, ParameterLocation::Query, false),
    ];
    let mut ctx = context(
        vec![primitive("string", PrimitiveKind::String)],
        vec![operation("listPets", HttpMethod::Get, "/pets/{petId}", params)],
    );
    NameNormalizer::new().run(&mut ctx).expect("normalizes");

    assert!(ctx.model.operation_groups.is_empty());
    assert_eq!(ctx.model.clients.len(), 1);
    assert_eq!(ctx.model.clients[0].name, "PetStore");
    assert_eq!(ctx.model.namespace, "pet_store");

    let op = &ctx.model.clients[0].operation_groups[0].operations[0];
    assert_eq!(op.name, "list_pets");
    assert_eq!(op.description, "listPets description");
    let names: Vec<(&str, &str)> =
        op.request.parameters.iter().map(|p| (p.name.as_str(), p.serialized_name.as_str())).collect();
    assert_eq!(
        names,
        vec![
            ("max_page_size", "$maxpagesize"),
            ("order_by", "$orderby"),
            ("content_type", "Content-Type"),
            ("pet_id", "petId"),
            ("pet_id_param", "pet_id"),
            ("type_parameter", "type"),
        ]
    );
    assert_eq!(op.request.parameters[2].location, Some(ParameterLocation::Header));
    assert_eq!(ctx.checksum.as_ref().map(String::len), Some(64));
}

#[test]
fn normalizer_is_idempotent() {
    let mut ctx = context(
        pet_hierarchy(Some("petKind")),
        vec![operation("getPet", HttpMethod::Get, "/pets", vec![])],
    );
    NameNormalizer::new().run(&mut ctx).expect("first run");
    let first = ctx.checksum.clone();
    let snapshot = ctx.model.clone();
    NameNormalizer::new().run(&mut ctx).expect("second run");
    assert_eq!(ctx.model, snapshot);
    assert_eq!(ctx.checksum, first);
}

#[test]
fn optional_constant_becomes_single_member_enum() {
    let accept = Parameter::new("accept", SchemaRef::new("AcceptConst"), ParameterLocation::Header, false);
    let required = Parameter::new("version", SchemaRef::new("VersionConst"), ParameterLocation::Query, true);
    let mut ctx = context(
        vec![
            primitive("string", PrimitiveKind::String),
            constant("AcceptConst", "string", "application/json"),
            constant("VersionConst", "string", "2024-01-01"),
        ],
        vec![operation("getPet", HttpMethod::Get, "/pets", vec![accept, required])],
    );
    Transformer::new().run_pre_pass(&mut ctx).expect("pre-pass");

    let params = &ctx.model.clients[0].operation_groups[0].operations[0].request.parameters;
    assert_eq!(params[0].schema.key(), "AcceptConst.enum");
    assert_eq!(params[1].schema.key(), "VersionConst");

    let promoted = ctx.model.schema("AcceptConst.enum").expect("synthesized enum");
    assert!(promoted.synthesized);
    match &promoted.kind {
        SchemaKind::Enum(e) => {
            assert_eq!(e.openness, EnumOpenness::Fixed);
            assert_eq!(e.choices.len(), 1);
            assert_eq!(e.choices[0].value, "application/json");
            assert_eq!(e.choices[0].name, "ApplicationJson");
        }
        other => panic!("expected enum, got {:?}", other),
    }

    let count = ctx.model.schemas.len();
    ConstantPromotion::new().run(&mut ctx).expect("idempotent");
    assert_eq!(ctx.model.schemas.len(), count);
}

#[test]
fn constant_over_enum_reuses_the_enum() {
    let color = Schema::new(
        "Color",
        "Color",
        SchemaKind::Enum(EnumSchema {
            value_type: PrimitiveKind::String,
            openness: EnumOpenness::Extensible,
            choices: vec![EnumChoice { name: "Red".into(), value: "red".into(), description: String::new() }],
        }),
    );
    let pet = object("Pet", vec![Property::new("color", SchemaRef::new("RedConst"), false)]);
    let mut ctx = context(vec![color, constant("RedConst", "Color", "red"), pet], vec![]);
    ConstantPromotion::new().run(&mut ctx).expect("promotes");

    assert_eq!(object_of(&ctx, "Pet").properties[0].schema.key(), "Color");
    assert!(ctx.model.schema("RedConst.enum").is_none());
}

#[test]
fn promotion_respects_settings() {
    let pet = object("Pet", vec![Property::new("kind", SchemaRef::new("KindConst"), false)]);
    let mut ctx = context(
        vec![primitive("string", PrimitiveKind::String), constant("KindConst", "string", "pet"), pet],
        vec![],
    );
    ctx.settings.promote_optional_constants_to_enum = false;
    ConstantPromotion::new().run(&mut ctx).expect("no-op");
    assert_eq!(object_of(&ctx, "Pet").properties[0].schema.key(), "KindConst");
}

#[test]
fn flatten_on_polymorphic_object_is_disabled_with_warning() {
    let mut schemas = pet_hierarchy(Some("kind"));
    let mut props = Property::new("properties", SchemaRef::new("Props"), false);
    props.flatten = true;
    let mut pet_ref = Property::new("pet", SchemaRef::new("Pet"), false);
    pet_ref.flatten = true;
    schemas.push(object("Props", vec![Property::new("size", SchemaRef::new("int"), false)]));
    schemas.push(object("Owner", vec![props, pet_ref]));
    let mut ctx = context(schemas, vec![]);

    FlattenMarker::new().run(&mut ctx).expect("marks");
    let owner = object_of(&ctx, "Owner");
    assert!(owner.properties[0].flatten);
    assert!(!owner.properties[1].flatten);
    assert!(object_of(&ctx, "Props").flattened);
    assert_eq!(ctx.diagnostics.warnings.len(), 1);
    assert!(ctx.diagnostics.warnings[0].contains("polymorphic"));
}

#[test]
fn paging_synthesizes_next_operation_once() {
    let mut list = operation(
        "list_pets",
        HttpMethod::Get,
        "/pets",
        vec![
            Parameter::new("x-ms-client-request-id", SchemaRef::new("string"), ParameterLocation::Header, false),
            Parameter::new("top", SchemaRef::new("int"), ParameterLocation::Query, false),
        ],
    );
    list.paging = Some(Paging {
        item_name: "value".into(),
        next_link_name: Some("nextLink".into()),
        continuation_token: None,
        next_operation: None,
    });
    let mut ctx = context(
        vec![primitive("string", PrimitiveKind::String), primitive("int", PrimitiveKind::Int32)],
        vec![list],
    );

    PagingNextOperations::new().run(&mut ctx).expect("synthesizes");
    PagingNextOperations::new().run(&mut ctx).expect("idempotent");

    let ops = &ctx.model.operation_groups[0].operations;
    assert_eq!(ops.len(), 2);
    assert_eq!(ops[0].paging.as_ref().and_then(|p| p.next_operation.as_deref()), Some("list_pets_next"));

    let next = &ops[1];
    assert_eq!(next.name, "list_pets_next");
    assert_eq!(next.request.method, HttpMethod::Get);
    assert_eq!(next.request.path, "{nextLink}");
    assert_eq!(next.request.parameters.len(), 2);
    assert_eq!(next.request.parameters[0].name, "next_link");
    assert!(next.request.parameters[0].skip_url_encoding);
    assert!(next.request.parameters[0].required);
    assert_eq!(next.request.parameters[1].serialized_name, "x-ms-client-request-id");
}

#[test]
fn transformer_runs_both_passes() {
    let transformer = Transformer::new();
    assert_eq!(
        transformer.pre_pass_names(),
        vec!["IrValidator", "DiscriminatorNormalizer", "NameNormalizer", "ConstantPromotion", "FlattenMarker"]
    );
    assert_eq!(transformer.post_pass_names()[0], "PagingNextOperations");

    let mut ctx = context(pet_hierarchy(Some("kind")), vec![]);
    transformer.run_pre_pass(&mut ctx).expect("pre-pass");
    transformer.run_post_pass(&mut ctx).expect("post-pass");
    assert!(ctx.checksum.is_some());
}
