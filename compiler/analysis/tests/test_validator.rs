use analysis::{CompilerContext, CompilerPhase, IrValidator, PhaseError};
use config::GenerationSettings;
use ir::{
    CodeModel, HttpMethod, ModelError, ObjectSchema, Operation, OperationGroup, OperationResponse,
    Parameter, ParameterLocation, PrimitiveKind, PrimitiveSchema, Property, Request, Schema,
    SchemaKind, SchemaRef, StatusCode,
};

fn string_schema() -> Schema {
    Schema::new("string", "string", SchemaKind::Primitive(PrimitiveSchema { kind: PrimitiveKind::String }))
}

fn object(key: &str, properties: Vec<Property>, parents: Vec<&str>) -> Schema {
    Schema::new(
        key,
        key,
        SchemaKind::Object(ObjectSchema {
            properties,
            parents: parents.into_iter().map(SchemaRef::new).collect(),
            ..Default::default()
        }),
    )
}

fn get_operation(name: &str, path: &str, parameters: Vec<Parameter>) -> Operation {
    Operation {
        name: name.into(),
        description: String::new(),
        request: Request { method: HttpMethod::Get, path: path.into(), content_type: None, parameters },
        responses: vec![OperationResponse {
            status: StatusCode::Code(200),
            schema: None,
            headers: vec![],
            success: true,
        }],
        paging: None,
        long_running: None,
        api_versions: vec![],
        convenience_api: true,
    }
}

fn model_with(schemas: Vec<Schema>, operations: Vec<Operation>) -> CodeModel {
    let mut model = CodeModel::new("PetStore", "pets");
    model.schemas = schemas;
    model.operation_groups =
        vec![OperationGroup { name: "Pets".into(), description: String::new(), operations }];
    model
}

#[test]
fn accepts_well_formed_model() {
    let pet = object("Pet", vec![Property::new("name", SchemaRef::new("string"), true)], vec![]);
    let op = get_operation(
        "getPet",
        "/pets/{petId}",
        vec![Parameter::new("petId", SchemaRef::new("string"), ParameterLocation::Path, true)],
    );
    let model = model_with(vec![string_schema(), pet], vec![op]);

    let errors = IrValidator::new().validate(&model);
    assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
}

#[test]
fn fails_on_duplicate_schema_keys() {
    let model = model_with(vec![string_schema(), string_schema()], vec![]);
    let errors = IrValidator::new().validate(&model);
    assert!(matches!(errors.as_slice(), [ModelError::SchemaValidation { path, .. }] if path == "schemas/string"));
}

#[test]
fn reports_unresolved_property_reference_with_path() {
    let pet = object("Pet", vec![Property::new("owner", SchemaRef::new("Owner"), false)], vec![]);
    let model = model_with(vec![pet], vec![]);

    let errors = IrValidator::new().validate(&model);
    assert_eq!(
        errors,
        vec![ModelError::UnresolvedReference {
            path: "schemas/Pet/properties/owner".into(),
            reference: "Owner".into()
        }]
    );
}

#[test]
fn rejects_multiple_inheritance() {
    let a = object("A", vec![], vec![]);
    let b = object("B", vec![], vec![]);
    let c = object("C", vec![], vec!["A", "B"]);
    let model = model_with(vec![a, b, c], vec![]);

    let errors = IrValidator::new().validate(&model);
    assert!(errors.iter().any(|e| matches!(e, ModelError::UnsupportedSchemaShape { path, .. } if path == "schemas/C")));
}

#[test]
fn rejects_unbound_path_placeholder() {
    let op = get_operation("getPet", "/pets/{petId}", vec![]);
    let model = model_with(vec![string_schema()], vec![op]);

    let errors = IrValidator::new().validate(&model);
    assert_eq!(
        errors,
        vec![ModelError::UnresolvedReference {
            path: "operationGroups/Pets/operations/getPet/path".into(),
            reference: "{petId}".into()
        }]
    );
}

#[test]
fn phase_fails_with_first_error_and_records_all() {
    let pet = object(
        "Pet",
        vec![
            Property::new("owner", SchemaRef::new("Owner"), false),
            Property::new("toy", SchemaRef::new("Toy"), false),
        ],
        vec![],
    );
    let mut ctx = CompilerContext::new(model_with(vec![pet], vec![]), GenerationSettings::default());

    let err = IrValidator::new().run(&mut ctx).expect_err("invalid model");
    assert!(matches!(err, PhaseError::Model(ModelError::UnresolvedReference { .. })));
    assert_eq!(ctx.diagnostics.errors.len(), 2);
    assert_eq!(ctx.diagnostics.stats.get("ir_validation_errors"), Some(&2));
}
