//! Round-trip tests for CodeModel serialization
//!
//! Tests that a code model survives a trip through a file and that
//! serialization is deterministic.

use clientgen_ir::*;
use tempfile::TempDir;

/// Create a sample code model for testing
fn create_sample_model() -> CodeModel {
    let mut model = CodeModel::new("Pets", "pets");
    model.schemas.push(Schema::new(
        "string",
        "string",
        SchemaKind::Primitive(PrimitiveSchema { kind: PrimitiveKind::String }),
    ));
    model.schemas.push(Schema::new(
        "Pet",
        "Pet",
        SchemaKind::Object(ObjectSchema {
            properties: vec![Property::new("name", SchemaRef::new("string"), true)],
            ..Default::default()
        }),
    ));
    model.operation_groups.push(OperationGroup {
        name: String::new(),
        description: String::new(),
        operations: vec![Operation {
            name: "getPet".to_string(),
            description: "Get a pet".to_string(),
            request: Request {
                method: HttpMethod::Get,
                path: "/pets/{petId}".to_string(),
                content_type: None,
                parameters: vec![Parameter::new(
                    "petId",
                    SchemaRef::new("string"),
                    ParameterLocation::Path,
                    true,
                )],
            },
            responses: vec![
                OperationResponse {
                    status: StatusCode::Code(200),
                    schema: Some(SchemaRef::new("Pet")),
                    headers: vec![],
                    success: true,
                },
                OperationResponse {
                    status: StatusCode::Range(4),
                    schema: None,
                    headers: vec![],
                    success: false,
                },
            ],
            paging: None,
            long_running: None,
            api_versions: vec![],
            convenience_api: true,
        }],
    });
    model
}

#[test]
fn test_roundtrip_serialization() {
    let original = create_sample_model();
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("model.json");

    original.to_file(&file_path).expect("Failed to save code model");
    let loaded = CodeModel::from_file(&file_path).expect("Failed to load code model");

    assert_eq!(original, loaded);
    assert_eq!(loaded.operation_count(), 1);
}

#[test]
fn test_deterministic_serialization() {
    let model = create_sample_model();
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let first = temp_dir.path().join("first.json");
    let second = temp_dir.path().join("second.json");

    model.to_file(&first).expect("Failed to save first file");
    model.to_file(&second).expect("Failed to save second file");

    let content1 = std::fs::read_to_string(&first).expect("Failed to read first file");
    let content2 = std::fs::read_to_string(&second).expect("Failed to read second file");
    assert_eq!(content1, content2);
    assert!(content1.ends_with('\n'));
    assert!(content1.contains("\"status\": \"4XX\""));
}

#[test]
fn test_defaults_when_fields_missing() {
    let json = r#"{
        "name": "Minimal",
        "schemas": [
            {"key": "obj", "name": "Obj", "type": "object"}
        ],
        "operationGroups": [
            {"operations": [{
                "name": "list",
                "request": {"method": "get", "path": "/items"},
                "responses": [{"status": "200", "success": true}],
                "paging": {"nextLinkName": "nextLink"}
            }]}
        ]
    }"#;
    let model = CodeModel::from_json(json).expect("minimal model should parse");
    let op = model.operations().next().expect("one operation");
    let paging = op.paging.as_ref().expect("paging contract");
    assert_eq!(paging.item_name, "value");
    assert!(op.convenience_api);
    assert_eq!(model.schemas[0].as_object().map(|o| o.properties.len()), Some(0));
}

#[test]
fn test_invalid_json_is_reported() {
    let err = CodeModel::from_json("{ not json").expect_err("invalid JSON must fail");
    assert!(matches!(err, LoadError::Json(_)));
}
