use config::GenerationSettings;
use ir::{CodeModel, ModelError};
use pipeline::{transform, transform_json, PipelineError};
use types::{ClientModelGraph, IType, ResultKind};

const PETSTORE: &str = include_str!("fixtures/petstore.json");

fn petstore() -> CodeModel { CodeModel::from_json(PETSTORE).expect("fixture parses") }

fn property_names(graph: &ClientModelGraph, model: &str) -> Vec<String> {
    let (index, _) = graph.model_by_name(model).unwrap_or_else(|| panic!("model {} exists", model));
    graph.all_properties(index).into_iter().map(|p| p.name.clone()).collect()
}

#[test]
fn test_regeneration_is_byte_identical() {
    let settings = GenerationSettings::default();
    let first = transform(petstore(), &settings).expect("first run");
    let second = transform(petstore(), &settings).expect("second run");
    assert_eq!(first.files, second.files);
    assert_eq!(first.graph, second.graph);
    assert_eq!(first.checksum, second.checksum);
}

#[test]
fn test_schema_order_does_not_change_output() {
    let settings = GenerationSettings::default();
    let mut reordered = petstore();
    reordered.schemas.reverse();

    let original = transform(petstore(), &settings).expect("original");
    let permuted = transform(reordered, &settings).expect("permuted");
    for model in &original.graph.models {
        assert_eq!(property_names(&original.graph, &model.name), property_names(&permuted.graph, &model.name));
    }
    assert_eq!(original.files, permuted.files);
}

#[test]
fn test_self_reference_maps_to_itself() {
    let output = transform(petstore(), &GenerationSettings::default()).expect("transform");
    let (index, node) = output.graph.model_by_name("Node").expect("Node model");
    let next = node.property("next").expect("next property");
    assert_eq!(next.client_type.as_model().map(|r| r.index), Some(index));
    assert!(!next.required);
    assert!(output.files["src/models/node.rs"].contains("pub next: Option<Box<Node>>,"));
}

#[test]
fn test_hierarchy_fields_are_base_to_derived() {
    let output = transform(petstore(), &GenerationSettings::default()).expect("transform");
    let names = property_names(&output.graph, "Siamese");
    let own: Vec<&str> =
        names.iter().map(String::as_str).filter(|n| matches!(*n, "name" | "age" | "smart")).collect();
    assert_eq!(own, vec!["name", "age", "smart"]);

    let (_, pet) = output.graph.model_by_name("Pet").expect("Pet model");
    assert_eq!(pet.discriminator.as_deref(), Some("kind"));
    let derived: Vec<&str> = pet.derived.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(derived, vec!["Cat"]);
    let siamese = &output.files["src/models/siamese.rs"];
    assert!(siamese.contains("pub const DISCRIMINATOR_VALUE: &'static str = \"siamese\";"));
}

#[test]
fn test_hierarchy_root_gets_subtype_enum() {
    let output = transform(petstore(), &GenerationSettings::default()).expect("transform");
    let pet = &output.files["src/models/pet.rs"];
    assert!(pet.contains("pub enum AnyPet {\n    Cat(Cat),\n    Siamese(Siamese),\n    Pet(Pet),\n}"));
    for arm in [
        "Some(\"cat\") => serde_json::from_value(value).map(Self::Cat),",
        "Some(\"siamese\") => serde_json::from_value(value).map(Self::Siamese),",
        "_ => serde_json::from_value(value).map(Self::Pet),",
    ] {
        assert!(pet.contains(arm), "missing `{}`", arm);
    }
    assert!(pet.contains("pub fn new(kind: String, name: String) -> Self {"));
    assert!(output.files["src/models/cat.rs"].contains("pub enum AnyCat {"));
    assert!(output.files["src/models/mod.rs"].contains("pub use pet::{AnyPet, Pet};"));
}

/// The shape `src/models/pet.rs` renders for the fixture hierarchy.
mod rendered {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Pet {
        #[serde(rename = "kind")]
        pub kind: String,
        #[serde(rename = "name")]
        pub name: String,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Cat {
        #[serde(rename = "kind")]
        pub kind: String,
        #[serde(rename = "name")]
        pub name: String,
        #[serde(rename = "age")]
        pub age: i32,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Siamese {
        #[serde(rename = "kind")]
        pub kind: String,
        #[serde(rename = "name")]
        pub name: String,
        #[serde(rename = "age")]
        pub age: i32,
        #[serde(rename = "smart")]
        pub smart: bool,
    }

    #[derive(Debug, Clone, PartialEq, Serialize)]
    #[serde(untagged)]
    pub enum AnyPet {
        Cat(Cat),
        Siamese(Siamese),
        Pet(Pet),
    }

    impl<'de> Deserialize<'de> for AnyPet {
        fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let value = serde_json::Value::deserialize(deserializer)?;
            let tag = value.get("kind").and_then(serde_json::Value::as_str).map(str::to_owned);
            let parsed = match tag.as_deref() {
                Some("cat") => serde_json::from_value(value).map(Self::Cat),
                Some("siamese") => serde_json::from_value(value).map(Self::Siamese),
                _ => serde_json::from_value(value).map(Self::Pet),
            };
            parsed.map_err(serde::de::Error::custom)
        }
    }
}

#[test]
fn test_subtype_enum_keeps_derived_fields() {
    use rendered::{AnyPet, Pet, Siamese};

    let wire = r#"{"kind":"siamese","name":"Mia","age":3,"smart":true}"#;
    let parsed: AnyPet = serde_json::from_str(wire).expect("siamese");
    let expected = Siamese { kind: "siamese".into(), name: "Mia".into(), age: 3, smart: true };
    assert_eq!(parsed, AnyPet::Siamese(expected));
    let back: serde_json::Value = serde_json::to_value(&parsed).expect("serialize");
    assert_eq!(back, serde_json::from_str::<serde_json::Value>(wire).expect("wire"));

    let cat: AnyPet = serde_json::from_str(r#"{"kind":"cat","name":"Tom","age":5}"#).expect("cat");
    assert!(matches!(cat, AnyPet::Cat(c) if c.age == 5));

    let unknown: AnyPet = serde_json::from_str(r#"{"kind":"dog","name":"Rex"}"#).expect("base");
    assert_eq!(unknown, AnyPet::Pet(Pet { kind: "dog".into(), name: "Rex".into() }));

    let err = serde_json::from_str::<AnyPet>(r#"{"kind":"siamese","name":"Mia"}"#).expect_err("missing age");
    assert!(err.to_string().contains("age"), "{}", err);
}

#[test]
fn test_optional_constant_becomes_single_member_enum() {
    let output = transform(petstore(), &GenerationSettings::default()).expect("transform");
    let promoted: Vec<_> = output.graph.enums.iter().filter(|e| e.synthesized).collect();
    assert_eq!(promoted.len(), 1);
    let values: Vec<&str> = promoted[0].members.iter().map(|m| m.value.as_str()).collect();
    assert_eq!(values, vec!["application/json"]);
    assert!(!promoted[0].expandable);
}

#[test]
fn test_promotion_can_be_disabled() {
    let settings = GenerationSettings { promote_optional_constants_to_enum: false, ..Default::default() };
    let output = transform(petstore(), &settings).expect("transform");
    assert!(output.graph.enums.iter().all(|e| !e.synthesized));
}

#[test]
fn test_enum_openness() {
    let output = transform(petstore(), &GenerationSettings::default()).expect("transform");
    let (_, color) = output.graph.enum_by_name("Color").expect("Color");
    let (_, mood) = output.graph.enum_by_name("Mood").expect("Mood");
    assert!(!color.expandable);
    assert!(mood.expandable);
    assert!(!output.files["src/models/color.rs"].contains("UnknownValue"));
    assert!(output.files["src/models/mood.rs"].contains("UnknownValue(String),"));
}

#[test]
fn test_paged_operation_yields_lazy_sequence() {
    let output = transform(petstore(), &GenerationSettings::default()).expect("transform");
    let client = &output.graph.clients[0];
    let list = client.methods().find(|m| m.name == "list_pets").expect("list_pets method");
    assert_eq!(list.variant.result, ResultKind::Paged);
    assert!(matches!(&list.return_type, Some(IType::Model(r)) if r.name == "Pet"));
    let paging = list.paging.as_ref().expect("paging details");
    assert!(paging.next_link_name.is_some());

    let source = &output.files["src/clients/pet_store_client.rs"];
    assert!(source.contains("runtime::PagedIterable<Pet>"));
    assert!(source.contains("runtime::PagedFlux<Pet>"));
}

#[test]
fn test_async_methods_follow_settings() {
    let with_async = transform(petstore(), &GenerationSettings::default()).expect("transform");
    assert!(with_async.files["src/clients/pet_store_client.rs"].contains("fn get_pet_async("));

    let settings = GenerationSettings { generate_async_api: false, ..Default::default() };
    let without = transform(petstore(), &settings).expect("transform");
    assert!(without.graph.clients[0].methods().all(|m| !m.variant.is_async()));
    assert!(!without.files["src/clients/pet_store_client.rs"].contains("_async("));
}

#[test]
fn test_namespace_override() {
    let settings = GenerationSettings { namespace: Some("zoo".into()), ..Default::default() };
    let output = transform(petstore(), &settings).expect("transform");
    assert_eq!(output.graph.namespace, "zoo");
    assert!(output.graph.clients.iter().all(|c| c.namespace == "zoo"));
}

#[test]
fn test_unresolved_reference_aborts_run() {
    let json = PETSTORE.replace("\"element\": \"Pet\"", "\"element\": \"Missing\"");
    let err = transform_json(&json, &GenerationSettings::default()).expect_err("dangling element");
    assert!(err.path().is_some(), "error carries a path: {}", err);
    assert!(matches!(
        err,
        PipelineError::Phase(analysis::PhaseError::Model(ModelError::UnresolvedReference { .. }))
            | PipelineError::Model(ModelError::UnresolvedReference { .. })
    ));
}

#[test]
fn test_malformed_document_is_a_load_error() {
    let err = transform_json("{ not json", &GenerationSettings::default()).expect_err("bad json");
    assert!(matches!(err, PipelineError::Load(_)));
}

#[test]
fn test_graph_json_round_trips() {
    let output = transform(petstore(), &GenerationSettings::default()).expect("transform");
    let json = output.graph_json().expect("serialize");
    let graph: ClientModelGraph = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(graph, output.graph);
}

#[test]
fn test_files_write_to_disk() {
    let output = transform(petstore(), &GenerationSettings::default()).expect("transform");
    let dir = tempfile::tempdir().expect("tempdir");
    let written = codegen::write_generated(dir.path(), &output.files, false).expect("write");
    assert_eq!(written, output.files.len());
    assert!(dir.path().join("src/lib.rs").exists());
    assert!(dir.path().join("src/clients/pet_store_client.rs").exists());
}
