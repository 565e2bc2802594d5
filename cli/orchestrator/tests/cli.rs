use std::path::PathBuf;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../compiler/pipeline/tests/fixtures/petstore.json")
}

#[test]
fn test_help_flag() {
    cargo_bin_cmd!("clientgen")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Generate typed client libraries"))
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("settings"));
}

#[test]
fn test_settings_prints_defaults() {
    cargo_bin_cmd!("clientgen")
        .arg("settings")
        .assert()
        .success()
        .stdout(predicate::str::contains("flattenClientFlattenedProperties = true"))
        .stdout(predicate::str::contains("generateAsyncAPI = true"));
}

#[test]
fn test_settings_reads_config_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("clientgen.toml");
    std::fs::write(&path, "[settings]\ngenerateAsyncAPI = false\n").expect("write config");
    cargo_bin_cmd!("clientgen")
        .args(["settings", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("generateAsyncAPI = false"));
}

#[test]
fn test_generate_writes_sources() {
    let dir = tempfile::tempdir().expect("tempdir");
    let graph = dir.path().join("graph.json");
    cargo_bin_cmd!("clientgen")
        .arg("generate")
        .arg("--input")
        .arg(fixture())
        .arg("--output")
        .arg(dir.path())
        .arg("--graph")
        .arg(&graph)
        .assert()
        .success()
        .stdout(predicate::str::contains("pet_store"));

    assert!(dir.path().join("src/lib.rs").exists());
    assert!(dir.path().join("src/models/pet.rs").exists());
    assert!(dir.path().join("src/clients/pet_store_client.rs").exists());
    let json = std::fs::read_to_string(&graph).expect("graph written");
    assert!(json.contains("\"namespace\": \"pet_store\""));
}

#[test]
fn test_no_async_drops_async_methods() {
    let dir = tempfile::tempdir().expect("tempdir");
    cargo_bin_cmd!("clientgen")
        .arg("generate")
        .arg("--no-async")
        .arg("--input")
        .arg(fixture())
        .arg("--output")
        .arg(dir.path())
        .assert()
        .success();

    let client =
        std::fs::read_to_string(dir.path().join("src/clients/pet_store_client.rs")).expect("client written");
    assert!(!client.contains("_async("));
}

#[test]
fn test_missing_input_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    cargo_bin_cmd!("clientgen")
        .args(["generate", "--input", "no-such-model.json", "--output"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no-such-model.json"));
}

#[test]
fn test_missing_config_fails() {
    cargo_bin_cmd!("clientgen")
        .args(["settings", "--config", "no-such-config.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config file not found"));
}
