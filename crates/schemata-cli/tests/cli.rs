//! Integration test: run the `schemata` binary and check exit codes and
//! output.

use std::path::Path;
use std::process::{Command, Output};

fn schemata(args: &[&str], dir: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_schemata"))
        .args(args)
        .current_dir(dir)
        .env_remove("SCHEMATA_DRAFT")
        .env_remove("SCHEMATA_SCHEMA_DIR")
        .output()
        .unwrap()
}

fn fixture() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("limit.json"),
        r#"{"type": "object", "properties": {"n": {"maximum": 10, "exclusiveMaximum": true}}}"#,
    )
    .unwrap();
    std::fs::write(dir.path().join("ten.json"), r#"{"n": 10}"#).unwrap();
    std::fs::write(dir.path().join("text.json"), r#"{"n": "ten"}"#).unwrap();
    dir
}

#[test]
fn test_exit_code_zero_when_valid() {
    let dir = fixture();
    let output = schemata(&["validate", "--schema", "limit.json", "ten.json"], dir.path());
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("ten.json: valid"));
}

#[test]
fn test_exit_code_one_when_invalid() {
    let dir = fixture();
    let output = schemata(&["validate", "--schema", "limit.json", "--draft", "draft4", "ten.json"], dir.path());
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stdout).contains("#/n: maximum-error"));
}

#[test]
fn test_draft_from_environment() {
    let dir = fixture();
    let output = Command::new(env!("CARGO_BIN_EXE_schemata"))
        .args(["validate", "--schema", "limit.json", "ten.json"])
        .current_dir(dir.path())
        .env("SCHEMATA_DRAFT", "draft4")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_exit_code_two_on_missing_document() {
    let dir = fixture();
    let output = schemata(&["validate", "--schema", "limit.json", "absent.json"], dir.path());
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("error:"));
}

#[test]
fn test_config_file_sets_schema_dir() {
    let dir = fixture();
    std::fs::create_dir(dir.path().join("schemas")).unwrap();
    std::fs::write(dir.path().join("schemas").join("name.json"), r#"{"type": "string"}"#).unwrap();
    std::fs::write(dir.path().join("schemata.yaml"), "schema_dir: schemas\n").unwrap();
    std::fs::write(dir.path().join("name-doc.json"), "42").unwrap();
    let output = schemata(
        &["validate", "--config", "schemata.yaml", "--schema", "name.json", "name-doc.json"],
        dir.path(),
    );
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_navigate_prints_schema() {
    let dir = fixture();
    let output = schemata(&["navigate", "--schema", "limit.json", "--pointer", "#/n"], dir.path());
    assert_eq!(output.status.code(), Some(0));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["schema"]["maximum"], 10);
}
