//! CLI integration tests
//!
//! These tests verify the CLI commands work correctly by running the binary.

#![cfg(feature = "cli")]

use std::path::PathBuf;
use std::process::Command;

fn xsd_model_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_xsd-model"))
}

fn fixtures_dir() -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path
}

fn library_xsd() -> String {
    fixtures_dir()
        .join("library")
        .join("library.xsd")
        .to_string_lossy()
        .to_string()
}

// ============================================================================
// Inspect Command Tests
// ============================================================================

#[test]
fn test_cli_inspect_basic() {
    let output = Command::new(xsd_model_bin())
        .args(["inspect", library_xsd().as_str()])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "inspect should succeed");
    assert!(stdout.contains("xsd-model"), "should show version");
    assert!(stdout.contains("http://example.com/library"), "should show namespace");
    assert!(stdout.contains("Files: 3"), "should show file count");
    assert!(stdout.contains("Complex Types: 5"), "should show type count");
    assert!(stdout.contains("library : anonymous"), "should list root elements");
}

#[test]
fn test_cli_inspect_json_output() {
    let output = Command::new(xsd_model_bin())
        .args(["inspect", "--json", library_xsd().as_str()])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success(), "inspect --json should succeed");
    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(json["multi_file_info"]["total_files"], 3);
    assert!(json["complex_types"]["BookType"].is_object());
}

#[test]
fn test_cli_inspect_element() {
    let output = Command::new(xsd_model_bin())
        .args(["inspect", "--element", "book", library_xsd().as_str()])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("Path: /library/book"));
    assert!(stdout.contains("Type: tns:BookType"));
}

#[test]
fn test_cli_inspect_missing_file() {
    let output = Command::new(xsd_model_bin())
        .args(["inspect", "/nonexistent/schema.xsd"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success(), "missing schema should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("file not found"));
}

// ============================================================================
// Deps Command Tests
// ============================================================================

#[test]
fn test_cli_deps_chain() {
    let output = Command::new(xsd_model_bin())
        .args(["deps", "--type-name", "ReferenceBookType", library_xsd().as_str()])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("ReferenceBookType -> BookType -> ItemType"));
}

#[test]
fn test_cli_deps_cross_schema() {
    let output = Command::new(xsd_model_bin())
        .args(["deps", "--cross-schema", library_xsd().as_str()])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("pub:PublisherType"));
    assert!(!stdout.contains("tns:ISBNType"));
}

// ============================================================================
// Select Command Tests
// ============================================================================

#[test]
fn test_cli_select() {
    let base_dir = fixtures_dir().join("library").to_string_lossy().to_string();
    let output = Command::new(xsd_model_bin())
        .args([
            "select",
            "--base-dir",
            base_dir.as_str(),
            "--complex-type",
            "BookType",
            "library.xsd",
        ])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success(), "select should succeed");
    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(json["metadata"]["selected_components"], 5);
    assert_eq!(json["complex_types"]["ItemType"]["via_dependency"], true);
}
