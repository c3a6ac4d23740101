//! Validation and Documentation Tests
//!
//! Runs the validator and the Markdown generator over the fixture schemas.

use std::path::{Path, PathBuf};

use json_schema_tools::validate::merge_documents;
use json_schema_tools::{generate_markdown, generate_markdown_file, SchemaValidator};
use serde_json::json;
use tempfile::tempdir;

fn fixtures_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

// =============================================================================
// Validation
// =============================================================================

#[test]
fn test_overlay_merge_order() {
    let server = fixtures_path().join("server");
    let merged =
        merge_documents(&[server.join("base.yaml"), server.join("production.json")]).unwrap();

    assert_eq!(
        merged,
        json!({
            "name": "billing",
            "port": 8080,
            "mode": "release",
            "tls": { "enabled": true, "certificate": "/etc/tls/billing.pem" }
        })
    );
}

#[test]
fn test_merged_documents_are_valid() {
    let report = SchemaValidator::new()
        .validate_files(
            Some(&fixtures_path()),
            Path::new("server/server.schema.json"),
            &[PathBuf::from("server/base.yaml"), PathBuf::from("server/production.json")],
        )
        .unwrap();

    assert!(report.valid, "unexpected errors: {:?}", report.errors);
}

#[test]
fn test_invalid_document_lists_every_violation() {
    let report = SchemaValidator::new()
        .validate_files(
            Some(&fixtures_path()),
            Path::new("server/server.schema.json"),
            &[PathBuf::from("server/broken.yaml")],
        )
        .unwrap();

    assert!(!report.valid);
    assert_eq!(report.errors.len(), 2);
    assert!(report.errors.iter().any(|e| e.starts_with("/port: ")));
    assert!(report.errors.iter().any(|e| e.starts_with("/mode: ")));
}

#[test]
fn test_missing_data_file_is_an_error() {
    let result = SchemaValidator::new().validate_files(
        Some(&fixtures_path()),
        Path::new("server/server.schema.json"),
        &[PathBuf::from("server/absent.yaml")],
    );

    assert!(result.is_err());
}

// =============================================================================
// Markdown
// =============================================================================

#[test]
fn test_fixture_markdown() {
    let content =
        std::fs::read_to_string(fixtures_path().join("server/server.schema.json")).unwrap();
    let schema: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(&content).unwrap();

    let markdown = generate_markdown(&schema, "server.schema.json");

    assert!(markdown.starts_with("# server.schema.json\n\n---\n\n# Server"));
    assert!(markdown.contains("Deployment settings of an API server"));
    assert!(markdown.contains("## `name` (string, required) eg: `billing`"));
    assert!(markdown.contains("## `port` (integer, required)"));
    assert!(markdown.contains("* Minimum : `1`\n* Maximum : `65535`"));
    assert!(markdown.contains("## `mode` (string, enum)"));
    assert!(markdown.contains("* `debug`\n* `release`"));
    assert!(markdown.contains("## `tls` (Tls)"));
    assert!(markdown.contains("# Sub Schemas"));
    assert!(markdown.contains("## `Tls` (object)"));
    assert!(markdown.contains("|enabled|boolean|false|"));
}

#[test]
fn test_markdown_file_is_written() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("server.md");

    generate_markdown_file(&fixtures_path().join("server/server.schema.json"), &output).unwrap();

    let markdown = std::fs::read_to_string(&output).unwrap();
    assert!(markdown.starts_with("# server.schema.json"));
    assert!(markdown.contains("## `Tls` (object)"));
}
