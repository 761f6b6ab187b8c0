//! Serialization of OpenAPI documents to YAML or JSON.
//!
//! Also reads base documents back in and writes output files only when their
//! content actually changes, so that repeated runs leave timestamps alone.

use crate::openapi_builder::OpenApiDocument;
use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::path::Path;

/// Serializes an OpenAPI document to YAML format.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn serialize_yaml(doc: &OpenApiDocument) -> Result<String> {
    debug!("Serializing OpenAPI document to YAML");
    serde_yaml::to_string(doc).context("Failed to serialize OpenAPI document to YAML")
}

/// Serializes an OpenAPI document to JSON format with pretty printing.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn serialize_json(doc: &OpenApiDocument) -> Result<String> {
    debug!("Serializing OpenAPI document to JSON");
    serde_json::to_string_pretty(doc).context("Failed to serialize OpenAPI document to JSON")
}

/// Reads an OpenAPI document from a file.
///
/// Files ending in `.json` are read as JSON, everything else as YAML.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not an OpenAPI document.
pub fn load_document(path: &Path) -> Result<OpenApiDocument> {
    debug!("Loading OpenAPI document from {}", path.display());
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read OpenAPI document: {}", path.display()))?;

    let is_json = path
        .extension()
        .is_some_and(|extension| extension.eq_ignore_ascii_case("json"));
    let document = if is_json {
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid OpenAPI JSON document: {}", path.display()))?
    } else {
        serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid OpenAPI YAML document: {}", path.display()))?
    };
    Ok(document)
}

/// Writes string content to a file unless the file already holds exactly that
/// content.
///
/// Parent directories are created as needed.
///
/// # Returns
///
/// `true` when the file was written, `false` when it was left untouched.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written to.
pub fn write_if_changed(content: &str, path: &Path) -> Result<bool> {
    if let Ok(existing) = fs::read_to_string(path) {
        if existing == content {
            debug!("{} is up to date", path.display());
            return Ok(false);
        }
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(path, content)
        .with_context(|| format!("Failed to write to file: {}", path.display()))?;

    debug!("Wrote {} bytes to {}", content.len(), path.display());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openapi_builder::{Info, OpenApiBuilder, Operation};
    use crate::schema_generator::Schema;
    use tempfile::TempDir;

    /// Helper function to create a small OpenAPI document for testing
    fn create_test_document() -> OpenApiDocument {
        let mut builder = OpenApiBuilder::new();
        builder.add_tag("GreetingEndpoint", "com.example.GreetingEndpoint");
        let mut operation = Operation::new("GreetingEndpoint", "greet").with_request_body();
        operation.add_request_property("name", Schema::typed("string"));
        operation.set_response(Schema::typed("string"));
        builder.add_operation("GreetingEndpoint", "greet", operation);

        let mut doc = builder.build();
        doc.info = Info {
            title: "Test API".to_string(),
            version: "1.0.0".to_string(),
            description: Some("A test API".to_string()),
        };
        doc
    }

    #[test]
    fn test_serialize_yaml() {
        let yaml = serialize_yaml(&create_test_document()).unwrap();

        assert!(yaml.contains("openapi: 3.0.1"));
        assert!(yaml.contains("title: Test API"));
        assert!(yaml.contains("/GreetingEndpoint/greet:"));
        assert!(yaml.contains("operationId: GreetingEndpoint_greet_POST"));
    }

    #[test]
    fn test_serialize_json_pretty_format() {
        let json = serialize_json(&create_test_document()).unwrap();

        assert!(json.lines().count() > 5, "Pretty printed JSON should have multiple lines");
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["openapi"], "3.0.1");
        assert_eq!(parsed["info"]["title"], "Test API");
        assert!(parsed["paths"]["/GreetingEndpoint/greet"]["post"].is_object());
    }

    #[test]
    fn test_serialization_is_stable() {
        let first = serialize_yaml(&create_test_document()).unwrap();
        let second = serialize_yaml(&create_test_document()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_load_document_yaml_and_json() {
        let temp_dir = TempDir::new().unwrap();
        let doc = create_test_document();

        let yaml_path = temp_dir.path().join("base.yaml");
        fs::write(&yaml_path, serialize_yaml(&doc).unwrap()).unwrap();
        assert_eq!(load_document(&yaml_path).unwrap(), doc);

        let json_path = temp_dir.path().join("base.json");
        fs::write(&json_path, serialize_json(&doc).unwrap()).unwrap();
        assert_eq!(load_document(&json_path).unwrap(), doc);
    }

    #[test]
    fn test_load_document_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = load_document(&temp_dir.path().join("missing.yaml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_write_if_changed_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("subdir").join("nested").join("openapi.yaml");

        assert!(write_if_changed("content", &file_path).unwrap());
        assert_eq!(fs::read_to_string(&file_path).unwrap(), "content");
    }

    #[test]
    fn test_write_if_changed_skips_identical_content() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("openapi.yaml");

        assert!(write_if_changed("first", &file_path).unwrap());
        assert!(!write_if_changed("first", &file_path).unwrap());
        assert!(write_if_changed("second", &file_path).unwrap());
        assert_eq!(fs::read_to_string(&file_path).unwrap(), "second");
    }
}
