//! Data Validation
//!
//! Validates one or more JSON/YAML data files against a JSON Schema. When
//! several data files are given they are deep-merged in order first, so a
//! base document can be overlaid with environment-specific values.

use std::fs;
use std::path::{Path, PathBuf};

use jsonschema::JSONSchema;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::{Result, SchemaError};

/// Outcome of validating a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    /// One line per violation: `<instance path>: <message>`
    pub errors: Vec<String>,
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
        .unwrap_or(false)
}

/// Load a JSON document, or a YAML one for `.yaml` / `.yml` files.
pub fn load_document(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path).map_err(|source| SchemaError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    if is_yaml(path) {
        serde_yaml::from_str(&content).map_err(|source| SchemaError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    } else {
        serde_json::from_str(&content).map_err(|source| SchemaError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Load a schema document.
///
/// An object schema without `$id` is given the `file://` URL of its own
/// path, so relative `$ref`s resolve against the schema file.
pub fn load_schema(path: &Path) -> Result<Value> {
    let mut schema = load_document(path)?;
    if let Value::Object(map) = &mut schema {
        if !map.contains_key("$id") {
            let absolute = if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()?.join(path)
            };
            map.insert(
                "$id".to_string(),
                Value::String(format!("file://{}", absolute.display())),
            );
        }
    }
    Ok(schema)
}

/// Deep-merge `overlay` into `base`.
///
/// Objects merge key by key; any other value in `overlay` replaces the one
/// in `base`.
pub fn deep_merge(base: &mut Map<String, Value>, overlay: Map<String, Value>) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                deep_merge(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

/// Load and merge data files in order. A single file is returned unchanged.
pub fn merge_documents(paths: &[PathBuf]) -> Result<Value> {
    if let [single] = paths {
        return load_document(single);
    }

    let mut merged = Map::new();
    for path in paths {
        debug!(file = %path.display(), "merging data file");
        match load_document(path)? {
            Value::Object(map) => deep_merge(&mut merged, map),
            _ => {
                return Err(SchemaError::SchemaFormat {
                    file: path.clone(),
                    pointer: String::new(),
                    message: "only object documents can be merged".to_string(),
                })
            }
        }
    }
    Ok(Value::Object(merged))
}

/// JSON Schema validator
#[derive(Debug, Default, Clone, Copy)]
pub struct SchemaValidator;

impl SchemaValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate `instance` against `schema`.
    pub fn validate(&self, schema: &Value, instance: &Value) -> Result<ValidationReport> {
        let compiled = JSONSchema::compile(schema)
            .map_err(|e| SchemaError::InvalidSchema(e.to_string()))?;

        let errors: Vec<String> = match compiled.validate(instance) {
            Ok(()) => Vec::new(),
            Err(errors) => errors
                .map(|e| {
                    let path = e.instance_path.to_string();
                    if path.is_empty() {
                        e.to_string()
                    } else {
                        format!("{}: {}", path, e)
                    }
                })
                .collect(),
        };

        Ok(ValidationReport {
            valid: errors.is_empty(),
            errors,
        })
    }

    /// Validate data files against a schema file.
    ///
    /// Relative paths are taken from `base` when given.
    pub fn validate_files(
        &self,
        base: Option<&Path>,
        schema: &Path,
        data: &[PathBuf],
    ) -> Result<ValidationReport> {
        let locate = |path: &Path| match base {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        };

        let schema_path = locate(schema);
        let data: Vec<PathBuf> = data.iter().map(|p| locate(p)).collect();
        info!(schema = %schema_path.display(), files = data.len(), "Validating documents");

        let schema = load_schema(&schema_path)?;
        let instance = merge_documents(&data)?;
        self.validate(&schema, &instance)
    }
}
