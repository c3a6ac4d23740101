//! Error types for the schema tools

use std::path::PathBuf;
use thiserror::Error;

/// Result type for schema tool operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Schema tool errors
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Cannot resolve location {location}: {reason}")]
    PathResolution { location: String, reason: String },

    #[error("Invalid schema format in {file} at {pointer}: {message}")]
    SchemaFormat {
        file: PathBuf,
        pointer: String,
        message: String,
    },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Refusing to write {path}: outside of destination root {root}")]
    Containment { path: PathBuf, root: PathBuf },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON schema: {0}")]
    InvalidSchema(String),

    #[error("YAML error in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),
}

impl SchemaError {
    /// Whether the error must abort a relocation run.
    ///
    /// Resolution and format errors are scoped to a single `$ref` and are
    /// logged and skipped; everything else terminates the run.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            SchemaError::PathResolution { .. } | SchemaError::SchemaFormat { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_errors_are_recoverable() {
        let err = SchemaError::PathResolution {
            location: "file://a.json".to_string(),
            reason: "different roots".to_string(),
        };
        assert!(!err.is_fatal());

        let err = SchemaError::SchemaFormat {
            file: PathBuf::from("/src/a.json"),
            pointer: "/properties/b/$ref".to_string(),
            message: "expected a string".to_string(),
        };
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_containment_is_fatal() {
        let err = SchemaError::Containment {
            path: PathBuf::from("/etc/passwd"),
            root: PathBuf::from("/out"),
        };
        assert!(err.is_fatal());
        assert!(err.to_string().contains("/out"));
    }
}
