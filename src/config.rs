//! Configuration management for the schema tools
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (jst.toml)
//! - Environment variables (JST__*)
//!
//! ## Example config file (jst.toml):
//! ```toml
//! [relocate]
//! exec_dir = "./schemas"
//! dest_dir = "./dist/schemas"
//! new_location = "https://example.com/schemas"
//!
//! [validate]
//! base = "./deploy"
//!
//! [generate]
//! output = "schema.md"
//! ```

use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::Result;
use crate::relocate::RelocationConfig;

/// Main configuration for the schema tools
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Relocation settings
    #[serde(default)]
    pub relocate: RelocateConfig,

    /// Validation settings
    #[serde(default)]
    pub validate: ValidateConfig,

    /// Markdown generation settings
    #[serde(default)]
    pub generate: GenerateConfig,
}

/// Relocation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelocateConfig {
    /// Directory input schemas are resolved against
    #[serde(default = "default_dir")]
    pub exec_dir: PathBuf,

    /// Directory relocated schemas are written under
    #[serde(default = "default_dest_dir")]
    pub dest_dir: PathBuf,

    /// Logical prefix of rewritten references
    #[serde(default)]
    pub new_location: String,
}

/// Validation configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidateConfig {
    /// Base directory of schema and data files
    #[serde(default)]
    pub base: Option<PathBuf>,
}

/// Markdown generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateConfig {
    /// Markdown output file
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

// Default value functions
fn default_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_dest_dir() -> PathBuf {
    PathBuf::from("relocated")
}

fn default_output() -> PathBuf {
    PathBuf::from("schema.md")
}

impl Default for RelocateConfig {
    fn default() -> Self {
        Self {
            exec_dir: default_dir(),
            dest_dir: default_dest_dir(),
            new_location: String::new(),
        }
    }
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
        }
    }
}

impl ToolConfig {
    /// Load configuration, layering an explicit file over the default locations
    pub fn load_from(config_path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_locations = ["jst.toml", ".jst.toml", "config/jst.toml"];
        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // XDG config directory
        let project_dirs = directories::ProjectDirs::from("dev", "jst", "json-schema-tools");
        if let Some(config_dir) = project_dirs {
            let xdg_config = config_dir.config_dir().join("jst.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // JST__RELOCATE__DEST_DIR=... and friends
        builder = builder.add_source(
            Environment::with_prefix("JST")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Immutable relocation settings, with directories made absolute
    pub fn relocation_config(&self) -> Result<RelocationConfig> {
        RelocationConfig::new(
            &self.relocate.exec_dir,
            &self.relocate.dest_dir,
            self.relocate.new_location.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchemaError;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = ToolConfig::default();
        assert_eq!(config.relocate.exec_dir, PathBuf::from("."));
        assert_eq!(config.relocate.dest_dir, PathBuf::from("relocated"));
        assert!(config.relocate.new_location.is_empty());
        assert!(config.validate.base.is_none());
        assert_eq!(config.generate.output, PathBuf::from("schema.md"));
    }

    #[test]
    fn test_serialize_config() {
        let config = ToolConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[relocate]"));
        assert!(toml_str.contains("[generate]"));
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "[relocate]\nexec_dir = \"/src\"\ndest_dir = \"/out\"\nnew_location = \"schemas\"\n",
        )
        .unwrap();

        let config = ToolConfig::load_from(Some(path.to_str().unwrap())).unwrap();
        let relocation = config.relocation_config().unwrap();

        assert_eq!(relocation.exec_dir(), std::path::Path::new("/src"));
        assert_eq!(relocation.dest_dir(), std::path::Path::new("/out"));
        assert_eq!(relocation.new_location(), "schemas");
    }

    #[test]
    fn test_save_round_trips_through_loader() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("saved.toml");
        let mut config = ToolConfig::default();
        config.relocate.new_location = "https://example.com/schemas".to_string();

        config.save(path.to_str().unwrap()).unwrap();
        let loaded = ToolConfig::load_from(Some(path.to_str().unwrap())).unwrap();

        assert_eq!(loaded.relocate.new_location, "https://example.com/schemas");
    }

    #[test]
    fn test_missing_explicit_file_is_a_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        let err = ToolConfig::load_from(Some(path.to_str().unwrap())).unwrap_err();

        assert!(matches!(err, SchemaError::Config(_)));
        assert!(err.is_fatal());
    }
}
