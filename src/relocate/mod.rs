//! Schema Relocation
//!
//! Copies a root schema and every schema it reaches through `file://`
//! references into a destination tree, rewriting each reference so it
//! resolves from its new position.
//!
//! The traversal is depth-first and synchronous. Each file is relocated at
//! most once per run; the [`Catalog`] is claimed before a file is processed,
//! which is what stops reference cycles. Nothing is ever written outside of
//! the destination root.
//!
//! ```no_run
//! use json_schema_tools::{RelocationConfig, Relocator};
//!
//! let config = RelocationConfig::new("/src", "/out", "schemas")?;
//! let report = Relocator::new(config).relocate("a.json")?;
//! println!("{} files written", report.written.len());
//! # Ok::<(), json_schema_tools::SchemaError>(())
//! ```

pub mod catalog;
pub mod materialize;
pub mod resolver;
pub mod rewriter;

pub use catalog::Catalog;
pub use materialize::{ensure_contained, materialize};
pub use resolver::{PathResolver, ReferenceParts, ResolvedLocation};

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::error::{Result, SchemaError};
use resolver::normalize_path;

/// Immutable settings of a relocation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelocationConfig {
    exec_dir: PathBuf,
    dest_dir: PathBuf,
    new_location: String,
}

impl RelocationConfig {
    /// Build a configuration. Relative directories are taken from the
    /// current working directory; both are normalized.
    pub fn new(
        exec_dir: impl AsRef<Path>,
        dest_dir: impl AsRef<Path>,
        new_location: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            exec_dir: absolute(exec_dir.as_ref())?,
            dest_dir: absolute(dest_dir.as_ref())?,
            new_location: new_location.into(),
        })
    }

    /// Root that input paths are resolved against
    pub fn exec_dir(&self) -> &Path {
        &self.exec_dir
    }

    /// Root that every output file must be written under
    pub fn dest_dir(&self) -> &Path {
        &self.dest_dir
    }

    /// Logical prefix of rewritten references
    pub fn new_location(&self) -> &str {
        &self.new_location
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(normalize_path(path))
    } else {
        Ok(normalize_path(&std::env::current_dir()?.join(path)))
    }
}

/// The file a traversal is currently inside of
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitContext {
    file: PathBuf,
}

impl VisitContext {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self { file: file.into() }
    }

    /// Absolute path of the file being visited
    pub fn file(&self) -> &Path {
        &self.file
    }
}

/// A reference or schema node the run had to leave unchanged
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedRef {
    /// File the reference was found in
    pub file: PathBuf,
    /// The offending `$ref` value, or the JSON pointer of a malformed node
    pub reference: String,
    pub reason: String,
}

/// Outcome of a relocation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RelocationReport {
    /// Destination files, in the order they were written
    pub written: Vec<PathBuf>,
    pub unresolved: Vec<UnresolvedRef>,
}

/// Relocates one root schema and everything it references.
///
/// A relocator serves a single run: [`Relocator::relocate`] consumes it.
#[derive(Debug)]
pub struct Relocator {
    config: RelocationConfig,
    catalog: Catalog,
    report: RelocationReport,
}

impl Relocator {
    pub fn new(config: RelocationConfig) -> Self {
        Self {
            config,
            catalog: Catalog::new(),
            report: RelocationReport::default(),
        }
    }

    /// Relocate `file` (absolute, or relative to `exec_dir`).
    ///
    /// Files written before a fatal error are left in place.
    pub fn relocate(mut self, file: impl AsRef<Path>) -> Result<RelocationReport> {
        let source = PathResolver::new(&self.config).source_path(file.as_ref());
        info!(
            file = %source.display(),
            exec_dir = %self.config.exec_dir.display(),
            dest_dir = %self.config.dest_dir.display(),
            "Relocating schema"
        );

        self.catalog.claim(&source);
        self.relocate_file(&source)?;

        info!(
            claimed = self.catalog.len(),
            written = self.report.written.len(),
            unresolved = self.report.unresolved.len(),
            "Relocation complete"
        );
        Ok(self.report)
    }

    /// Read, rewrite and write one file. The caller has already claimed it.
    fn relocate_file(&mut self, source: &Path) -> Result<()> {
        info!(file = %source.display(), "Relocating file");

        let raw = fs::read(source).map_err(|err| SchemaError::Read {
            path: source.to_path_buf(),
            source: err,
        })?;
        let parsed: Value = serde_json::from_slice(&raw).map_err(|err| SchemaError::Parse {
            path: source.to_path_buf(),
            source: err,
        })?;
        let Value::Object(mut document) = parsed else {
            return Err(SchemaError::Parse {
                path: source.to_path_buf(),
                source: <serde_json::Error as serde::de::Error>::custom(
                    "schema document must be a JSON object",
                ),
            });
        };

        let context = VisitContext::new(source);
        let bytes = self.visit(&mut document, &context)?;

        let destination = PathResolver::new(&self.config).destination_for(source)?;
        materialize(&destination, &bytes, &self.config.dest_dir)?;

        self.report.written.push(destination);
        Ok(())
    }
}
