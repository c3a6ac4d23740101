//! JSON Schema Tools
//!
//! Developer tooling around JSON Schema documents.
//!
//! ## Features
//!
//! - **Relocation**: Copies a schema and every `file://` schema it references
//!   into a new directory tree, rewriting each `$ref` so it resolves from the
//!   new location
//! - **Validation**: Validates merged JSON/YAML data files against a schema
//! - **Documentation**: Renders a schema as Markdown
//!
//! ## Relocation layout
//!
//! ```text
//! exec_dir/                      dest_dir/
//! ├── a.json                     ├── a.json      $ref: "schemas/sub/b.json#/X"
//! └── sub/                  =>   └── sub/
//!     └── b.json                     └── b.json
//! ```

pub mod config;
pub mod error;
pub mod markdown;
pub mod relocate;
pub mod validate;

pub use config::ToolConfig;
pub use error::{Result, SchemaError};
pub use markdown::{generate_markdown, generate_markdown_file};
pub use relocate::{RelocationConfig, RelocationReport, Relocator, UnresolvedRef};
pub use validate::{SchemaValidator, ValidationReport};
