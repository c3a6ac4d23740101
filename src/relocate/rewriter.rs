//! Reference Rewriting
//!
//! Walks the reference-bearing shapes of one schema document and replaces
//! each `file://` reference with its relocated form. Two shapes are
//! rewritten, at the top level and inside every definition:
//!
//! - `properties.<name>.$ref`
//! - `allOf[<n>].$ref`
//!
//! `oneOf`, `anyOf`, `not` and `patternProperties` are left untouched.
//!
//! A referenced file is relocated (recursively) before the reference that
//! points at it is replaced, so by the time a document is encoded all of its
//! descendants are already on disk.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::resolver::{PathResolver, ReferenceParts};
use super::{Relocator, UnresolvedRef, VisitContext};
use crate::error::{Result, SchemaError};

/// Key of the definitions block: `$def` when present, `definitions` otherwise
pub fn definitions_key(document: &Map<String, Value>) -> &'static str {
    if document.contains_key("$def") {
        "$def"
    } else {
        "definitions"
    }
}

/// Escape a key for use as a JSON pointer token
fn pointer_token(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}

impl Relocator {
    /// Rewrite `document` in place and encode it as pretty-printed JSON.
    pub(super) fn visit(
        &mut self,
        document: &mut Map<String, Value>,
        context: &VisitContext,
    ) -> Result<Vec<u8>> {
        self.rewrite_definition(document, "", context)?;

        let key = definitions_key(document);
        if let Some(definitions) = document.get_mut(key) {
            let pointer = format!("/{}", pointer_token(key));
            match definitions {
                Value::Object(definitions) => {
                    for (name, definition) in definitions.iter_mut() {
                        debug!(definition = %name, "processing definition");
                        let pointer = format!("{}/{}", pointer, pointer_token(name));
                        match definition {
                            Value::Object(definition) => {
                                self.rewrite_definition(definition, &pointer, context)?
                            }
                            _ => self.skip_format(context, pointer, "definition is not an object"),
                        }
                    }
                }
                _ => self.skip_format(context, pointer, "definitions block is not an object"),
            }
        }

        let mut bytes = serde_json::to_vec_pretty(document)?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    /// Rewrite `properties.*.$ref` and `allOf[].$ref` of one schema object.
    fn rewrite_definition(
        &mut self,
        definition: &mut Map<String, Value>,
        pointer: &str,
        context: &VisitContext,
    ) -> Result<()> {
        if let Some(properties) = definition.get_mut("properties") {
            let base = format!("{}/properties", pointer);
            match properties {
                Value::Object(properties) => {
                    for (key, property) in properties.iter_mut() {
                        debug!(key = %key, "processing key");
                        let site = format!("{}/{}", base, pointer_token(key));
                        self.rewrite_site(property, &site, context)?;
                    }
                }
                _ => self.skip_format(context, base, "properties is not an object"),
            }
        }

        if let Some(all_of) = definition.get_mut("allOf") {
            let base = format!("{}/allOf", pointer);
            match all_of {
                Value::Array(items) => {
                    for (index, item) in items.iter_mut().enumerate() {
                        self.rewrite_site(item, &format!("{}/{}", base, index), context)?;
                    }
                }
                _ => self.skip_format(context, base, "allOf is not an array"),
            }
        }

        Ok(())
    }

    /// Rewrite the `$ref` of a single subschema, if it carries one.
    ///
    /// Boolean subschemas and objects without `$ref` are left alone.
    fn rewrite_site(
        &mut self,
        node: &mut Value,
        pointer: &str,
        context: &VisitContext,
    ) -> Result<()> {
        let Value::Object(node) = node else {
            return Ok(());
        };

        match node.get_mut("$ref") {
            None => Ok(()),
            Some(Value::String(reference)) => {
                if let Some(rewritten) = self.resolve_ref(reference, context)? {
                    *reference = rewritten;
                }
                Ok(())
            }
            Some(_) => {
                self.skip_format(context, format!("{}/$ref", pointer), "$ref is not a string");
                Ok(())
            }
        }
    }

    /// Resolve one reference, relocating its target the first time it is seen.
    ///
    /// Returns `None` when the reference is not file-scheme or cannot be
    /// resolved; the latter is logged and recorded in the run report.
    fn resolve_ref(&mut self, reference: &str, context: &VisitContext) -> Result<Option<String>> {
        let Some(parts) = ReferenceParts::parse(reference) else {
            return Ok(None);
        };

        let resolution = PathResolver::new(&self.config).resolve_location(parts.location, context);
        let resolved = match resolution {
            Ok(resolved) => resolved,
            Err(err) if !err.is_fatal() => {
                self.skip_reference(context, reference, &err);
                return Ok(None);
            }
            Err(err) => return Err(err),
        };

        if self.catalog.claim(&resolved.source) {
            self.relocate_file(&resolved.source)?;
        } else {
            debug!(source = %resolved.source.display(), "already relocated");
        }

        Ok(Some(parts.with_location(&resolved.new_reference)))
    }

    fn skip_reference(&mut self, context: &VisitContext, reference: &str, err: &SchemaError) {
        warn!(
            file = %context.file().display(),
            reference = %reference,
            error = %err,
            "Fail to resolve ref, leaving it unchanged"
        );
        self.report.unresolved.push(UnresolvedRef {
            file: context.file().to_path_buf(),
            reference: reference.to_string(),
            reason: err.to_string(),
        });
    }

    fn skip_format(&mut self, context: &VisitContext, pointer: String, message: &str) {
        let err = SchemaError::SchemaFormat {
            file: context.file().to_path_buf(),
            pointer: pointer.clone(),
            message: message.to_string(),
        };
        warn!(error = %err, "Skipping malformed schema node");
        self.report.unresolved.push(UnresolvedRef {
            file: context.file().to_path_buf(),
            reference: pointer,
            reason: err.to_string(),
        });
    }
}
