//! Path Resolution
//!
//! Maps a `file://` reference found in a schema to three things: the source
//! file it names, where that file lands inside the destination tree, and the
//! reference string that reaches it from the referencing file's new position.
//!
//! Two bases are in play at once. The destination mirrors the source tree
//! shape (anchored at `exec_dir` / `dest_dir`), while the rewritten reference
//! is anchored at the directory of the referencing file.

use std::path::{Component, Path, PathBuf};

use super::{RelocationConfig, VisitContext};
use crate::error::{Result, SchemaError};

/// Scheme prefix of relocatable references
pub const FILE_SCHEME: &str = "file://";

/// A `file://` reference split at its fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceParts<'a> {
    /// Everything before `#`, scheme included
    pub location: &'a str,
    /// JSON pointer after `#`, passed through verbatim
    pub resource: Option<&'a str>,
}

impl<'a> ReferenceParts<'a> {
    /// Split a reference. Returns `None` for anything that is not file-scheme
    /// (local `#/...` pointers, `http(s)://` URLs).
    pub fn parse(reference: &'a str) -> Option<Self> {
        if !reference.starts_with(FILE_SCHEME) {
            return None;
        }

        let (location, resource) = match reference.split_once('#') {
            Some((location, resource)) => (location, Some(resource)),
            None => (reference, None),
        };

        Some(Self { location, resource })
    }

    /// Rebuild the reference around a new location, keeping the fragment.
    pub fn with_location(&self, location: &str) -> String {
        match self.resource {
            Some(resource) => format!("{}#{}", location, resource),
            None => location.to_string(),
        }
    }
}

/// Output of [`PathResolver::resolve_location`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLocation {
    /// Absolute path of the referenced file
    pub source: PathBuf,
    /// Location part of the rewritten reference (no fragment)
    pub new_reference: String,
    /// Absolute path the file is written to
    pub destination: PathBuf,
}

/// Resolves reference locations against a relocation configuration
pub struct PathResolver<'a> {
    config: &'a RelocationConfig,
}

impl<'a> PathResolver<'a> {
    pub fn new(config: &'a RelocationConfig) -> Self {
        Self { config }
    }

    /// Resolve `location` as seen from the file held by `context`.
    pub fn resolve_location(
        &self,
        location: &str,
        context: &VisitContext,
    ) -> Result<ResolvedLocation> {
        let path = location.strip_prefix(FILE_SCHEME).unwrap_or(location);
        if path.is_empty() {
            return Err(SchemaError::PathResolution {
                location: location.to_string(),
                reason: "empty path".to_string(),
            });
        }

        let source = self.source_path(Path::new(path));
        let destination = self.destination_for(&source)?;

        let current_dir = context.file().parent().ok_or_else(|| SchemaError::PathResolution {
            location: location.to_string(),
            reason: format!("{} has no parent directory", context.file().display()),
        })?;
        let hop = relative_path(current_dir, &source).map_err(|reason| {
            SchemaError::PathResolution {
                location: location.to_string(),
                reason,
            }
        })?;

        Ok(ResolvedLocation {
            source,
            new_reference: join_reference(self.config.new_location(), &hop),
            destination,
        })
    }

    /// Absolute, normalized source path. Relative paths are taken from `exec_dir`.
    pub fn source_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            normalize_path(path)
        } else {
            normalize_path(&self.config.exec_dir().join(path))
        }
    }

    /// Destination of `source`: its position under `exec_dir`, replayed under `dest_dir`.
    pub fn destination_for(&self, source: &Path) -> Result<PathBuf> {
        let exec_relative = relative_path(self.config.exec_dir(), source).map_err(|reason| {
            SchemaError::PathResolution {
                location: source.display().to_string(),
                reason,
            }
        })?;
        Ok(normalize_path(&self.config.dest_dir().join(exec_relative)))
    }
}

/// Lexically normalize a path: drop `.` and fold `..` into its parent.
///
/// `..` never climbs above the root of an absolute path; leading `..` of a
/// relative path are kept.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    let mut depth = 0usize;

    for component in path.components() {
        match component {
            Component::Prefix(prefix) => out.push(prefix.as_os_str()),
            Component::RootDir => out.push(Component::RootDir.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                if depth > 0 {
                    out.pop();
                    depth -= 1;
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            Component::Normal(part) => {
                out.push(part);
                depth += 1;
            }
        }
    }

    out
}

/// Path of `target` relative to `base`, both absolute.
///
/// Fails when either path is relative or the two live under different roots
/// (e.g. distinct drive prefixes).
pub fn relative_path(base: &Path, target: &Path) -> std::result::Result<PathBuf, String> {
    if !base.is_absolute() || !target.is_absolute() {
        return Err(format!(
            "cannot make {} relative to {}",
            target.display(),
            base.display()
        ));
    }

    let base = normalize_path(base);
    let target = normalize_path(target);
    let base_parts: Vec<Component> = base.components().collect();
    let target_parts: Vec<Component> = target.components().collect();

    let anchor = |parts: &[Component]| {
        parts
            .iter()
            .take_while(|c| matches!(c, Component::Prefix(_) | Component::RootDir))
            .count()
    };
    if base_parts[..anchor(&base_parts)] != target_parts[..anchor(&target_parts)] {
        return Err(format!(
            "{} and {} are on different roots",
            target.display(),
            base.display()
        ));
    }

    let common = base_parts
        .iter()
        .zip(target_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..base_parts.len() {
        relative.push("..");
    }
    for part in &target_parts[common..] {
        relative.push(part.as_os_str());
    }
    if relative.as_os_str().is_empty() {
        relative.push(".");
    }

    Ok(relative)
}

/// Join a relative hop onto the logical `prefix` of rewritten references.
///
/// Segments are always `/`-separated. A `..` in the hop consumes a trailing
/// segment of the prefix but never the `scheme://host` part of a URL.
pub fn join_reference(prefix: &str, hop: &Path) -> String {
    let (authority, base) = match prefix.find("://") {
        Some(idx) => {
            let host_start = idx + 3;
            let path_start = prefix[host_start..]
                .find('/')
                .map(|i| host_start + i)
                .unwrap_or(prefix.len());
            prefix.split_at(path_start)
        }
        None => ("", prefix),
    };
    let anchored = !authority.is_empty() || base.starts_with('/');

    let mut segments: Vec<String> = base
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .map(str::to_string)
        .collect();

    for component in hop.components() {
        match component {
            Component::Normal(part) => segments.push(part.to_string_lossy().into_owned()),
            Component::ParentDir => match segments.last() {
                Some(last) if last != ".." => {
                    segments.pop();
                }
                _ if anchored => {}
                _ => segments.push("..".to_string()),
            },
            _ => {}
        }
    }

    let body = segments.join("/");
    if !authority.is_empty() {
        format!("{}/{}", authority, body)
    } else if anchored {
        format!("/{}", body)
    } else {
        body
    }
}
