//! File materialization
//!
//! Writes relocated documents to disk. Every write is checked against the
//! destination root first; a destination outside of it aborts the run.

use std::fs;
use std::path::Path;

use tracing::info;

use super::resolver::normalize_path;
use crate::error::{Result, SchemaError};

/// Fail unless `destination` is strictly below `root`.
///
/// Both paths are normalized lexically and compared component by component,
/// so `/out2/a.json` is not inside `/out`.
pub fn ensure_contained(destination: &Path, root: &Path) -> Result<()> {
    let destination = normalize_path(destination);
    let root = normalize_path(root);

    let contained = destination.is_absolute()
        && root.is_absolute()
        && destination != root
        && destination.starts_with(&root);

    if !contained {
        return Err(SchemaError::Containment {
            path: destination,
            root,
        });
    }

    Ok(())
}

/// Write `bytes` to `destination`, creating parent directories as needed.
pub fn materialize(destination: &Path, bytes: &[u8], root: &Path) -> Result<()> {
    ensure_contained(destination, root)?;

    if let Some(parent) = destination.parent() {
        // create_dir_all succeeds when the directory already exists
        fs::create_dir_all(parent).map_err(|source| SchemaError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    fs::write(destination, bytes).map_err(|source| SchemaError::Write {
        path: destination.to_path_buf(),
        source,
    })?;

    info!(path = %destination.display(), bytes = bytes.len(), "Wrote relocated schema");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_contained_paths() {
        let root = Path::new("/out");
        assert!(ensure_contained(Path::new("/out/a.json"), root).is_ok());
        assert!(ensure_contained(Path::new("/out/sub/../b.json"), root).is_ok());
    }

    #[test]
    fn test_escaping_paths() {
        let root = Path::new("/out");
        for path in ["/etc/passwd", "/out/../etc/passwd", "/out2/a.json", "/out", "out/a.json"] {
            let err = ensure_contained(Path::new(path), root).unwrap_err();
            assert!(matches!(err, SchemaError::Containment { .. }), "{path} should be rejected");
        }
    }

    #[test]
    fn test_materialize_creates_parents() {
        let dir = tempdir().unwrap();
        let destination = dir.path().join("nested/deeper/a.json");

        materialize(&destination, b"{}\n", dir.path()).unwrap();

        assert_eq!(fs::read_to_string(&destination).unwrap(), "{}\n");
    }

    #[test]
    fn test_materialize_refuses_outside_root() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("out");
        let destination = dir.path().join("elsewhere/a.json");

        let err = materialize(&destination, b"{}", &root).unwrap_err();

        assert!(matches!(err, SchemaError::Containment { .. }));
        assert!(!destination.exists());
        assert!(!dir.path().join("elsewhere").exists());
    }
}
