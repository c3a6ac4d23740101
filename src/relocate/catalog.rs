//! Visited-file catalog
//!
//! Records every source file claimed for relocation during a run. A path is
//! claimed before its relocation starts, so a reference cycle finds the file
//! already claimed on its second encounter and stops there.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Set of absolute source paths already scheduled for relocation
#[derive(Debug, Default, Clone)]
pub struct Catalog {
    claimed: HashSet<PathBuf>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `path` if nobody has yet. Returns `false` when it was already claimed.
    pub fn claim(&mut self, path: &Path) -> bool {
        self.claimed.insert(path.to_path_buf())
    }

    pub fn len(&self) -> usize {
        self.claimed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_once() {
        let mut catalog = Catalog::new();
        let path = Path::new("/src/a.json");

        assert!(catalog.claim(path));
        assert!(!catalog.claim(path));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_distinct_paths() {
        let mut catalog = Catalog::new();
        assert!(catalog.is_empty());

        catalog.claim(Path::new("/src/a.json"));
        catalog.claim(Path::new("/src/sub/a.json"));

        assert_eq!(catalog.len(), 2);
        assert!(catalog.claim(Path::new("/src/b.json")));
    }
}
