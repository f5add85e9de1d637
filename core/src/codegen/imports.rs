//! Per-file import manifests.

use std::collections::BTreeSet;

/// A sorted, de-duplicated set of `use` paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportManifest {
    paths: BTreeSet<String>,
}

impl ImportManifest {
    /// Creates an empty manifest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a path (without `use` and `;`).
    pub fn insert(&mut self, path: impl Into<String>) {
        self.paths.insert(path.into());
    }

    /// True when the path is present.
    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    /// Number of imports.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// True when nothing is imported.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Renders one `use` line per path.
    pub fn render(&self) -> String {
        let mut code = String::new();
        for path in &self.paths {
            code.push_str("use ");
            code.push_str(path);
            code.push_str(";\n");
        }
        code
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_is_sorted_and_unique() {
        let mut manifest = ImportManifest::new();
        manifest.insert("crate::keys");
        manifest.insert("crate::Client");
        manifest.insert("crate::keys");
        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.render(), "use crate::Client;\nuse crate::keys;\n");
    }
}
