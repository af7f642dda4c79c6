//! Transitive CSS and asset collection over the compiled chunk graph

use crate::models::OutputBundle;
use indexmap::IndexSet;
use std::collections::HashSet;

/// Files reachable from a chunk through its import graph
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkDependencies {
    pub css: IndexSet<String>,
    pub assets: IndexSet<String>,
}

impl ChunkDependencies {
    pub fn is_empty(&self) -> bool {
        self.css.is_empty() && self.assets.is_empty()
    }

    /// CSS files first, then other assets
    pub fn into_resources(self) -> Vec<String> {
        self.css.into_iter().chain(self.assets).collect()
    }
}

/// Depth-first walk over static and dynamic imports.
///
/// The visited set lives only as long as one `collect` call, so separate entries never
/// see each other's traversal state.
pub struct DependencyWalker<'b> {
    bundle: &'b OutputBundle,
    visited: HashSet<&'b str>,
    found: ChunkDependencies,
}

impl<'b> DependencyWalker<'b> {
    /// Collect everything `chunk_id` pulls in. Imported chunks count as assets
    /// themselves; the root only does when `include_root` is set.
    pub fn collect(bundle: &'b OutputBundle, chunk_id: &str, include_root: bool) -> ChunkDependencies {
        let mut walker = Self {
            bundle,
            visited: HashSet::new(),
            found: ChunkDependencies::default(),
        };
        walker.visit(chunk_id, include_root);
        walker.found
    }

    fn visit(&mut self, chunk_id: &str, is_asset: bool) {
        let bundle = self.bundle;
        let Some(chunk) = bundle.chunk(chunk_id) else {
            return;
        };
        if !self.visited.insert(chunk.file_name.as_str()) {
            return;
        }

        if is_asset {
            self.found.assets.insert(chunk.file_name.clone());
        }
        self.found.css.extend(chunk.metadata.imported_css.iter().cloned());
        self.found.assets.extend(chunk.metadata.imported_assets.iter().cloned());

        for import in chunk.imports.iter().chain(&chunk.dynamic_imports) {
            self.visit(import, true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChunkMetadata, OutputChunk};
    use pretty_assertions::assert_eq;

    fn chunk(file_name: &str, imports: &[&str], css: &[&str], assets: &[&str]) -> OutputChunk {
        OutputChunk {
            imports: imports.iter().map(|s| s.to_string()).collect(),
            metadata: ChunkMetadata {
                imported_css: css.iter().map(|s| s.to_string()).collect(),
                imported_assets: assets.iter().map(|s| s.to_string()).collect(),
            },
            ..OutputChunk::new(file_name)
        }
    }

    fn set(items: &[&str]) -> IndexSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_cycle_terminates_and_counts_once() {
        let mut bundle = OutputBundle::new();
        bundle.insert_chunk(chunk("a.js", &["b.js"], &["a.css"], &["a.png"]));
        bundle.insert_chunk(chunk("b.js", &["a.js"], &["b.css"], &[]));

        let deps = DependencyWalker::collect(&bundle, "a.js", false);
        assert_eq!(deps.css, set(&["a.css", "b.css"]));
        assert_eq!(deps.assets, set(&["a.png", "b.js"]));
    }

    #[test]
    fn test_root_included_on_request() {
        let mut bundle = OutputBundle::new();
        bundle.insert_chunk(chunk("main.js", &[], &["main.css"], &[]));

        let without = DependencyWalker::collect(&bundle, "main.js", false);
        assert!(without.assets.is_empty());

        let with = DependencyWalker::collect(&bundle, "main.js", true);
        assert_eq!(with.assets, set(&["main.js"]));
    }

    #[test]
    fn test_dynamic_imports_are_followed() {
        let mut bundle = OutputBundle::new();
        let mut root = chunk("root.js", &[], &[], &[]);
        root.dynamic_imports = vec!["lazy.js".to_string()];
        bundle.insert_chunk(root);
        bundle.insert_chunk(chunk("lazy.js", &[], &["lazy.css"], &["font.woff2"]));

        let deps = DependencyWalker::collect(&bundle, "root.js", false);
        assert_eq!(deps.into_resources(), vec!["lazy.css", "lazy.js", "font.woff2"]);
    }

    #[test]
    fn test_walks_do_not_share_state() {
        let mut bundle = OutputBundle::new();
        bundle.insert_chunk(chunk("one.js", &["shared.js"], &[], &[]));
        bundle.insert_chunk(chunk("two.js", &["shared.js"], &[], &[]));
        bundle.insert_chunk(chunk("shared.js", &[], &["shared.css"], &[]));

        let first = DependencyWalker::collect(&bundle, "one.js", false);
        let second = DependencyWalker::collect(&bundle, "two.js", false);
        assert_eq!(first, second);
        assert_eq!(second.css, set(&["shared.css"]));
    }

    #[test]
    fn test_unknown_ids_are_ignored() {
        let mut bundle = OutputBundle::new();
        bundle.insert_chunk(chunk("main.js", &["external"], &[], &[]));

        let deps = DependencyWalker::collect(&bundle, "main.js", false);
        assert!(deps.is_empty());
        assert!(DependencyWalker::collect(&bundle, "missing.js", true).is_empty());
    }
}
