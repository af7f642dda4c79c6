//! In-memory source files that exist only for the duration of a build session

use crate::utils::helpers::normalize_path;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Synthesized sources keyed by normalized file name.
///
/// One store belongs to one build session; the manifest parser registers pages it
/// synthesizes, and the plugin adapter and dev builder resolve them.
#[derive(Debug, Default)]
pub struct VirtualModules {
    modules: RwLock<HashMap<String, String>>,
}

impl VirtualModules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: &str, source: impl Into<String>) {
        self.modules
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(normalize_path(id), source.into());
    }

    pub fn get(&self, id: &str) -> Option<String> {
        self.modules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&normalize_path(id))
            .cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.modules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&normalize_path(id))
    }

    pub fn len(&self) -> usize {
        self.modules.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_normalized() {
        let modules = VirtualModules::new();
        modules.insert("./background.html", "<html></html>");

        assert!(modules.contains("background.html"));
        assert_eq!(modules.get("/background.html").as_deref(), Some("<html></html>"));
        assert_eq!(modules.len(), 1);
    }

    #[test]
    fn test_sessions_are_isolated() {
        let first = VirtualModules::new();
        let second = VirtualModules::new();
        first.insert("background.html", "x");

        assert!(second.is_empty());
        assert!(second.get("background.html").is_none());
    }
}
