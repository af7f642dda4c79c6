//! Build entries and the results of each parsing phase

use super::bundle::AssetSource;
use super::manifest::Manifest;
use crate::error::{ManifestError, Result};
use crate::utils::helpers::normalize_path;
use indexmap::IndexMap;
use serde::Serialize;

/// Output identifier paired with the source file compiled under it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildEntry {
    pub name: String,
    pub input: String,
}

/// Entries in discovery order, unique by output identifier
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryMap {
    entries: IndexMap<String, String>,
}

impl EntryMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entry. Re-registering the same source under the same name is a
    /// no-op; a different source under an existing name is a conflict.
    pub fn add(&mut self, name: impl Into<String>, input: &str) -> Result<()> {
        let name = name.into();
        let input = normalize_path(input);

        match self.entries.get(&name) {
            Some(existing) if *existing != input => Err(ManifestError::EntryNameConflict {
                name,
                first: existing.clone(),
                second: input,
            }),
            Some(_) => Ok(()),
            None => {
                self.entries.insert(name, input);
                Ok(())
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = BuildEntry> + '_ {
        self.entries.iter().map(|(name, input)| BuildEntry {
            name: name.clone(),
            input: input.clone(),
        })
    }

    pub fn to_vec(&self) -> Vec<BuildEntry> {
        self.iter().collect()
    }
}

/// A file written to the output set by this crate rather than by the bundler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedFile {
    pub file_name: String,
    pub source: AssetSource,
}

impl EmittedFile {
    pub fn new(file_name: impl Into<String>, source: impl Into<AssetSource>) -> Self {
        Self {
            file_name: file_name.into(),
            source: source.into(),
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.source.as_text()
    }
}

/// State threaded through the steps of a parsing phase
#[derive(Debug, Clone)]
pub struct ParseResult {
    pub manifest: Manifest,
    pub entries: EntryMap,
    pub emitted_files: Vec<EmittedFile>,
}

impl ParseResult {
    pub fn new(manifest: Manifest) -> Self {
        Self {
            manifest,
            entries: EntryMap::new(),
            emitted_files: Vec::new(),
        }
    }

    pub fn emit(&mut self, file: EmittedFile) {
        self.emitted_files.retain(|existing| existing.file_name != file.file_name);
        self.emitted_files.push(file);
    }

    pub fn emitted(&self, file_name: &str) -> Option<&EmittedFile> {
        self.emitted_files.iter().find(|file| file.file_name == file_name)
    }
}
