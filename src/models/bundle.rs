//! Compiled output handed over by the bundler

use crate::utils::helpers::{matches_identifier, strip_extension};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Output set keyed by file name, in emission order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputBundle {
    items: IndexMap<String, OutputItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutputItem {
    Chunk(OutputChunk),
    Asset(OutputAsset),
}

impl OutputItem {
    pub fn file_name(&self) -> &str {
        match self {
            Self::Chunk(chunk) => &chunk.file_name,
            Self::Asset(asset) => &asset.file_name,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputChunk {
    pub file_name: String,

    /// Entry name the bundler compiled this chunk for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub is_entry: bool,

    #[serde(default)]
    pub imports: Vec<String>,

    #[serde(default)]
    pub dynamic_imports: Vec<String>,

    #[serde(default)]
    pub code: String,

    #[serde(default, alias = "viteMetadata")]
    pub metadata: ChunkMetadata,
}

impl OutputChunk {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            ..Default::default()
        }
    }

    pub fn has_imports(&self) -> bool {
        !self.imports.is_empty() || !self.dynamic_imports.is_empty()
    }
}

/// Non-executable files pulled in by a chunk's own modules
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkMetadata {
    #[serde(default)]
    pub imported_css: Vec<String>,

    #[serde(default)]
    pub imported_assets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputAsset {
    pub file_name: String,

    /// Original file name of the asset source, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub source: AssetSource,
}

impl OutputAsset {
    pub fn new(file_name: impl Into<String>, source: impl Into<AssetSource>) -> Self {
        Self {
            file_name: file_name.into(),
            name: None,
            source: source.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AssetSource {
    Text(String),
    Binary(Vec<u8>),
}

impl AssetSource {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Binary(bytes) => bytes,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Binary(bytes) => std::str::from_utf8(bytes).ok(),
        }
    }
}

impl From<String> for AssetSource {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for AssetSource {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Vec<u8>> for AssetSource {
    fn from(value: Vec<u8>) -> Self {
        Self::Binary(value)
    }
}

impl OutputBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an item under its own file name, replacing any previous one
    pub fn insert(&mut self, item: OutputItem) {
        self.items.insert(item.file_name().to_string(), item);
    }

    pub fn insert_chunk(&mut self, chunk: OutputChunk) {
        self.insert(OutputItem::Chunk(chunk));
    }

    pub fn insert_asset(&mut self, asset: OutputAsset) {
        self.insert(OutputItem::Asset(asset));
    }

    pub fn get(&self, file_name: &str) -> Option<&OutputItem> {
        self.items.get(file_name)
    }

    pub fn chunk(&self, file_name: &str) -> Option<&OutputChunk> {
        match self.items.get(file_name) {
            Some(OutputItem::Chunk(chunk)) => Some(chunk),
            _ => None,
        }
    }

    pub fn chunk_mut(&mut self, file_name: &str) -> Option<&mut OutputChunk> {
        match self.items.get_mut(file_name) {
            Some(OutputItem::Chunk(chunk)) => Some(chunk),
            _ => None,
        }
    }

    /// Remove an item, keeping the order of the rest
    pub fn remove(&mut self, file_name: &str) -> Option<OutputItem> {
        self.items.shift_remove(file_name)
    }

    pub fn contains(&self, file_name: &str) -> bool {
        self.items.contains_key(file_name)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OutputItem> {
        self.items.values()
    }

    pub fn chunks(&self) -> impl Iterator<Item = &OutputChunk> {
        self.items.values().filter_map(|item| match item {
            OutputItem::Chunk(chunk) => Some(chunk),
            OutputItem::Asset(_) => None,
        })
    }

    pub fn assets(&self) -> impl Iterator<Item = &OutputAsset> {
        self.items.values().filter_map(|item| match item {
            OutputItem::Asset(asset) => Some(asset),
            OutputItem::Chunk(_) => None,
        })
    }

    /// Find the chunk compiled for an entry identifier.
    ///
    /// Exact entry names win over file-name suffix matches.
    pub fn find_chunk(&self, identifier: &str) -> Option<&OutputChunk> {
        self.chunks()
            .find(|chunk| chunk.name.as_deref() == Some(identifier))
            .or_else(|| {
                self.chunks()
                    .find(|chunk| matches_identifier(strip_extension(&chunk.file_name), identifier))
            })
    }

    /// Find the asset compiled for an entry identifier.
    ///
    /// The last fallback matches assets whose original name is only a trailing part of the
    /// identifier; it gives up when more than one asset qualifies.
    pub fn find_asset(&self, identifier: &str) -> Option<&OutputAsset> {
        self.assets()
            .find(|asset| original_stem(asset) == Some(identifier))
            .or_else(|| {
                self.assets()
                    .find(|asset| matches_identifier(strip_extension(&asset.file_name), identifier))
            })
            .or_else(|| {
                let mut candidates = self.assets().filter(|asset| {
                    original_stem(asset)
                        .map(|name| matches_identifier(identifier, name))
                        .unwrap_or(false)
                });
                match (candidates.next(), candidates.next()) {
                    (Some(asset), None) => Some(asset),
                    _ => None,
                }
            })
    }
}

fn original_stem(asset: &OutputAsset) -> Option<&str> {
    asset.name.as_deref().map(strip_extension)
}
