//! Additional named inputs that are not referenced by the manifest itself

use crate::error::{ManifestError, Result};
use crate::utils::helpers::{file_stem, normalize_path, replace_extension};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Script,
    Page,
    Style,
}

impl InputKind {
    /// Map an `additionalInputs` key to its kind
    pub fn from_key(key: &str) -> Result<Self> {
        match key {
            "scripts" => Ok(Self::Script),
            "html" => Ok(Self::Page),
            "styles" => Ok(Self::Style),
            other => Err(ManifestError::InvalidInputKind(other.to_string())),
        }
    }

    /// Extension of the file emitted for this kind
    pub fn extension(self) -> &'static str {
        match self {
            Self::Script => "js",
            Self::Page => "html",
            Self::Style => "css",
        }
    }
}

/// One entry of an `additionalInputs` list, as written in configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AdditionalInputConfig {
    Path(String),
    Detailed(DetailedInput),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedInput {
    pub file_name: String,

    #[serde(default)]
    pub web_accessible: WebAccessible,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum WebAccessible {
    Enabled(bool),
    Scoped(WebAccessibleScope),
}

impl Default for WebAccessible {
    fn default() -> Self {
        Self::Enabled(true)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebAccessibleScope {
    #[serde(default)]
    pub matches: Option<Vec<String>>,

    #[serde(default)]
    pub extension_ids: Option<Vec<String>>,

    /// Expose only the input's dependencies, not the input file itself
    #[serde(default)]
    pub exclude_entry_file: bool,
}

/// Normalized additional input
#[derive(Debug, Clone, PartialEq)]
pub struct AdditionalInput {
    pub file_name: String,
    pub kind: InputKind,
    /// `None` when the input must not be web accessible
    pub web_accessible: Option<WebAccessibleScope>,
}

impl AdditionalInput {
    pub fn new(kind: InputKind, file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            kind,
            web_accessible: Some(WebAccessibleScope::default()),
        }
    }

    pub fn private(mut self) -> Self {
        self.web_accessible = None;
        self
    }

    pub fn with_scope(mut self, scope: WebAccessibleScope) -> Self {
        self.web_accessible = Some(scope);
        self
    }

    /// Entry name the bundler compiles this input under (`a/icon.png` -> `icon`)
    pub fn identifier(&self) -> String {
        file_stem(&self.file_name)
    }

    /// Name the input is finally written under (`src/inject.ts` -> `src/inject.js`)
    pub fn output_name(&self) -> String {
        replace_extension(&normalize_path(&self.file_name), self.kind.extension())
    }
}

/// Flatten the configured `additionalInputs` map into declaration order
pub fn normalize_additional_inputs(
    config: &IndexMap<String, Vec<AdditionalInputConfig>>,
) -> Result<Vec<AdditionalInput>> {
    let mut inputs = Vec::new();

    for (key, entries) in config {
        let kind = InputKind::from_key(key)?;

        for entry in entries {
            let input = match entry {
                AdditionalInputConfig::Path(file_name) => AdditionalInput::new(kind, file_name.clone()),
                AdditionalInputConfig::Detailed(detailed) => {
                    let input = AdditionalInput::new(kind, detailed.file_name.clone());
                    match &detailed.web_accessible {
                        WebAccessible::Enabled(true) => input,
                        WebAccessible::Enabled(false) => input.private(),
                        WebAccessible::Scoped(scope) => input.with_scope(scope.clone()),
                    }
                }
            };
            inputs.push(input);
        }
    }

    Ok(inputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_normalize_mixed_entries() {
        let config: IndexMap<String, Vec<AdditionalInputConfig>> = serde_json::from_str(
            r#"{
                "scripts": ["src/inject.ts", { "fileName": "src/private.ts", "webAccessible": false }],
                "styles": [{ "fileName": "src/theme.css", "webAccessible": { "matches": ["https://example.com/*"], "excludeEntryFile": true } }]
            }"#,
        )
        .unwrap();

        let inputs = normalize_additional_inputs(&config).unwrap();
        assert_eq!(
            inputs,
            vec![
                AdditionalInput::new(InputKind::Script, "src/inject.ts"),
                AdditionalInput::new(InputKind::Script, "src/private.ts").private(),
                AdditionalInput::new(InputKind::Style, "src/theme.css").with_scope(WebAccessibleScope {
                    matches: Some(vec!["https://example.com/*".to_string()]),
                    extension_ids: None,
                    exclude_entry_file: true,
                }),
            ]
        );
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let config: IndexMap<String, Vec<AdditionalInputConfig>> =
            serde_json::from_str(r#"{ "fonts": ["a.woff"] }"#).unwrap();

        let err = normalize_additional_inputs(&config).unwrap_err();
        assert!(matches!(err, ManifestError::InvalidInputKind(ref kind) if kind == "fonts"));
        assert!(err.to_string().contains("fonts"));
    }
}
