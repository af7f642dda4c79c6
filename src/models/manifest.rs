//! Manifest data structures for generation 2 and generation 3 extensions

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub manifest_version: u8,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<Background>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_action: Option<Action>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_action: Option<Action>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub options_page: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub options_ui: Option<OptionsUi>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub devtools_page: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sidebar_action: Option<SidebarAction>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub side_panel: Option<SidePanel>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub chrome_url_overrides: Option<IndexMap<String, String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sandbox: Option<Sandbox>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content_scripts: Vec<ContentScript>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_accessible_resources: Option<WebAccessibleResources>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_security_policy: Option<ContentSecurityPolicy>,

    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl Manifest {
    /// Bare manifest of the given generation; mostly useful in tests.
    pub fn new(manifest_version: u8) -> Self {
        Self {
            manifest_version,
            name: String::new(),
            version: String::new(),
            background: None,
            action: None,
            browser_action: None,
            page_action: None,
            options_page: None,
            options_ui: None,
            devtools_page: None,
            sidebar_action: None,
            side_panel: None,
            chrome_url_overrides: None,
            sandbox: None,
            content_scripts: Vec::new(),
            web_accessible_resources: None,
            content_security_policy: None,
            extra: IndexMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Background {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub scripts: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_worker: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub persistent: Option<bool>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_popup: Option<String>,

    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptionsUi {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,

    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SidebarAction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_panel: Option<String>,

    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SidePanel {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_path: Option<String>,

    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sandbox {
    #[serde(default)]
    pub pages: Vec<String>,

    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentScript {
    #[serde(default)]
    pub matches: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub js: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub css: Vec<String>,

    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WebAccessibleResources {
    V2(Vec<String>),
    V3(Vec<WebAccessibleResourceV3>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebAccessibleResourceV3 {
    pub resources: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub matches: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension_ids: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_dynamic_url: Option<bool>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentSecurityPolicy {
    V2(String),
    V3(ContentSecurityPolicyV3),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentSecurityPolicyV3 {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension_pages: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sandbox: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let json = r#"{
            "manifest_version": 3,
            "name": "Test",
            "version": "1.0",
            "permissions": ["storage"],
            "action": { "default_popup": "popup.html", "default_title": "Hi" }
        }"#;

        let manifest: Manifest = serde_json::from_str(json).unwrap();
        assert_eq!(manifest.extra["permissions"], serde_json::json!(["storage"]));

        let action = manifest.action.as_ref().unwrap();
        assert_eq!(action.default_popup.as_deref(), Some("popup.html"));
        assert_eq!(action.extra["default_title"], "Hi");

        let back = serde_json::to_value(&manifest).unwrap();
        assert_eq!(back["action"]["default_title"], "Hi");
        assert_eq!(back["permissions"], serde_json::json!(["storage"]));
    }

    #[test]
    fn test_background_type_is_renamed() {
        let background = Background {
            service_worker: Some("sw.js".to_string()),
            type_: Some("module".to_string()),
            ..Default::default()
        };

        let value = serde_json::to_value(&background).unwrap();
        assert_eq!(value["type"], "module");
        assert!(value.get("type_").is_none());
    }

    #[test]
    fn test_resource_shapes() {
        let v2: WebAccessibleResources = serde_json::from_str(r#"["a.js"]"#).unwrap();
        assert!(matches!(v2, WebAccessibleResources::V2(_)));

        let v3: WebAccessibleResources =
            serde_json::from_str(r#"[{"resources": ["a.js"], "matches": ["<all_urls>"]}]"#).unwrap();
        assert!(matches!(v3, WebAccessibleResources::V3(_)));
    }
}
