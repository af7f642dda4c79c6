//! Manifest loading

use crate::error::ManifestError;
use crate::models::Manifest;
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;

/// Parse manifest.json from bytes. Comments and trailing commas are accepted.
pub fn parse_manifest(content: &[u8]) -> Result<Manifest> {
    let text = std::str::from_utf8(content).context("Invalid UTF-8 in manifest.json")?;
    let raw: Value = json5::from_str(text).context("Failed to parse manifest.json")?;

    // generation first, so a descriptor of an unknown generation is not reported as malformed
    let generation = raw
        .get("manifest_version")
        .and_then(Value::as_u64)
        .context("manifest.json has no numeric manifest_version")?;
    match u8::try_from(generation) {
        Ok(2) | Ok(3) => {}
        Ok(other) => return Err(ManifestError::UnsupportedManifestVersion(other).into()),
        Err(_) => anyhow::bail!("manifest_version {} is out of range", generation),
    }

    serde_json::from_value(raw).context("Invalid manifest.json")
}

pub fn parse_manifest_from_file(path: impl AsRef<Path>) -> Result<Manifest> {
    let path = path.as_ref();
    let content = std::fs::read(path).with_context(|| format!("Failed to read manifest file {}", path.display()))?;
    parse_manifest(&content).with_context(|| format!("in {}", path.display()))
}

pub fn parse_manifest_from_str(content: &str) -> Result<Manifest> {
    parse_manifest(content.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test]
    fn test_json5_descriptor() {
        let manifest = parse_manifest_from_str(
            r#"{
                // popup only
                manifest_version: 2,
                name: "Popup", /* trailing comma below */
                browser_action: { default_popup: "popup.html" },
            }"#,
        )
        .unwrap();

        assert_eq!(manifest.manifest_version, 2);
        assert_eq!(manifest.name, "Popup");
        assert_eq!(
            manifest.browser_action.and_then(|action| action.default_popup).as_deref(),
            Some("popup.html")
        );
    }

    #[test]
    fn test_background_scripts_kept_as_written() {
        let manifest =
            parse_manifest_from_str(r#"{ "manifest_version": 2, "background": { "scripts": ["bg.js"] } }"#).unwrap();

        let background = manifest.background.unwrap();
        assert_eq!(background.scripts, Some(vec!["bg.js".to_string()]));
        assert!(background.page.is_none());
    }

    #[test_case(r#"{ "manifest_version": 4 }"#, "unsupported manifest version: 4" ; "future generation")]
    #[test_case(r#"{ "manifest_version": 1, "background": 7 }"#, "unsupported manifest version: 1" ; "generation checked before shape")]
    #[test_case(r#"{ "manifest_version": 300 }"#, "out of range" ; "not a byte")]
    #[test_case(r#"{ "name": "x" }"#, "no numeric manifest_version" ; "missing generation")]
    fn test_rejected_generation(json: &str, message: &str) {
        let err = parse_manifest_from_str(json).unwrap_err();
        assert!(format!("{:#}", err).contains(message), "{:#}", err);
    }
}
