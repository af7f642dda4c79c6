//! Behaviour that differs between manifest generations

use super::v2::ManifestV2;
use super::v3::ManifestV3;
use crate::error::{ManifestError, Result};
use crate::models::{Manifest, OutputBundle, ParseResult};
use crate::utils::VirtualModules;

/// Files to expose to web pages, with the scope they are exposed under.
///
/// Generation 2 manifests only keep `resources`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceGrant {
    pub resources: Vec<String>,
    pub matches: Option<Vec<String>>,
    pub extension_ids: Option<Vec<String>>,
    pub use_dynamic_url: Option<bool>,
}

impl ResourceGrant {
    pub fn new(resources: Vec<String>) -> Self {
        Self {
            resources,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

pub trait ManifestStrategy: Send + Sync {
    fn version(&self) -> u8;

    /// Every HTML page the manifest references, as written
    fn html_pages(&self, manifest: &Manifest) -> Vec<String>;

    /// Register the background context as build entries, rewriting it if needed
    fn parse_input_background(&self, result: ParseResult, modules: &VirtualModules) -> Result<ParseResult>;

    /// Point the background context at compiled output
    fn parse_output_background(&self, result: ParseResult, bundle: &OutputBundle) -> Result<ParseResult>;

    fn add_web_accessible(&self, manifest: &mut Manifest, grant: ResourceGrant) -> Result<()>;

    fn optimize_web_accessible(&self, manifest: &mut Manifest) -> Result<()>;
}

/// Pick the strategy for a declared `manifest_version`
pub fn strategy_for(version: u8) -> Result<Box<dyn ManifestStrategy>> {
    match version {
        2 => Ok(Box::new(ManifestV2)),
        3 => Ok(Box::new(ManifestV3)),
        other => Err(ManifestError::UnsupportedManifestVersion(other)),
    }
}

/// Page fields shared by both generations
pub(crate) fn common_pages(manifest: &Manifest, pages: &mut Vec<String>) {
    pages.extend(manifest.options_page.iter().cloned());
    pages.extend(manifest.options_ui.as_ref().and_then(|ui| ui.page.clone()));
    pages.extend(manifest.devtools_page.iter().cloned());
    if let Some(overrides) = &manifest.chrome_url_overrides {
        pages.extend(overrides.values().cloned());
    }
    if let Some(sandbox) = &manifest.sandbox {
        pages.extend(sandbox.pages.iter().cloned());
    }
}
