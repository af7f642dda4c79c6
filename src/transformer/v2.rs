//! Manifest generation 2: background pages, flat resource lists, string CSP

use super::loaders::html_loader;
use super::resources::optimize_v2;
use super::strategy::{common_pages, ManifestStrategy, ResourceGrant};
use crate::error::{ManifestError, Result};
use crate::models::{Manifest, OutputBundle, ParseResult, WebAccessibleResources};
use crate::utils::helpers::{root_relative, strip_query};
use crate::utils::VirtualModules;
use tracing::debug;

/// Entry name of the page synthesized for `background.scripts`
pub const BACKGROUND_PAGE: &str = "background";

pub struct ManifestV2;

impl ManifestStrategy for ManifestV2 {
    fn version(&self) -> u8 {
        2
    }

    fn html_pages(&self, manifest: &Manifest) -> Vec<String> {
        let mut pages = Vec::new();
        pages.extend(manifest.background.as_ref().and_then(|bg| bg.page.clone()));
        pages.extend(manifest.browser_action.as_ref().and_then(|a| a.default_popup.clone()));
        pages.extend(manifest.page_action.as_ref().and_then(|a| a.default_popup.clone()));
        pages.extend(manifest.sidebar_action.as_ref().and_then(|s| s.default_panel.clone()));
        common_pages(manifest, &mut pages);
        pages
    }

    fn parse_input_background(&self, mut result: ParseResult, modules: &VirtualModules) -> Result<ParseResult> {
        let Some(background) = result.manifest.background.as_mut() else {
            return Ok(result);
        };
        let Some(scripts) = background.scripts.take() else {
            return Ok(result);
        };

        let sources: Vec<String> = scripts.iter().map(|script| root_relative(strip_query(script))).collect();
        let loader = html_loader(BACKGROUND_PAGE, &sources);
        modules.insert(&loader.file_name, loader.text().unwrap_or_default());
        background.page = Some(loader.file_name.clone());

        debug!(page = %loader.file_name, scripts = scripts.len(), "wrapped background scripts in a page");
        result.entries.add(BACKGROUND_PAGE, &loader.file_name)?;
        Ok(result)
    }

    fn parse_output_background(&self, result: ParseResult, _bundle: &OutputBundle) -> Result<ParseResult> {
        // background pages are compiled like any other page
        Ok(result)
    }

    fn add_web_accessible(&self, manifest: &mut Manifest, grant: ResourceGrant) -> Result<()> {
        if grant.is_empty() {
            return Ok(());
        }
        resource_list(manifest)?.extend(grant.resources);
        Ok(())
    }

    fn optimize_web_accessible(&self, manifest: &mut Manifest) -> Result<()> {
        if manifest.web_accessible_resources.is_some() {
            optimize_v2(resource_list(manifest)?);
        }
        Ok(())
    }
}

fn resource_list(manifest: &mut Manifest) -> Result<&mut Vec<String>> {
    let declared = manifest
        .web_accessible_resources
        .get_or_insert_with(|| WebAccessibleResources::V2(Vec::new()));

    // `[]` reads as either shape
    if matches!(declared, WebAccessibleResources::V3(records) if records.is_empty()) {
        *declared = WebAccessibleResources::V2(Vec::new());
    }

    match declared {
        WebAccessibleResources::V2(resources) => Ok(resources),
        WebAccessibleResources::V3(_) => Err(ManifestError::InvalidResourceDeclaration { version: 2 }),
    }
}
