//! Manifest generation 3: module service workers, scoped resource records, structured CSP

use super::loaders::static_script_loader;
use super::resources::optimize_v3;
use super::strategy::{common_pages, ManifestStrategy, ResourceGrant};
use crate::error::{ManifestError, Result};
use crate::models::{Manifest, OutputBundle, ParseResult, WebAccessibleResourceV3, WebAccessibleResources};
use crate::utils::helpers::output_identifier;
use crate::utils::VirtualModules;
use tracing::debug;

/// Loader the background field points at once the service worker is compiled
pub const SERVICE_WORKER_LOADER: &str = "serviceWorker";

pub struct ManifestV3;

impl ManifestStrategy for ManifestV3 {
    fn version(&self) -> u8 {
        3
    }

    fn html_pages(&self, manifest: &Manifest) -> Vec<String> {
        let mut pages = Vec::new();
        pages.extend(manifest.action.as_ref().and_then(|a| a.default_popup.clone()));
        pages.extend(manifest.side_panel.as_ref().and_then(|p| p.default_path.clone()));
        common_pages(manifest, &mut pages);
        pages
    }

    fn parse_input_background(&self, mut result: ParseResult, _modules: &VirtualModules) -> Result<ParseResult> {
        let Some(background) = result.manifest.background.as_mut() else {
            return Ok(result);
        };
        let Some(worker) = background.service_worker.clone() else {
            return Ok(result);
        };

        background.type_ = Some("module".to_string());
        result.entries.add(output_identifier(&worker), &worker)?;
        Ok(result)
    }

    fn parse_output_background(&self, mut result: ParseResult, bundle: &OutputBundle) -> Result<ParseResult> {
        let Some(background) = result.manifest.background.as_mut() else {
            return Ok(result);
        };
        let Some(worker) = background.service_worker.as_deref() else {
            return Ok(result);
        };

        let chunk = bundle
            .find_chunk(&output_identifier(worker))
            .ok_or_else(|| ManifestError::MissingOutput(worker.to_string()))?;

        // service workers cannot import() during install
        let loader = static_script_loader(SERVICE_WORKER_LOADER, &[chunk.file_name.clone()]);
        debug!(chunk = %chunk.file_name, loader = %loader.file_name, "wrapped service worker");

        background.service_worker = Some(loader.file_name.clone());
        result.emit(loader);
        Ok(result)
    }

    fn add_web_accessible(&self, manifest: &mut Manifest, grant: ResourceGrant) -> Result<()> {
        if grant.is_empty() {
            return Ok(());
        }

        records(manifest)?.push(WebAccessibleResourceV3 {
            resources: grant.resources,
            matches: grant.matches,
            extension_ids: grant.extension_ids,
            use_dynamic_url: grant.use_dynamic_url,
            ..Default::default()
        });
        Ok(())
    }

    fn optimize_web_accessible(&self, manifest: &mut Manifest) -> Result<()> {
        if manifest.web_accessible_resources.is_some() {
            let declared = records(manifest)?;
            let optimized = optimize_v3(std::mem::take(declared));
            *declared = optimized;
        }
        Ok(())
    }
}

fn records(manifest: &mut Manifest) -> Result<&mut Vec<WebAccessibleResourceV3>> {
    let declared = manifest
        .web_accessible_resources
        .get_or_insert_with(|| WebAccessibleResources::V3(Vec::new()));

    if matches!(declared, WebAccessibleResources::V2(resources) if resources.is_empty()) {
        *declared = WebAccessibleResources::V3(Vec::new());
    }

    match declared {
        WebAccessibleResources::V3(records) => Ok(records),
        WebAccessibleResources::V2(_) => Err(ManifestError::InvalidResourceDeclaration { version: 3 }),
    }
}
