//! Structural validation

use crate::error::Result;
use crate::models::{Manifest, WebAccessibleResources};
use crate::transformer::strategy_for;
use crate::utils::helpers::{normalize_path, strip_query};

/// A file the manifest names, with the field naming it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReference {
    pub field: String,
    pub file: String,
}

impl FileReference {
    fn new(field: impl Into<String>, file: &str) -> Self {
        Self {
            field: field.into(),
            file: normalize_path(strip_query(file)),
        }
    }
}

/// Every concrete file reference in a rewritten manifest. Glob resources are skipped.
pub fn file_references(manifest: &Manifest) -> Result<Vec<FileReference>> {
    let strategy = strategy_for(manifest.manifest_version)?;
    let mut references: Vec<FileReference> = strategy
        .html_pages(manifest)
        .iter()
        .map(|page| FileReference::new("html page", page))
        .collect();

    for (index, script) in manifest.content_scripts.iter().enumerate() {
        for js in &script.js {
            references.push(FileReference::new(format!("content_scripts[{}].js", index), js));
        }
        for css in &script.css {
            references.push(FileReference::new(format!("content_scripts[{}].css", index), css));
        }
    }

    if let Some(background) = &manifest.background {
        // pages are already covered above
        for script in background.scripts.iter().flatten() {
            references.push(FileReference::new("background.scripts", script));
        }
        if let Some(worker) = &background.service_worker {
            references.push(FileReference::new("background.service_worker", worker));
        }
    }

    let resources: Vec<&String> = match &manifest.web_accessible_resources {
        Some(WebAccessibleResources::V2(resources)) => resources.iter().collect(),
        Some(WebAccessibleResources::V3(records)) => records.iter().flat_map(|r| r.resources.iter()).collect(),
        None => Vec::new(),
    };
    references.extend(
        resources
            .into_iter()
            .filter(|resource| !resource.contains('*'))
            .map(|resource| FileReference::new("web_accessible_resources", resource)),
    );

    Ok(references)
}
