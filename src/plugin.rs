//! Bundler-facing adapter, following the usual plugin hook order

use crate::dev::client_patch::patch_client;
use crate::error::Result;
use crate::models::{BuildEntry, BuildOptions, Manifest, OutputBundle};
use crate::packager::emit_into_bundle;
use crate::transformer::ManifestParser;
use crate::utils::helpers::normalize_path;
use crate::utils::VirtualModules;
use std::sync::Arc;
use tracing::debug;

pub struct WebExtensionPlugin {
    manifest: Manifest,
    options: BuildOptions,
    modules: Arc<VirtualModules>,
    parser: Option<ManifestParser>,
}

impl WebExtensionPlugin {
    pub const NAME: &'static str = "webext-builder";

    pub fn new(manifest: Manifest, options: BuildOptions) -> Self {
        Self {
            manifest,
            options,
            modules: Arc::new(VirtualModules::new()),
            parser: None,
        }
    }

    pub fn virtual_modules(&self) -> &Arc<VirtualModules> {
        &self.modules
    }

    /// Parser of the current build, once `build_start` ran
    pub fn parser(&self) -> Option<&ManifestParser> {
        self.parser.as_ref()
    }

    /// Run the input phase and return the entries to compile
    pub fn build_start(&mut self) -> Result<Vec<BuildEntry>> {
        let (parser, entries) = self.start_parser()?;
        self.parser = Some(parser);
        Ok(entries)
    }

    fn start_parser(&self) -> Result<(ManifestParser, Vec<BuildEntry>)> {
        let mut parser = ManifestParser::new(&self.manifest, &self.options, Arc::clone(&self.modules))?;
        let entries = parser.parse_input()?.entries.to_vec();
        Ok((parser, entries))
    }

    /// Claim ids of synthesized modules
    pub fn resolve_id(&self, id: &str) -> Option<String> {
        self.modules.contains(id).then(|| normalize_path(id))
    }

    pub fn load(&self, id: &str) -> Option<String> {
        self.modules.get(id)
    }

    /// Patch the live-reload client module; other modules are left alone
    pub fn transform(&self, code: &str, id: &str) -> Option<String> {
        if !is_client_module(id) {
            return None;
        }
        debug!(id, "patching live-reload client");
        Some(patch_client(code))
    }

    /// Run the output phase, adding every emitted file (and `manifest.json`) to the bundle
    pub fn generate_bundle(&mut self, bundle: &mut OutputBundle) -> Result<Manifest> {
        let parser = match self.parser.take() {
            Some(parser) => parser,
            None => self.start_parser()?.0,
        };
        let result = parser.parse_output(bundle);
        self.parser = Some(parser);

        let result = result?;
        emit_into_bundle(bundle, result.emitted_files);
        Ok(result.manifest)
    }
}

fn is_client_module(id: &str) -> bool {
    let path = id.split('?').next().unwrap_or(id);
    path.ends_with("/@vite/client") || path.contains("vite/dist/client/client.mjs")
}
