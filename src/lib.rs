//! Web extension manifest builder
//!
//! Turns an extension manifest (generation 2 or 3) into build entries for a bundler, then
//! rewrites it against the compiled output: file references point at real output files, loader
//! shims bridge module-loading restrictions, and `web_accessible_resources` is derived from the
//! compiled dependency graph. A development variant writes the same manifest shape against a
//! running dev server.

pub mod dev;
pub mod error;
pub mod models;
pub mod packager;
pub mod parser;
pub mod plugin;
pub mod transformer;
pub mod utils;
pub mod validator;

pub use error::{ManifestError, Result};
pub use models::{BuildOptions, Manifest, OutputBundle, ParseResult};
pub use plugin::WebExtensionPlugin;
pub use transformer::ManifestParser;

use anyhow::Context;
use std::path::Path;
use std::sync::Arc;
use utils::VirtualModules;

/// Load the manifest and optional options file, then run the input phase
pub fn prepare_build(
    manifest_path: &Path,
    options_path: Option<&Path>,
) -> anyhow::Result<(ManifestParser, ParseResult)> {
    let manifest = parser::parse_manifest_from_file(manifest_path)?;
    let options = match options_path {
        Some(path) => parser::parse_options_from_file(path)?,
        None => BuildOptions::default(),
    };

    let mut manifest_parser = ManifestParser::new(&manifest, &options, Arc::new(VirtualModules::new()))?;
    let result = manifest_parser.parse_input()?;
    Ok((manifest_parser, result))
}

/// Rewrite the manifest against a compiled bundle and write everything to `output_path`
pub fn finish_build(
    manifest_parser: &ManifestParser,
    bundle: &mut OutputBundle,
    output_path: &Path,
) -> anyhow::Result<Manifest> {
    // 1. Output phase
    let result = manifest_parser.parse_output(bundle)?;

    // 2. Everything emitted joins the bundle
    packager::emit_into_bundle(bundle, result.emitted_files);

    // 3. Every referenced file must exist
    validator::validate_output(&result.manifest, bundle).context("Build output is incomplete")?;

    // 4. Write to disk
    packager::write_bundle(bundle, output_path)?;

    Ok(result.manifest)
}
