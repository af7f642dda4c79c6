//! Development builds: the manifest shape of a real build, backed by a running dev server.
//!
//! Instead of compiled output, the out directory receives small shims that make the browser
//! fetch every page, script and style from the dev server, so live reload works inside the
//! extension.

pub mod client_patch;
pub mod html;
pub mod variant;

#[cfg(feature = "dev")]
pub mod http;
#[cfg(feature = "dev")]
pub mod watcher;

use crate::models::{AdditionalInput, BuildOptions, InputKind, Manifest};
use crate::packager::{clear_directory, copy_directory, write_file};
use crate::transformer::manifest::{additional_input_grant, MANIFEST_FILE};
use crate::transformer::{script_loader, strategy_for, ManifestParser, ManifestStrategy};
use crate::utils::helpers::{normalize_path, output_identifier, strip_extension, strip_query};
use crate::utils::VirtualModules;
use anyhow::{Context, Result};
use indexmap::{IndexMap, IndexSet};
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, instrument};
use variant::{dev_variant_for, DevVariant};

/// The running dev server, as seen by the dev builder
pub trait DevServer: Send + Sync {
    /// `scheme://host:port`, no trailing slash
    fn origin(&self) -> &str;

    /// Run the server's HTML transform hooks over a page
    fn transform_index_html(&self, file: &str, html: &str) -> anyhow::Result<String>;

    /// Processed stylesheet text for a style source
    fn load_style(&self, file: &str) -> anyhow::Result<String>;

    fn client_url(&self) -> String {
        format!("{}/@vite/client", self.origin())
    }

    fn env_url(&self) -> String {
        format!("{}/@vite/env", self.origin())
    }

    /// Where the server hosts a project file
    fn url_for(&self, file: &str) -> String {
        format!("{}/{}", self.origin(), normalize_path(strip_query(file)))
    }
}

#[derive(Debug, Clone)]
pub struct DevBuildOptions {
    /// Project root; page sources are read relative to it
    pub root: PathBuf,
    pub out_dir: PathBuf,
    /// Copied verbatim into `out_dir` on every build
    pub public_dir: Option<PathBuf>,
}

/// A written output file that is regenerated when its source changes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WatchTarget {
    Page { source: String, output: String },
    Style { source: String, output: String },
}

impl WatchTarget {
    /// Source file, relative to the project root
    pub fn source(&self) -> &str {
        match self {
            Self::Page { source, .. } | Self::Style { source, .. } => source,
        }
    }

    /// Output file, relative to the out directory
    pub fn output(&self) -> &str {
        match self {
            Self::Page { output, .. } | Self::Style { output, .. } => output,
        }
    }
}

#[derive(Debug, Default)]
struct DevState {
    /// Manifest before the CSP merge, kept so inline hashes can be re-applied
    manifest: Option<Manifest>,
    inline_hashes: IndexMap<String, Vec<String>>,
    targets: Vec<WatchTarget>,
}

/// Writes and rewrites the dev output directory for one manifest
pub struct DevBuilder {
    server: Box<dyn DevServer>,
    options: DevBuildOptions,
    strategy: Box<dyn ManifestStrategy>,
    variant: Box<dyn DevVariant>,
    manifest: Manifest,
    build_options: BuildOptions,
    additional_inputs: Vec<AdditionalInput>,
    modules: Arc<VirtualModules>,
    state: Mutex<DevState>,
}

impl DevBuilder {
    /// Build from a parser whose input phase has already run
    pub fn new(parser: &ManifestParser, server: Box<dyn DevServer>, options: DevBuildOptions) -> crate::Result<Self> {
        let version = parser.manifest().manifest_version;

        Ok(Self {
            server,
            options,
            strategy: strategy_for(version)?,
            variant: dev_variant_for(version)?,
            manifest: parser.manifest().clone(),
            build_options: parser.options().clone(),
            additional_inputs: parser.additional_inputs().to_vec(),
            modules: Arc::clone(parser.virtual_modules()),
            state: Mutex::new(DevState::default()),
        })
    }

    pub fn options(&self) -> &DevBuildOptions {
        &self.options
    }

    pub fn watch_targets(&self) -> Vec<WatchTarget> {
        self.state().targets.clone()
    }

    /// Write the whole dev output directory. Returns the manifest as written.
    #[instrument(level = "debug", skip_all, fields(out_dir = %self.options.out_dir.display()))]
    pub fn write_build(&self) -> Result<Manifest> {
        let mut manifest = self.manifest.clone();
        let mut inline_hashes = IndexMap::new();
        let mut targets = Vec::new();

        // 1. Start from an empty out directory
        clear_directory(&self.options.out_dir)?;

        // 2. Public files
        if let Some(public_dir) = self.options.public_dir.as_deref().filter(|dir| dir.is_dir()) {
            let copied = copy_directory(public_dir, &self.options.out_dir)?;
            debug!(copied, "copied public files");
        }

        // 3. Pages, served through the dev server
        for page in self.strategy.html_pages(&manifest) {
            let file = normalize_path(strip_query(&page));
            inline_hashes.insert(file.clone(), self.write_page(&file, &file)?);
            targets.push(WatchTarget::Page {
                source: file.clone(),
                output: file,
            });
        }

        // 4. Content scripts and styles
        for script in &mut manifest.content_scripts {
            for js in &mut script.js {
                let loader = script_loader(&output_identifier(js), &[self.server.client_url(), self.server.url_for(js)]);
                write_file(&self.options.out_dir, &loader.file_name, loader.source.as_bytes())?;
                *js = loader.file_name;
            }
            for css in &mut script.css {
                let output = format!("{}.css", output_identifier(css));
                let source = normalize_path(strip_query(css));
                self.write_style(&source, &output)?;
                targets.push(WatchTarget::Style { source, output: output.clone() });
                *css = output;
            }
        }

        // 5. Additional inputs
        for input in &self.additional_inputs {
            let output = input.output_name();
            let source = normalize_path(&input.file_name);
            match input.kind {
                InputKind::Script => {
                    let loader = script_loader(
                        strip_extension(&output),
                        &[self.server.client_url(), self.server.url_for(&source)],
                    );
                    write_file(&self.options.out_dir, &loader.file_name, loader.source.as_bytes())?;
                }
                InputKind::Page => {
                    inline_hashes.insert(output.clone(), self.write_page(&source, &output)?);
                    targets.push(WatchTarget::Page {
                        source,
                        output: output.clone(),
                    });
                }
                InputKind::Style => {
                    self.write_style(&source, &output)?;
                    targets.push(WatchTarget::Style {
                        source,
                        output: output.clone(),
                    });
                }
            }

            if let Some(grant) = additional_input_grant(input, output, Vec::new(), self.build_options.dynamic_url()) {
                self.strategy.add_web_accessible(&mut manifest, grant)?;
            }
        }
        if !self.build_options.disable_resource_optimization {
            self.strategy.optimize_web_accessible(&mut manifest)?;
        }

        // 6. Background
        if let Some(loader) = self.variant.write_background(&mut manifest, self.server.as_ref()) {
            write_file(&self.options.out_dir, &loader.file_name, loader.source.as_bytes())?;
        }

        // 7. Security policy and manifest.json
        let written = self.write_manifest(&manifest, &inline_hashes)?;
        info!(
            pages = inline_hashes.len(),
            watched = targets.len(),
            "wrote dev build to {}",
            self.options.out_dir.display()
        );

        let mut state = self.state();
        state.manifest = Some(manifest);
        state.inline_hashes = inline_hashes;
        state.targets = targets;
        Ok(written)
    }

    /// Rewrite the single output file behind `target`
    pub fn regenerate(&self, target: &WatchTarget) -> Result<()> {
        match target {
            WatchTarget::Style { source, output } => self.write_style(source, output),
            WatchTarget::Page { source, output } => {
                let hashes = self.write_page(source, output)?;
                if !self.variant.hashes_inline_scripts() {
                    return Ok(());
                }

                // a page with new inline scripts needs the policy rewritten too
                let mut state = self.state();
                if state.inline_hashes.get(output) == Some(&hashes) {
                    return Ok(());
                }
                state.inline_hashes.insert(output.clone(), hashes);
                if let Some(manifest) = &state.manifest {
                    self.write_manifest(manifest, &state.inline_hashes)?;
                }
                Ok(())
            }
        }
    }

    fn write_page(&self, source: &str, output: &str) -> Result<Vec<String>> {
        let html = match self.modules.get(source) {
            Some(html) => html,
            None => {
                let path = self.options.root.join(source);
                fs::read_to_string(&path).with_context(|| format!("Failed to read page {}", path.display()))?
            }
        };

        let html = self
            .server
            .transform_index_html(source, &html)
            .with_context(|| format!("Failed to transform {}", source))?;
        let html = html::inject_base_href(&html, &self.server.url_for(source));

        let hashes = if self.variant.hashes_inline_scripts() {
            html::inline_script_hashes(&html)
        } else {
            Vec::new()
        };

        write_file(&self.options.out_dir, output, html)?;
        debug!(page = source, inline_scripts = hashes.len(), "wrote dev page");
        Ok(hashes)
    }

    fn write_style(&self, source: &str, output: &str) -> Result<()> {
        let css = self
            .server
            .load_style(source)
            .with_context(|| format!("Failed to load style {}", source))?;
        write_file(&self.options.out_dir, output, css)?;
        debug!(style = source, "wrote dev style");
        Ok(())
    }

    fn write_manifest(&self, manifest: &Manifest, inline_hashes: &IndexMap<String, Vec<String>>) -> Result<Manifest> {
        let hashes: IndexSet<String> = inline_hashes.values().flatten().cloned().collect();
        let hashes: Vec<String> = hashes.into_iter().collect();

        let mut manifest = manifest.clone();
        self.variant.apply_csp(&mut manifest, self.server.origin(), &hashes);

        let json = serde_json::to_string_pretty(&manifest)?;
        write_file(&self.options.out_dir, MANIFEST_FILE, json)?;
        Ok(manifest)
    }

    fn state(&self) -> std::sync::MutexGuard<'_, DevState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
