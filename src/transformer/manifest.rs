//! Two-phase manifest rewrite around the bundler

use super::dependencies::DependencyWalker;
use super::loaders::script_loader;
use super::strategy::{strategy_for, ManifestStrategy, ResourceGrant};
use crate::error::{ManifestError, Result};
use crate::models::{
    AdditionalInput, BuildOptions, EmittedFile, InputKind, Manifest, OutputBundle, OutputChunk, ParseResult,
};
use crate::utils::helpers::{output_identifier, strip_extension, strip_query, style_identifier};
use crate::utils::VirtualModules;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Token in compiled content-script code replaced by the chunk's CSS file list
pub const CSS_PATHS_PLACEHOLDER: &str = "__WEB_EXT_CHUNK_CSS_PATHS__";

pub const MANIFEST_FILE: &str = "manifest.json";

type InputStep = fn(&ManifestParser, ParseResult) -> Result<ParseResult>;
type OutputStep = fn(&ManifestParser, ParseResult, &mut OutputBundle) -> Result<ParseResult>;

/// Rewrites one manifest for one build.
///
/// The manifest is copied on construction. `parse_input` replaces the copy with its rewritten
/// manifest, so `parse_output` continues from the shape the bundler was given.
pub struct ManifestParser {
    strategy: Box<dyn ManifestStrategy>,
    manifest: Manifest,
    options: BuildOptions,
    additional_inputs: Vec<AdditionalInput>,
    modules: Arc<VirtualModules>,
}

impl ManifestParser {
    pub fn new(manifest: &Manifest, options: &BuildOptions, modules: Arc<VirtualModules>) -> Result<Self> {
        let strategy = strategy_for(manifest.manifest_version)?;
        let additional_inputs = options.additional_inputs()?;

        Ok(Self {
            strategy,
            manifest: manifest.clone(),
            options: options.clone(),
            additional_inputs,
            modules,
        })
    }

    pub fn strategy(&self) -> &dyn ManifestStrategy {
        self.strategy.as_ref()
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    pub fn additional_inputs(&self) -> &[AdditionalInput] {
        &self.additional_inputs
    }

    pub fn virtual_modules(&self) -> &Arc<VirtualModules> {
        &self.modules
    }

    /// Discover every build entry the manifest implies
    #[instrument(level = "debug", skip_all, fields(manifest_version = self.strategy.version()))]
    pub fn parse_input(&mut self) -> Result<ParseResult> {
        let steps: [InputStep; 4] = [
            Self::parse_input_html,
            Self::parse_input_content_scripts,
            Self::parse_input_background,
            Self::parse_input_additional_inputs,
        ];

        let result = steps
            .iter()
            .try_fold(ParseResult::new(self.manifest.clone()), |result, step| step(self, result))?;

        info!(entries = result.entries.len(), "discovered build entries");
        self.manifest = result.manifest.clone();
        Ok(result)
    }

    /// Point the manifest at compiled output and emit the final `manifest.json`
    #[instrument(level = "debug", skip_all, fields(manifest_version = self.strategy.version()))]
    pub fn parse_output(&self, bundle: &mut OutputBundle) -> Result<ParseResult> {
        let steps: [OutputStep; 5] = [
            Self::parse_output_additional_inputs,
            Self::parse_output_content_scripts,
            Self::parse_output_background,
            Self::optimize_resources,
            Self::emit_manifest,
        ];

        let result = steps
            .iter()
            .try_fold(ParseResult::new(self.manifest.clone()), |result, step| step(self, result, bundle))?;

        info!(files = result.emitted_files.len(), "rewrote manifest");
        Ok(result)
    }

    // Input phase

    fn parse_input_html(&self, mut result: ParseResult) -> Result<ParseResult> {
        for page in self.strategy.html_pages(&result.manifest) {
            result.entries.add(output_identifier(&page), strip_query(&page))?;
        }
        Ok(result)
    }

    fn parse_input_content_scripts(&self, mut result: ParseResult) -> Result<ParseResult> {
        let files: Vec<(String, String)> = result
            .manifest
            .content_scripts
            .iter()
            .flat_map(|script| {
                let scripts = script.js.iter().map(|js| (output_identifier(js), js.clone()));
                let styles = script.css.iter().map(|css| (style_identifier(css), css.clone()));
                scripts.chain(styles)
            })
            .collect();

        for (name, file) in files {
            result.entries.add(name, strip_query(&file))?;
        }
        Ok(result)
    }

    fn parse_input_background(&self, result: ParseResult) -> Result<ParseResult> {
        self.strategy.parse_input_background(result, &self.modules)
    }

    fn parse_input_additional_inputs(&self, mut result: ParseResult) -> Result<ParseResult> {
        for input in &self.additional_inputs {
            if input.file_name.contains('*') {
                return Err(ManifestError::PatternInput(input.file_name.clone()));
            }
            result.entries.add(input.identifier(), &input.file_name)?;
        }
        Ok(result)
    }

    // Output phase

    fn parse_output_additional_inputs(&self, mut result: ParseResult, bundle: &mut OutputBundle) -> Result<ParseResult> {
        for input in &self.additional_inputs {
            let id = input.identifier();
            let final_name = input.output_name();

            let (entry_file, dependencies) = match input.kind {
                InputKind::Script => {
                    let chunk = bundle
                        .find_chunk(&id)
                        .cloned()
                        .ok_or_else(|| ManifestError::MissingOutput(input.file_name.clone()))?;
                    self.emit_additional_script(&mut result, bundle, &chunk, &final_name)
                }
                InputKind::Page | InputKind::Style => {
                    let asset = bundle
                        .find_asset(&id)
                        .cloned()
                        .ok_or_else(|| ManifestError::MissingOutput(input.file_name.clone()))?;
                    if asset.file_name != final_name {
                        bundle.remove(&asset.file_name);
                    }
                    result.emit(EmittedFile::new(final_name.clone(), asset.source));
                    (final_name, Vec::new())
                }
            };
            debug!(input = %input.file_name, output = %entry_file, "resolved additional input");

            if let Some(grant) = additional_input_grant(input, entry_file, dependencies, self.options.dynamic_url()) {
                self.strategy.add_web_accessible(&mut result.manifest, grant)?;
            }
        }
        Ok(result)
    }

    /// Emit a script input under its final name. Returns that name and the files it pulls in.
    fn emit_additional_script(
        &self,
        result: &mut ParseResult,
        bundle: &mut OutputBundle,
        chunk: &OutputChunk,
        final_name: &str,
    ) -> (String, Vec<String>) {
        if !chunk.has_imports() {
            if chunk.file_name != final_name {
                bundle.remove(&chunk.file_name);
            }
            result.emit(EmittedFile::new(final_name, chunk.code.clone()));
            return (final_name.to_string(), Vec::new());
        }

        let loader_stem = if chunk.file_name == final_name {
            loader_stem(&chunk.file_name)
        } else {
            strip_extension(final_name).to_string()
        };
        let loader = script_loader(&loader_stem, &[chunk.file_name.clone()]);
        let dependencies = DependencyWalker::collect(bundle, &chunk.file_name, true).into_resources();

        let entry_file = loader.file_name.clone();
        result.emit(loader);
        (entry_file, dependencies)
    }

    fn parse_output_content_scripts(&self, mut result: ParseResult, bundle: &mut OutputBundle) -> Result<ParseResult> {
        let mut scripts = std::mem::take(&mut result.manifest.content_scripts);

        for script in &mut scripts {
            let mut resources = Vec::new();

            for js in &mut script.js {
                let chunk = bundle
                    .find_chunk(&output_identifier(js))
                    .cloned()
                    .ok_or_else(|| ManifestError::MissingOutput(js.clone()))?;

                let uses_loader = chunk.has_imports();
                let dependencies = DependencyWalker::collect(bundle, &chunk.file_name, uses_loader);

                if chunk.code.contains(CSS_PATHS_PLACEHOLDER) {
                    let css_paths = serde_json::to_string(&dependencies.css)?;
                    if let Some(compiled) = bundle.chunk_mut(&chunk.file_name) {
                        compiled.code = compiled.code.replace(CSS_PATHS_PLACEHOLDER, &css_paths);
                    }
                }

                *js = if uses_loader {
                    let loader = script_loader(&loader_stem(&chunk.file_name), &[chunk.file_name.clone()]);
                    let loader_file = loader.file_name.clone();
                    result.emit(loader);
                    loader_file
                } else {
                    chunk.file_name.clone()
                };
                resources.extend(dependencies.into_resources());
            }

            for css in &mut script.css {
                let asset = bundle
                    .find_asset(&output_identifier(css))
                    .ok_or_else(|| ManifestError::MissingOutput(css.clone()))?;
                *css = asset.file_name.clone();
            }

            let grant = ResourceGrant {
                resources,
                matches: Some(script.matches.clone()),
                extension_ids: None,
                use_dynamic_url: self.options.dynamic_url(),
            };
            self.strategy.add_web_accessible(&mut result.manifest, grant)?;
        }

        result.manifest.content_scripts = scripts;
        Ok(result)
    }

    fn parse_output_background(&self, result: ParseResult, bundle: &mut OutputBundle) -> Result<ParseResult> {
        self.strategy.parse_output_background(result, bundle)
    }

    fn optimize_resources(&self, mut result: ParseResult, _bundle: &mut OutputBundle) -> Result<ParseResult> {
        if !self.options.disable_resource_optimization {
            self.strategy.optimize_web_accessible(&mut result.manifest)?;
        }
        Ok(result)
    }

    fn emit_manifest(&self, mut result: ParseResult, _bundle: &mut OutputBundle) -> Result<ParseResult> {
        let json = serde_json::to_string_pretty(&result.manifest)?;
        result.emit(EmittedFile::new(MANIFEST_FILE, json));
        Ok(result)
    }
}

/// Resources an additional input exposes, or `None` for private inputs.
///
/// Without explicit `matches` the grant applies to every page, unless it is scoped to
/// extension ids instead.
pub(crate) fn additional_input_grant(
    input: &AdditionalInput,
    entry_file: String,
    dependencies: Vec<String>,
    use_dynamic_url: Option<bool>,
) -> Option<ResourceGrant> {
    let scope = input.web_accessible.as_ref()?;

    let mut resources = Vec::new();
    if !scope.exclude_entry_file {
        resources.push(entry_file);
    }
    resources.extend(dependencies);

    let matches = match (&scope.matches, &scope.extension_ids) {
        (Some(matches), _) => Some(matches.clone()),
        (None, Some(_)) => None,
        (None, None) => Some(vec!["<all_urls>".to_string()]),
    };

    Some(ResourceGrant {
        resources,
        matches,
        extension_ids: scope.extension_ids.clone(),
        use_dynamic_url,
    })
}

/// `assets/content-1a2b.js` -> `assets/content-1a2b-loader`
fn loader_stem(chunk_file: &str) -> String {
    format!("{}-loader", strip_extension(chunk_file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChunkMetadata, OutputAsset, WebAccessibleResourceV3, WebAccessibleResources};
    use pretty_assertions::assert_eq;

    fn parser(manifest_json: &str, options_json: &str) -> ManifestParser {
        let manifest: Manifest = serde_json::from_str(manifest_json).unwrap();
        let options: BuildOptions = serde_json::from_str(options_json).unwrap();
        ManifestParser::new(&manifest, &options, Arc::new(VirtualModules::new())).unwrap()
    }

    fn chunk(file_name: &str, name: &str, imports: &[&str], css: &[&str]) -> OutputChunk {
        OutputChunk {
            name: Some(name.to_string()),
            imports: imports.iter().map(|s| s.to_string()).collect(),
            metadata: ChunkMetadata {
                imported_css: css.iter().map(|s| s.to_string()).collect(),
                imported_assets: Vec::new(),
            },
            ..OutputChunk::new(file_name)
        }
    }

    #[test]
    fn test_unsupported_version() {
        let manifest = Manifest::new(1);
        let err = ManifestParser::new(&manifest, &BuildOptions::default(), Arc::new(VirtualModules::new()))
            .err()
            .unwrap();
        assert!(matches!(err, ManifestError::UnsupportedManifestVersion(1)));
    }

    #[test]
    fn test_input_entries_in_discovery_order() {
        let mut parser = parser(
            r#"{
                "manifest_version": 3,
                "action": { "default_popup": "src/popup.html?x=1" },
                "content_scripts": [{ "matches": ["<all_urls>"], "js": ["src/content.ts"], "css": ["src/styles.css"] }],
                "background": { "service_worker": "src/bg.ts" }
            }"#,
            r#"{ "additionalInputs": { "scripts": ["src/inject.ts"] } }"#,
        );

        let result = parser.parse_input().unwrap();
        let entries: Vec<(String, String)> = result.entries.iter().map(|e| (e.name, e.input)).collect();

        assert_eq!(
            entries,
            vec![
                ("src/popup".to_string(), "src/popup.html".to_string()),
                ("src/content".to_string(), "src/content.ts".to_string()),
                ("src/styles.css".to_string(), "src/styles.css".to_string()),
                ("src/bg".to_string(), "src/bg.ts".to_string()),
                ("inject".to_string(), "src/inject.ts".to_string()),
            ]
        );
        assert_eq!(parser.manifest().background.as_ref().unwrap().type_.as_deref(), Some("module"));
    }

    #[test]
    fn test_script_and_style_with_same_stem_are_separate_entries() {
        let mut parser = parser(
            r#"{
                "manifest_version": 3,
                "content_scripts": [{ "matches": ["<all_urls>"], "js": ["src/content.ts"], "css": ["src/content.css"] }]
            }"#,
            "{}",
        );

        let result = parser.parse_input().unwrap();
        assert_eq!(result.entries.get("src/content"), Some("src/content.ts"));
        assert_eq!(result.entries.get("src/content.css"), Some("src/content.css"));

        let mut bundle = OutputBundle::new();
        bundle.insert_chunk(chunk("assets/content-77aa.js", "src/content", &[], &[]));
        bundle.insert_asset(OutputAsset {
            name: Some("src/content.css".to_string()),
            ..OutputAsset::new("assets/content-01fe.css", "p{}")
        });

        let output = parser.parse_output(&mut bundle).unwrap();
        let script = &output.manifest.content_scripts[0];
        assert_eq!(script.js, vec!["assets/content-77aa.js"]);
        assert_eq!(script.css, vec!["assets/content-01fe.css"]);
    }

    #[test]
    fn test_same_named_stylesheets_in_different_folders_are_not_guessed() {
        let mut parser = parser(
            r#"{
                "manifest_version": 3,
                "content_scripts": [
                    { "matches": ["https://a.dev/*"], "css": ["a/style.css"] },
                    { "matches": ["https://b.dev/*"], "css": ["b/style.css"] }
                ]
            }"#,
            "{}",
        );
        parser.parse_input().unwrap();

        let mut bundle = OutputBundle::new();
        for file in ["assets/style-aaaa.css", "assets/style-bbbb.css"] {
            bundle.insert_asset(OutputAsset {
                name: Some("style.css".to_string()),
                ..OutputAsset::new(file, "p{}")
            });
        }

        let err = parser.parse_output(&mut bundle).unwrap_err();
        assert!(matches!(err, ManifestError::MissingOutput(ref file) if file == "a/style.css"));
    }

    #[test]
    fn test_wildcard_additional_input_rejected() {
        let mut parser = parser(
            r#"{ "manifest_version": 3 }"#,
            r#"{ "additionalInputs": { "scripts": ["src/*.ts"] } }"#,
        );

        let err = parser.parse_input().unwrap_err();
        assert!(matches!(err, ManifestError::PatternInput(ref file) if file == "src/*.ts"));
    }

    #[test]
    fn test_content_script_with_imports_gets_loader() {
        let mut parser = parser(
            r#"{
                "manifest_version": 3,
                "content_scripts": [{ "matches": ["https://example.com/*"], "js": ["src/content.ts"] }]
            }"#,
            "{}",
        );
        parser.parse_input().unwrap();

        let mut bundle = OutputBundle::new();
        let mut content = chunk("assets/content.js", "src/content", &["assets/shared.js"], &[]);
        content.code = format!("const css = {};", CSS_PATHS_PLACEHOLDER);
        bundle.insert_chunk(content);
        bundle.insert_chunk(chunk("assets/shared.js", "shared", &[], &["assets/shared.css"]));

        let result = parser.parse_output(&mut bundle).unwrap();

        assert_eq!(result.manifest.content_scripts[0].js, vec!["assets/content-loader.js"]);
        assert!(result.emitted("assets/content-loader.js").is_some());
        assert_eq!(
            bundle.chunk("assets/content.js").unwrap().code,
            r#"const css = ["assets/shared.css"];"#
        );
        assert_eq!(
            result.manifest.web_accessible_resources,
            Some(WebAccessibleResources::V3(vec![WebAccessibleResourceV3 {
                resources: vec![
                    "assets/content.js".to_string(),
                    "assets/shared.css".to_string(),
                    "assets/shared.js".to_string(),
                ],
                matches: Some(vec!["https://example.com/*".to_string()]),
                use_dynamic_url: Some(true),
                ..Default::default()
            }]))
        );
    }

    #[test]
    fn test_content_script_without_imports_points_at_chunk() {
        let mut parser = parser(
            r#"{
                "manifest_version": 2,
                "content_scripts": [{ "matches": ["<all_urls>"], "js": ["content.js"], "css": ["styles/content.css"] }]
            }"#,
            "{}",
        );
        parser.parse_input().unwrap();

        let mut bundle = OutputBundle::new();
        bundle.insert_chunk(chunk("content.js", "content", &[], &[]));
        bundle.insert_asset(OutputAsset {
            name: Some("content.css".to_string()),
            ..OutputAsset::new("assets/content-1a2b.css", "body{}")
        });

        let result = parser.parse_output(&mut bundle).unwrap();
        let script = &result.manifest.content_scripts[0];
        assert_eq!(script.js, vec!["content.js"]);
        assert_eq!(script.css, vec!["assets/content-1a2b.css"]);
        assert_eq!(result.manifest.web_accessible_resources, None);
    }

    #[test]
    fn test_missing_content_script_output() {
        let mut parser = parser(
            r#"{ "manifest_version": 3, "content_scripts": [{ "matches": [], "js": ["content.ts"] }] }"#,
            "{}",
        );
        parser.parse_input().unwrap();

        let err = parser.parse_output(&mut OutputBundle::new()).unwrap_err();
        assert!(matches!(err, ManifestError::MissingOutput(ref file) if file == "content.ts"));
    }

    #[test]
    fn test_additional_script_without_imports_is_renamed() {
        let mut parser = parser(
            r#"{ "manifest_version": 3 }"#,
            r#"{ "additionalInputs": { "scripts": [{ "fileName": "src/inject.ts", "webAccessible": { "extensionIds": ["abc"] } }] } }"#,
        );
        parser.parse_input().unwrap();

        let mut bundle = OutputBundle::new();
        let mut inject = chunk("assets/inject-9f.js", "inject", &[], &[]);
        inject.code = "console.log(1)".to_string();
        bundle.insert_chunk(inject);

        let result = parser.parse_output(&mut bundle).unwrap();
        assert!(!bundle.contains("assets/inject-9f.js"));
        assert_eq!(
            result.emitted("src/inject.js").and_then(EmittedFile::text),
            Some("console.log(1)")
        );
        assert_eq!(
            result.manifest.web_accessible_resources,
            Some(WebAccessibleResources::V3(vec![WebAccessibleResourceV3 {
                resources: vec!["src/inject.js".to_string()],
                extension_ids: Some(vec!["abc".to_string()]),
                use_dynamic_url: Some(true),
                ..Default::default()
            }]))
        );
    }

    #[test]
    fn test_additional_script_with_imports_keeps_chunk() {
        let mut parser = parser(
            r#"{ "manifest_version": 2 }"#,
            r#"{ "additionalInputs": { "scripts": [{ "fileName": "inject.js", "webAccessible": { "excludeEntryFile": true } }] } }"#,
        );
        parser.parse_input().unwrap();

        let mut bundle = OutputBundle::new();
        bundle.insert_chunk(chunk("inject.js", "inject", &["vendor.js"], &[]));
        bundle.insert_chunk(chunk("vendor.js", "vendor", &[], &[]));

        let result = parser.parse_output(&mut bundle).unwrap();
        assert!(bundle.contains("inject.js"));
        assert!(result.emitted("inject-loader.js").is_some());
        assert_eq!(
            result.manifest.web_accessible_resources,
            Some(WebAccessibleResources::V2(vec!["inject.js".to_string(), "vendor.js".to_string()]))
        );
    }

    #[test]
    fn test_private_style_input_is_not_exposed() {
        let mut parser = parser(
            r#"{ "manifest_version": 3 }"#,
            r#"{ "additionalInputs": { "styles": [{ "fileName": "src/theme.scss", "webAccessible": false }] } }"#,
        );
        parser.parse_input().unwrap();

        let mut bundle = OutputBundle::new();
        bundle.insert_asset(OutputAsset {
            name: Some("theme.css".to_string()),
            ..OutputAsset::new("assets/theme-77.css", "a{}")
        });

        let result = parser.parse_output(&mut bundle).unwrap();
        assert!(bundle.is_empty());
        assert_eq!(result.emitted("src/theme.css").and_then(EmittedFile::text), Some("a{}"));
        assert_eq!(result.manifest.web_accessible_resources, None);
    }

    #[test]
    fn test_optimization_can_be_disabled() {
        let mut parser = parser(
            r#"{ "manifest_version": 2, "web_accessible_resources": ["z.png", "a.png", "z.png"] }"#,
            r#"{ "disableResourceOptimization": true }"#,
        );
        parser.parse_input().unwrap();

        let result = parser.parse_output(&mut OutputBundle::new()).unwrap();
        assert_eq!(
            result.manifest.web_accessible_resources,
            Some(WebAccessibleResources::V2(vec!["z.png".into(), "a.png".into(), "z.png".into()]))
        );
    }

    #[test]
    fn test_manifest_json_is_emitted_last() {
        let mut parser = parser(r#"{ "manifest_version": 3, "name": "demo" }"#, "{}");
        parser.parse_input().unwrap();

        let result = parser.parse_output(&mut OutputBundle::new()).unwrap();
        let last = result.emitted_files.last().unwrap();
        assert_eq!(last.file_name, MANIFEST_FILE);

        let written: Manifest = serde_json::from_str(last.text().unwrap()).unwrap();
        assert_eq!(written, result.manifest);
    }
}
