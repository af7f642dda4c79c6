//! Web extension manifest builder CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use webext_builder::dev::http::HttpDevServer;
use webext_builder::dev::{watcher, DevBuildOptions, DevBuilder};
use webext_builder::transformer::merge_dev_policy;
use webext_builder::{finish_build, prepare_build, OutputBundle};

#[derive(Parser)]
#[command(name = "webext-builder")]
#[command(about = "Resolve web extension manifests against bundler output", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the build entries a manifest implies
    Inputs {
        /// Path to manifest.json
        #[arg(short, long)]
        manifest: PathBuf,

        /// Build options file (JSON5)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Rewrite a manifest against a compiled bundle and write the extension
    Build {
        #[arg(short, long)]
        manifest: PathBuf,

        /// Compiled output set, as JSON keyed by file name
        #[arg(short, long)]
        bundle: PathBuf,

        /// Output directory
        #[arg(short, long)]
        out: PathBuf,

        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Write a development build that loads everything from a running dev server
    Dev {
        #[arg(short, long)]
        manifest: PathBuf,

        /// Dev server origin, e.g. http://localhost:5173
        #[arg(long)]
        origin: String,

        #[arg(short, long)]
        out: PathBuf,

        /// Project root page sources are read from
        #[arg(long, default_value = ".")]
        root: PathBuf,

        /// Directory copied into the output as-is
        #[arg(long)]
        public: Option<PathBuf>,

        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Keep running and regenerate pages and styles when they change
        #[arg(short, long)]
        watch: bool,
    },

    /// Print a content security policy extended for a dev server
    Csp {
        #[arg(long)]
        origin: String,

        /// Existing policy
        #[arg(long, default_value = "")]
        policy: String,

        /// Inline script hash source, e.g. 'sha256-...'
        #[arg(long = "hash")]
        hashes: Vec<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Inputs { manifest, config } => run_inputs(&manifest, config.as_deref()),
        Commands::Build {
            manifest,
            bundle,
            out,
            config,
        } => run_build(&manifest, &bundle, &out, config.as_deref()),
        Commands::Dev {
            manifest,
            origin,
            out,
            root,
            public,
            config,
            watch,
        } => run_dev(
            &manifest,
            config.as_deref(),
            &origin,
            DevBuildOptions {
                root,
                out_dir: out,
                public_dir: public,
            },
            watch,
        ),
        Commands::Csp { origin, policy, hashes } => {
            println!("{}", merge_dev_policy(&policy, &origin, &hashes));
            Ok(())
        }
    };

    if let Err(e) = outcome {
        eprintln!("{}", "❌ Failed!".red().bold());
        eprintln!("{}", format!("Error: {:#}", e).red());
        std::process::exit(1);
    }
}

fn run_inputs(manifest: &Path, config: Option<&Path>) -> Result<()> {
    let (_, result) = prepare_build(manifest, config)?;

    println!("{}", "📦 Build entries".bold().blue());
    for entry in result.entries.iter() {
        println!("  {} {} {}", entry.name.green(), "←".dimmed(), entry.input);
    }
    Ok(())
}

fn run_build(manifest: &Path, bundle_path: &Path, out: &Path, config: Option<&Path>) -> Result<()> {
    let (parser, _) = prepare_build(manifest, config)?;

    let bundle_json = std::fs::read_to_string(bundle_path)
        .with_context(|| format!("Failed to read bundle {}", bundle_path.display()))?;
    let mut bundle: OutputBundle = serde_json::from_str(&bundle_json).context("Failed to parse bundle")?;

    let written = finish_build(&parser, &mut bundle, out)?;

    println!("{}", "✅ Build written successfully!".green().bold());
    println!("  - Files: {}", bundle.len());
    println!("  - Content scripts: {}", written.content_scripts.len());
    println!("  - Output: {}", out.display());
    Ok(())
}

fn run_dev(manifest: &Path, config: Option<&Path>, origin: &str, options: DevBuildOptions, watch: bool) -> Result<()> {
    let (parser, _) = prepare_build(manifest, config)?;
    let server = HttpDevServer::new(origin)?;
    let builder = Arc::new(DevBuilder::new(&parser, Box::new(server), options)?);

    builder.write_build()?;
    println!("{}", "✅ Dev build written".green().bold());
    println!("  - Output: {}", builder.options().out_dir.display());

    if !watch {
        return Ok(());
    }

    let runtime = tokio::runtime::Runtime::new().context("Failed to initialize async runtime")?;
    runtime.block_on(async {
        tokio::select! {
            result = watcher::watch(Arc::clone(&builder)) => result,
            _ = tokio::signal::ctrl_c() => {
                println!("{}", "Stopped watching".dimmed());
                Ok(())
            }
        }
    })
}
