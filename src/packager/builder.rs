//! Output directory writing

use crate::models::{OutputBundle, OutputItem};
use crate::utils::helpers::{escapes_root, normalize_path};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Write one file below `output_path`, creating parent directories
pub fn write_file(output_path: &Path, file_name: &str, contents: impl AsRef<[u8]>) -> Result<()> {
    if escapes_root(file_name) {
        anyhow::bail!("Refusing to write {} outside {}", file_name, output_path.display());
    }
    let file_path = output_path.join(normalize_path(file_name));
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    fs::write(&file_path, contents).with_context(|| format!("Failed to write {}", file_path.display()))
}

/// Remove everything below `output_path` and recreate it empty
pub fn clear_directory(output_path: &Path) -> Result<()> {
    if output_path.exists() {
        fs::remove_dir_all(output_path)
            .with_context(|| format!("Failed to clear {}", output_path.display()))?;
    }
    fs::create_dir_all(output_path).with_context(|| format!("Failed to create {}", output_path.display()))
}

/// Copy a directory tree into `output_path`, keeping relative paths. Returns the file count.
pub fn copy_directory(source_dir: &Path, output_path: &Path) -> Result<usize> {
    let mut copied = 0;

    for entry in WalkDir::new(source_dir).into_iter().filter_map(|e| e.ok()) {
        let path = entry.path();
        if path.is_file() {
            let relative_path = path
                .strip_prefix(source_dir)
                .context("Failed to get relative path")?;
            let dest_path = output_path.join(relative_path);
            if let Some(parent) = dest_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(path, &dest_path).with_context(|| format!("Failed to copy {}", path.display()))?;
            copied += 1;
        }
    }

    Ok(copied)
}

/// Write every chunk and asset of a finished bundle
pub fn write_bundle(bundle: &OutputBundle, output_path: &Path) -> Result<()> {
    fs::create_dir_all(output_path)?;

    for item in bundle.iter() {
        match item {
            OutputItem::Chunk(chunk) => write_file(output_path, &chunk.file_name, &chunk.code)?,
            OutputItem::Asset(asset) => write_file(output_path, &asset.file_name, asset.source.as_bytes())?,
        }
    }

    Ok(())
}
