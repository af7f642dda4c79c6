//! Build options loading

use crate::models::BuildOptions;
use anyhow::{Context, Result};
use std::path::Path;

pub fn parse_options(content: &[u8]) -> Result<BuildOptions> {
    let content_str = std::str::from_utf8(content)
        .context("Invalid UTF-8 in options file")?;
    json5::from_str(content_str).context("Failed to parse build options")
}

pub fn parse_options_from_file(path: impl AsRef<Path>) -> Result<BuildOptions> {
    let path = path.as_ref();
    let content = std::fs::read(path)
        .with_context(|| format!("Failed to read options file {}", path.display()))?;
    parse_options(&content)
}
