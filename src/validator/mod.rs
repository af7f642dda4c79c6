//! Validation module

pub mod structure;

use crate::error::{ManifestError, Result};
use crate::models::{Manifest, OutputBundle};
use tracing::debug;

pub use structure::{file_references, FileReference};

/// Check that every file the final manifest names is part of the output set
pub fn validate_output(manifest: &Manifest, bundle: &OutputBundle) -> Result<()> {
    let references = file_references(manifest)?;
    debug!(references = references.len(), "validating manifest references");

    match references.into_iter().find(|reference| !bundle.contains(&reference.file)) {
        Some(missing) => Err(ManifestError::UnresolvedReference {
            field: missing.field,
            file: missing.file,
        }),
        None => Ok(()),
    }
}
