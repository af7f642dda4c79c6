//! Writing build results to disk

pub mod builder;

use crate::models::{EmittedFile, OutputAsset, OutputBundle};

pub use builder::{clear_directory, copy_directory, write_bundle, write_file};

/// Add emitted files to the bundle as assets, replacing same-named items
pub fn emit_into_bundle(bundle: &mut OutputBundle, files: Vec<EmittedFile>) {
    for file in files {
        bundle.insert_asset(OutputAsset::new(file.file_name, file.source));
    }
}
