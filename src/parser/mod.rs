//! Loading of manifests and build options

pub mod manifest;
pub mod config;

pub use manifest::{parse_manifest, parse_manifest_from_file, parse_manifest_from_str};
pub use config::{parse_options, parse_options_from_file};
