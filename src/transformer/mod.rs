//! Manifest rewriting for extension builds

pub mod csp;
pub mod dependencies;
pub mod loaders;
pub mod manifest;
pub mod resources;
pub mod strategy;
pub mod v2;
pub mod v3;

pub use csp::{merge_dev_policy, SecurityPolicy};
pub use dependencies::{ChunkDependencies, DependencyWalker};
pub use loaders::{html_loader, script_loader, static_script_loader};
pub use manifest::{ManifestParser, CSS_PATHS_PLACEHOLDER, MANIFEST_FILE};
pub use resources::{optimize_v2, optimize_v3};
pub use strategy::{strategy_for, ManifestStrategy, ResourceGrant};
