//! Core data models for manifest rewriting

pub mod manifest;
pub mod inputs;
pub mod bundle;
pub mod build;
pub mod options;

pub use manifest::*;
pub use inputs::*;
pub use bundle::*;
pub use build::*;
pub use options::*;
