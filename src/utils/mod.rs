//! Shared utilities

pub mod helpers;
pub mod virtual_modules;

pub use virtual_modules::VirtualModules;
