//! Build configuration

use super::inputs::{normalize_additional_inputs, AdditionalInput, AdditionalInputConfig};
use crate::error::Result;
use indexmap::IndexMap;
use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildOptions {
    /// `scripts`, `html` and `styles` lists of files that are built but not named by the manifest
    pub additional_inputs: IndexMap<String, Vec<AdditionalInputConfig>>,

    /// Leave `web_accessible_resources` exactly as accumulated
    pub disable_resource_optimization: bool,

    /// Do not set `use_dynamic_url` on generated resource declarations
    pub disable_dynamic_url: bool,
}

impl BuildOptions {
    pub fn additional_inputs(&self) -> Result<Vec<AdditionalInput>> {
        normalize_additional_inputs(&self.additional_inputs)
    }

    /// `use_dynamic_url` value for generated generation 3 declarations
    pub fn dynamic_url(&self) -> Option<bool> {
        if self.disable_dynamic_url {
            None
        } else {
            Some(true)
        }
    }
}
