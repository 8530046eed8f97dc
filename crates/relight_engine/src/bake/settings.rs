//! Bake run settings

use crate::config::Config;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Settings for one bake run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BakeSettings {
    /// Bake directional lightmaps
    pub directional: bool,
    /// Root directory for stored results
    pub output_root: PathBuf,
    /// File extension of stored results
    pub extension: String,
    /// Restrict the run to these address paths; empty bakes everything
    pub only: Vec<String>,
}

impl Default for BakeSettings {
    fn default() -> Self {
        Self {
            directional: false,
            output_root: PathBuf::from("baked"),
            extension: "png".to_string(),
            only: Vec::new(),
        }
    }
}

impl Config for BakeSettings {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let settings = BakeSettings::from_toml_str("directional = true\nonly = [\"emitter/0\"]").unwrap();
        assert!(settings.directional);
        assert_eq!(settings.output_root, PathBuf::from("baked"));
        assert_eq!(settings.extension, "png");
        assert_eq!(settings.only, vec!["emitter/0".to_string()]);
    }
}
