use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::common::paths;

fn default_market() -> String {
    "fr-FR".to_string()
}

fn default_resolution() -> String {
    "1920x1080".to_string()
}

/// Service configuration. The file is optional; a missing file gives the
/// stock behavior.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ServiceConfig {
    /// Market passed to the image-of-the-day endpoint
    #[serde(default = "default_market")]
    pub market: String,
    /// Resolution suffix of the derived image URL
    #[serde(default = "default_resolution")]
    pub resolution: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            market: default_market(),
            resolution: default_resolution(),
        }
    }
}

impl ServiceConfig {
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(paths::config_dir()?.join("config.toml"))
    }

    pub fn load() -> Result<Self> {
        let cfg_path = Self::config_file_path()?;
        if !cfg_path.exists() {
            return Ok(Self::default());
        }

        let s = fs::read_to_string(&cfg_path)
            .with_context(|| format!("reading config {}", cfg_path.display()))?;
        toml::from_str(&s).context("parsing config toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.market, "fr-FR");
        assert_eq!(config.resolution, "1920x1080");
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: ServiceConfig = toml::from_str("market = \"en-US\"").unwrap();
        assert_eq!(config.market, "en-US");
        assert_eq!(config.resolution, "1920x1080");
    }

    #[test]
    fn test_empty_config_is_default() {
        let config: ServiceConfig = toml::from_str("").unwrap();
        assert_eq!(config.market, "fr-FR");
        assert_eq!(config.resolution, "1920x1080");
    }
}
