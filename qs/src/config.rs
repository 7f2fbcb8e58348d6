//! Configuration for queuestore

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Same file shape as the sender's config; keys `qs` doesn't use are ignored
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Path to the record file
    #[serde(rename = "store-path", default = "default_store_path")]
    pub store_path: PathBuf,
}

fn default_store_path() -> PathBuf {
    PathBuf::from(crate::DEFAULT_STORE_PATH)
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
        }
    }
}

impl Config {
    /// Load config from file, or use defaults
    pub fn load(path: Option<&PathBuf>) -> Result<Self> {
        if let Some(config_path) = path {
            let content = std::fs::read_to_string(config_path)
                .context(format!("Failed to read config: {}", config_path.display()))?;
            let config: Config = serde_yaml::from_str(&content)?;
            return Ok(config);
        }

        // Try default locations
        let default_paths = [
            Some(PathBuf::from(".queuestore.yml")),
            dirs::config_dir().map(|p| p.join("queuestore").join("queuestore.yml")),
        ];

        for path in default_paths.iter().flatten() {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let config: Config = serde_yaml::from_str(&content)?;
                return Ok(config);
            }
        }

        Ok(Config::default())
    }
}
