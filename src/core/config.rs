use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

const CONFIG_FILE: &str = "config.json";

/// Application data directory (bottles, winetricks, config)
pub fn data_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_default().join(".cellar")
}

/// Application preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where bottle prefixes live
    pub bottle_dir: PathBuf,
    /// Log output of wine programs at debug level
    #[serde(default)]
    pub enable_tracing: bool,
}

impl AppConfig {
    pub fn default_with(data_dir: &Path) -> Self {
        Self {
            bottle_dir: data_dir.join("prefixes"),
            enable_tracing: false,
        }
    }

    /// Load the config, falling back to defaults when the file is missing
    /// or unreadable.
    pub fn load(data_dir: &Path) -> Self {
        let path = data_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Self::default_with(data_dir);
        }
        match fs::read_to_string(&path)
            .map_err(anyhow::Error::from)
            .and_then(|content| serde_json::from_str(&content).map_err(anyhow::Error::from))
        {
            Ok(config) => config,
            Err(err) => {
                warn!(path = %path.display(), %err, "unreadable config, using defaults");
                Self::default_with(data_dir)
            }
        }
    }

    pub fn save(&self, data_dir: &Path) -> Result<()> {
        fs::create_dir_all(data_dir)
            .with_context(|| format!("Could not create {}", data_dir.display()))?;
        let path = data_dir.join(CONFIG_FILE);
        let content = serde_json::to_string_pretty(self)?;
        fs::write(&path, content).with_context(|| format!("Could not write {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_config_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::load(dir.path());
        assert_eq!(config.bottle_dir, dir.path().join("prefixes"));
        assert!(!config.enable_tracing);
    }

    #[test]
    fn config_round_trips() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig {
            bottle_dir: PathBuf::from("/somewhere/else"),
            enable_tracing: true,
        };
        config.save(dir.path()).unwrap();
        assert_eq!(AppConfig::load(dir.path()), config);
    }

    #[test]
    fn corrupt_config_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "{ not json").unwrap();
        let config = AppConfig::load(dir.path());
        assert_eq!(config, AppConfig::default_with(dir.path()));
    }
}
