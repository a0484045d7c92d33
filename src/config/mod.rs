//! Configuration management for flatbake

pub mod schema;

pub use schema::{Config, DEFAULT_BUNDLE};

use crate::error::{FlatbakeError, FlatbakeResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Name of the project-local config file
pub const LOCAL_CONFIG_NAME: &str = ".flatbake.toml";

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("flatbake")
            .join("config.toml")
    }

    /// Get the default cache root directory
    pub fn default_cache_root() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from(".cache"))
            .join("flatbake")
    }

    /// Walk up from `start` looking for a project-local config file
    pub fn find_local_config(start: &Path) -> Option<PathBuf> {
        let mut dir = Some(start);
        while let Some(current) = dir {
            let candidate = current.join(LOCAL_CONFIG_NAME);
            if candidate.is_file() {
                return Some(candidate);
            }
            dir = current.parent();
        }
        None
    }

    /// Load configuration, creating default if not exists
    pub async fn load(&self) -> FlatbakeResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> FlatbakeResult<Config> {
        let value = Self::read_value(path).await?;
        value.try_into().map_err(|e: toml::de::Error| {
            FlatbakeError::ConfigInvalid {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })
    }

    /// Load the global config merged with an optional project-local one.
    /// Local keys override global keys; missing keys fall back to defaults.
    pub async fn load_merged(&self, local_path: Option<&Path>) -> FlatbakeResult<Config> {
        let mut value = if self.config_path.exists() {
            Self::read_value(&self.config_path).await?
        } else {
            toml::Value::Table(toml::map::Map::new())
        };

        if let Some(path) = local_path {
            let local = Self::read_value(path).await?;
            merge_values(&mut value, local);
        }

        value.try_into().map_err(|e: toml::de::Error| {
            FlatbakeError::ConfigInvalid {
                path: self.config_path.clone(),
                reason: e.to_string(),
            }
        })
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> FlatbakeResult<()> {
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            FlatbakeError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// Ensure the config directory exists
    async fn ensure_config_dir(&self) -> FlatbakeResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| FlatbakeError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    async fn read_value(path: &Path) -> FlatbakeResult<toml::Value> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| FlatbakeError::io(format!("reading config from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| FlatbakeError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a CI-style boolean-like switch value.
///
/// Accepts `y|yes|true|enabled|on|1` and `n|no|false|disabled|off|0`,
/// ASCII case-insensitive. Anything else is a configuration error rather
/// than silently defaulting to false.
pub fn parse_switch(s: &str) -> FlatbakeResult<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" | "true" | "enabled" | "on" | "1" => Ok(true),
        "n" | "no" | "false" | "disabled" | "off" | "0" => Ok(false),
        _ => Err(FlatbakeError::InvalidSwitch(s.to_string())),
    }
}

/// Deep-merge `overlay` into `base`: tables merge key by key, everything
/// else is replaced by the overlay value.
fn merge_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                match base_table.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_table.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_default_when_missing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nonexistent.toml");
        let manager = ConfigManager::with_path(path);

        let config = manager.load().await.unwrap();
        assert_eq!(config.remote.name, "flathub");
    }

    #[tokio::test]
    async fn save_and_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        let manager = ConfigManager::with_path(path);

        let mut config = Config::default();
        config.build.bundle = "custom.flatpak".to_string();

        manager.save(&config).await.unwrap();
        let loaded = manager.load().await.unwrap();

        assert_eq!(loaded.build.bundle, "custom.flatpak");
    }

    #[tokio::test]
    async fn local_config_overrides_global() {
        let temp = TempDir::new().unwrap();
        let global = temp.path().join("config.toml");
        let local = temp.path().join(".flatbake.toml");
        std::fs::write(
            &global,
            "[remote]\nname = \"global-remote\"\n[build]\nbundle = \"g.flatpak\"\n",
        )
        .unwrap();
        std::fs::write(&local, "[remote]\nname = \"local-remote\"\n").unwrap();

        let manager = ConfigManager::with_path(global);
        let config = manager.load_merged(Some(&local)).await.unwrap();

        // Local wins where set, global survives where not, defaults fill the rest
        assert_eq!(config.remote.name, "local-remote");
        assert_eq!(config.build.bundle, "g.flatpak");
        assert!(config.cache.enabled);
    }

    #[tokio::test]
    async fn invalid_config_is_reported() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "not [valid toml").unwrap();

        let manager = ConfigManager::with_path(path);
        let result = manager.load().await;
        assert!(matches!(result, Err(FlatbakeError::ConfigInvalid { .. })));
    }

    #[test]
    fn find_local_config_walks_up() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(LOCAL_CONFIG_NAME), "").unwrap();
        let nested = temp.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let found = ConfigManager::find_local_config(&nested).unwrap();
        assert_eq!(found, temp.path().join(LOCAL_CONFIG_NAME));
    }

    #[test]
    fn find_local_config_none() {
        let temp = TempDir::new().unwrap();
        assert!(ConfigManager::find_local_config(temp.path()).is_none());
    }

    #[test]
    fn parse_switch_accepts_ci_spellings() {
        for value in ["y", "yes", "true", "enabled", "on", "1", "TRUE", "Yes", " true "] {
            assert!(parse_switch(value).unwrap(), "{value} should be true");
        }
        for value in ["n", "no", "false", "disabled", "off", "0", "FALSE"] {
            assert!(!parse_switch(value).unwrap(), "{value} should be false");
        }
    }

    #[test]
    fn parse_switch_rejects_unrecognized() {
        for value in ["maybe", "", "2", "yep"] {
            assert!(matches!(
                parse_switch(value),
                Err(FlatbakeError::InvalidSwitch(_))
            ));
        }
    }
}
