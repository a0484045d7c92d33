//! Configuration schema for flatbake
//!
//! Configuration is stored at `~/.config/flatbake/config.toml`, with
//! optional project-local overrides in `.flatbake.toml`.

use crate::flatpak::{DEFAULT_REMOTE_NAME, DEFAULT_REMOTE_URL};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Bundle filename used when none is configured
pub const DEFAULT_BUNDLE: &str = "app.flatpak";

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Build settings
    pub build: BuildConfig,

    /// Dependency remote settings
    pub remote: RemoteConfig,

    /// Builder state cache settings
    pub cache: CacheConfig,

    /// Artifact publication settings
    pub artifacts: ArtifactsConfig,
}

/// Build settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Manifest path (required by `flatbake build` unless given on the CLI)
    pub manifest: Option<PathBuf>,

    /// Bundle output filename
    pub bundle: String,

    /// Run tests inside the build sandbox
    pub run_tests: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            manifest: None,
            bundle: DEFAULT_BUNDLE.to_string(),
            run_tests: false,
        }
    }
}

/// Dependency remote settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Symbolic remote name
    pub name: String,

    /// Remote URL; a custom remote is registered only when this differs
    /// from the default Flathub URL
    pub url: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_REMOTE_NAME.to_string(),
            url: DEFAULT_REMOTE_URL.to_string(),
        }
    }
}

/// Builder state cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache the builder state directory across runs (default: true)
    pub enabled: bool,

    /// Explicit cache key; derived from manifest bytes when unset
    pub key: Option<String>,

    /// Cache root directory (default: ~/.cache/flatbake)
    pub root: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            key: None,
            root: None,
        }
    }
}

/// Artifact publication settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactsConfig {
    /// Directory artifacts are published into
    pub dir: PathBuf,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("artifacts"),
        }
    }
}
