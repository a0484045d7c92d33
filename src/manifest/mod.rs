//! Flatpak manifest loading and serialization
//!
//! A manifest is kept as a raw JSON mapping so unrecognized keys survive a
//! read/patch/write cycle untouched. The on-disk format (JSON or YAML) is
//! captured at load time and reused on save.

mod patch;

pub use patch::{TEST_DISPLAY, TEST_SANDBOX_ARGS};

use crate::error::{FlatbakeError, FlatbakeResult};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Branch used for bundling when the manifest does not declare one
pub const DEFAULT_BRANCH: &str = "master";

/// Serialization format of a manifest file, selected by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    /// `.json`
    Json,
    /// `.yaml` / `.yml`
    Yaml,
}

impl ManifestFormat {
    /// Determine the format from a file extension (ASCII case-insensitive)
    pub fn from_path(path: &Path) -> FlatbakeResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("json") => Ok(Self::Json),
            Some("yaml") | Some("yml") => Ok(Self::Yaml),
            _ => Err(FlatbakeError::UnsupportedManifestFormat(path.to_path_buf())),
        }
    }

    /// Human-readable format name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }
}

/// A parsed manifest bound to its on-disk path and format
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    path: PathBuf,
    format: ManifestFormat,
    root: Map<String, Value>,
}

impl Manifest {
    /// Load a manifest from disk, detecting the format from the extension
    pub async fn load(path: &Path) -> FlatbakeResult<Self> {
        let bytes = fs::read(path)
            .await
            .map_err(|e| FlatbakeError::io(format!("reading manifest {}", path.display()), e))?;
        Self::from_bytes(path, &bytes)
    }

    /// Parse a manifest from raw bytes already read from `path`
    pub fn from_bytes(path: &Path, bytes: &[u8]) -> FlatbakeResult<Self> {
        let format = ManifestFormat::from_path(path)?;

        let value: Value = match format {
            ManifestFormat::Json => serde_json::from_slice(bytes)
                .map_err(|e| FlatbakeError::manifest_invalid(path, e.to_string()))?,
            ManifestFormat::Yaml => serde_yaml::from_slice(bytes)
                .map_err(|e| FlatbakeError::manifest_invalid(path, e.to_string()))?,
        };

        let Value::Object(root) = value else {
            return Err(FlatbakeError::manifest_invalid(
                path,
                "top level must be a mapping",
            ));
        };

        Ok(Self {
            path: path.to_path_buf(),
            format,
            root,
        })
    }

    /// Serialize the manifest back to its original path, same format
    pub async fn save(&self) -> FlatbakeResult<()> {
        let rendered = self.render()?;
        fs::write(&self.path, rendered).await.map_err(|e| {
            FlatbakeError::io(format!("writing manifest {}", self.path.display()), e)
        })
    }

    /// Render the manifest in its on-disk format
    pub fn render(&self) -> FlatbakeResult<String> {
        let value = Value::Object(self.root.clone());
        match self.format {
            ManifestFormat::Json => {
                let mut out = serde_json::to_string_pretty(&value)?;
                out.push('\n');
                Ok(out)
            }
            ManifestFormat::Yaml => Ok(serde_yaml::to_string(&value)?),
        }
    }

    /// The path the manifest was loaded from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The detected on-disk format
    pub fn format(&self) -> ManifestFormat {
        self.format
    }

    /// Application id: `app-id`, falling back to `id`
    pub fn app_id(&self) -> Option<&str> {
        ["app-id", "id"]
            .iter()
            .filter_map(|k| self.root.get(*k))
            .filter_map(Value::as_str)
            .find(|s| !s.is_empty())
    }

    /// Declared branch, or the default when absent
    pub fn branch(&self) -> &str {
        self.root
            .get("branch")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_BRANCH)
    }

    /// Number of entries in the `modules` sequence (0 when absent)
    pub fn module_count(&self) -> usize {
        self.root
            .get("modules")
            .and_then(Value::as_array)
            .map_or(0, Vec::len)
    }

    /// Look up a top-level key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    pub(crate) fn root_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.root
    }
}
