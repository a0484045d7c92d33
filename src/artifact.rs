//! Artifact publication
//!
//! `ArtifactStore` is the seam a CI platform artifact service would
//! implement. `DirArtifactStore` is the default backend: it copies the
//! bundle into a directory the CI job declares as its artifact payload.

use crate::error::{FlatbakeError, FlatbakeResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

/// Derive the artifact name from the bundle filename by stripping a
/// trailing `.flatpak` suffix.
pub fn artifact_name(bundle: &Path) -> String {
    let name = bundle
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    name.strip_suffix(".flatpak").unwrap_or(&name).to_string()
}

/// Abstract artifact store interface
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Publish `bundle` under `name`; returns where it landed.
    /// Failures here are fatal for the pipeline.
    async fn publish(&self, name: &str, bundle: &Path) -> FlatbakeResult<PathBuf>;
}

/// Directory-backed artifact store
pub struct DirArtifactStore {
    root: PathBuf,
}

impl DirArtifactStore {
    /// Create an artifact store rooted at `root` (created on publish)
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// The artifact root directory
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ArtifactStore for DirArtifactStore {
    async fn publish(&self, name: &str, bundle: &Path) -> FlatbakeResult<PathBuf> {
        let file_name = bundle
            .file_name()
            .ok_or_else(|| FlatbakeError::ArtifactPublish {
                name: name.to_string(),
                reason: format!("{} has no file name", bundle.display()),
            })?;

        let target_dir = self.root.join(name);
        fs::create_dir_all(&target_dir)
            .await
            .map_err(|e| FlatbakeError::ArtifactPublish {
                name: name.to_string(),
                reason: format!("creating {}: {e}", target_dir.display()),
            })?;

        let target = target_dir.join(file_name);
        fs::copy(bundle, &target)
            .await
            .map_err(|e| FlatbakeError::ArtifactPublish {
                name: name.to_string(),
                reason: format!("copying {}: {e}", bundle.display()),
            })?;

        info!("Published artifact {} -> {}", name, target.display());
        Ok(target)
    }
}
