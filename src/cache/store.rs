//! Cache store backends
//!
//! `BuildCache` is the seam a CI platform cache service would implement.
//! `DirCache` is the default backend: one subdirectory per key under a
//! cache root (typically a mounted cache volume on the runner), with a
//! small metadata file recording when the entry was saved.

use crate::error::{FlatbakeError, FlatbakeResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tokio::fs;
use tracing::debug;

/// Metadata file name inside each cache entry
const META_FILE: &str = "meta.json";

/// Abstract cache store interface
///
/// Restore and save are best-effort from the pipeline's point of view; the
/// backend itself reports errors normally and the caller decides fatality.
#[async_trait]
pub trait BuildCache: Send + Sync {
    /// Restore the cached `paths` into `workspace` for `key`, falling back
    /// to the newest entry matching each prefix in order on an exact miss.
    /// Returns the key of the entry actually restored, if any.
    async fn restore(
        &self,
        key: &str,
        fallback_prefixes: &[&str],
        workspace: &Path,
        paths: &[&str],
    ) -> FlatbakeResult<Option<String>>;

    /// Save `paths` from `workspace` under `key`, replacing any existing
    /// entry for that key.
    async fn save(&self, key: &str, workspace: &Path, paths: &[&str]) -> FlatbakeResult<()>;
}

/// Metadata stored alongside each cache entry
#[derive(Debug, Serialize, Deserialize)]
struct EntryMeta {
    key: String,
    saved_at: DateTime<Utc>,
}

/// Directory-backed cache store
pub struct DirCache {
    root: PathBuf,
}

impl DirCache {
    /// Create a cache store rooted at `root` (created lazily on save)
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// The cache root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_dir(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    async fn entry_saved_at(&self, entry_dir: &Path) -> DateTime<Utc> {
        let meta_path = entry_dir.join(META_FILE);
        match fs::read(&meta_path).await {
            Ok(bytes) => serde_json::from_slice::<EntryMeta>(&bytes)
                .map(|m| m.saved_at)
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
            Err(_) => DateTime::<Utc>::MIN_UTC,
        }
    }

    /// Find the entry for `key`, or the newest entry matching each fallback
    /// prefix in order.
    async fn find_entry(
        &self,
        key: &str,
        fallback_prefixes: &[&str],
    ) -> FlatbakeResult<Option<(String, PathBuf)>> {
        let exact = self.entry_dir(key);
        if fs::metadata(&exact).await.map(|m| m.is_dir()).unwrap_or(false) {
            return Ok(Some((key.to_string(), exact)));
        }

        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            // No cache root yet means no entries at all
            Err(_) => return Ok(None),
        };

        let mut candidates: Vec<(String, PathBuf, DateTime<Utc>)> = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| FlatbakeError::io(format!("reading cache root {}", self.root.display()), e))?
        {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let saved_at = self.entry_saved_at(&path).await;
            candidates.push((name, path, saved_at));
        }

        for prefix in fallback_prefixes {
            let hit = candidates
                .iter()
                .filter(|(name, _, _)| name.starts_with(prefix))
                .max_by_key(|(_, _, saved_at)| *saved_at);
            if let Some((name, path, _)) = hit {
                debug!("Cache prefix match: {} (prefix {})", name, prefix);
                return Ok(Some((name.clone(), path.clone())));
            }
        }

        Ok(None)
    }
}

#[async_trait]
impl BuildCache for DirCache {
    async fn restore(
        &self,
        key: &str,
        fallback_prefixes: &[&str],
        workspace: &Path,
        paths: &[&str],
    ) -> FlatbakeResult<Option<String>> {
        let Some((matched_key, entry_dir)) = self.find_entry(key, fallback_prefixes).await? else {
            return Ok(None);
        };

        for rel in paths {
            let src = entry_dir.join(rel);
            if fs::metadata(&src).await.is_err() {
                continue;
            }
            let dst = workspace.join(rel);
            remove_existing(&dst).await;
            copy_tree(src, dst).await?;
        }

        debug!("Restored cache entry {}", matched_key);
        Ok(Some(matched_key))
    }

    async fn save(&self, key: &str, workspace: &Path, paths: &[&str]) -> FlatbakeResult<()> {
        fs::create_dir_all(&self.root).await.map_err(|e| {
            FlatbakeError::io(format!("creating cache root {}", self.root.display()), e)
        })?;

        let entry_dir = self.entry_dir(key);
        remove_existing(&entry_dir).await;
        fs::create_dir_all(&entry_dir).await.map_err(|e| {
            FlatbakeError::io(format!("creating cache entry {}", entry_dir.display()), e)
        })?;

        let mut stored = 0usize;
        for rel in paths {
            let src = workspace.join(rel);
            if fs::metadata(&src).await.is_err() {
                continue;
            }
            copy_tree(src, entry_dir.join(rel)).await?;
            stored += 1;
        }

        if stored == 0 {
            // Do not leave an empty entry behind for find_entry to match
            let _ = fs::remove_dir_all(&entry_dir).await;
            return Err(FlatbakeError::CacheEntry {
                key: key.to_string(),
                reason: "none of the cached paths exist in the workspace".to_string(),
            });
        }

        let meta = EntryMeta {
            key: key.to_string(),
            saved_at: Utc::now(),
        };
        let meta_path = entry_dir.join(META_FILE);
        fs::write(&meta_path, serde_json::to_vec_pretty(&meta)?)
            .await
            .map_err(|e| FlatbakeError::io(format!("writing {}", meta_path.display()), e))?;

        debug!("Saved cache entry {}", key);
        Ok(())
    }
}

async fn remove_existing(path: &Path) {
    match fs::metadata(path).await {
        Ok(meta) if meta.is_dir() => {
            let _ = fs::remove_dir_all(path).await;
        }
        Ok(_) => {
            let _ = fs::remove_file(path).await;
        }
        Err(_) => {}
    }
}

/// Recursively copy a file or directory tree, recreating symlinks.
fn copy_tree(
    src: PathBuf,
    dst: PathBuf,
) -> Pin<Box<dyn Future<Output = FlatbakeResult<()>> + Send>> {
    Box::pin(async move {
        let meta = fs::symlink_metadata(&src)
            .await
            .map_err(|e| FlatbakeError::io(format!("stat {}", src.display()), e))?;

        if meta.is_dir() {
            fs::create_dir_all(&dst)
                .await
                .map_err(|e| FlatbakeError::io(format!("creating {}", dst.display()), e))?;
            let mut entries = fs::read_dir(&src)
                .await
                .map_err(|e| FlatbakeError::io(format!("reading {}", src.display()), e))?;
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| FlatbakeError::io(format!("reading {}", src.display()), e))?
            {
                copy_tree(entry.path(), dst.join(entry.file_name())).await?;
            }
        } else if meta.file_type().is_symlink() {
            // flatpak-builder state dirs use relative symlinks for ccache
            #[cfg(unix)]
            {
                let target = fs::read_link(&src)
                    .await
                    .map_err(|e| FlatbakeError::io(format!("readlink {}", src.display()), e))?;
                if let Some(parent) = dst.parent() {
                    fs::create_dir_all(parent).await.map_err(|e| {
                        FlatbakeError::io(format!("creating {}", parent.display()), e)
                    })?;
                }
                let _ = fs::remove_file(&dst).await;
                fs::symlink(&target, &dst)
                    .await
                    .map_err(|e| FlatbakeError::io(format!("symlink {}", dst.display()), e))?;
            }
            #[cfg(not(unix))]
            debug!("Skipping symlink {}", src.display());
        } else {
            if let Some(parent) = dst.parent() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| FlatbakeError::io(format!("creating {}", parent.display()), e))?;
            }
            fs::copy(&src, &dst).await.map_err(|e| {
                FlatbakeError::io(
                    format!("copying {} to {}", src.display(), dst.display()),
                    e,
                )
            })?;
        }

        Ok(())
    })
}
