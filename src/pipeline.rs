//! The build pipeline
//!
//! A strictly sequential run: load manifest, resolve the cache key from the
//! raw bytes, register the remote, restore the builder state cache, patch
//! the manifest for tests, build, save the cache, bundle, publish. Only the
//! cache steps are best-effort; every other failure aborts the run.

use crate::artifact::{artifact_name, ArtifactStore};
use crate::cache::{resolve_key, BuildCache, FALLBACK_PREFIXES};
use crate::error::{FlatbakeError, FlatbakeResult};
use crate::flatpak::{
    self, bundle, prepare_remote, BuildRequest, BundleRequest, FlatpakBuilder, LOCAL_REPO,
    STATE_DIR,
};
use crate::manifest::{Manifest, ManifestFormat};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info};

/// Everything a single pipeline run needs, resolved up front
#[derive(Debug, Clone)]
pub struct BuildPlan {
    /// Directory the builder runs in; cached paths are relative to it
    pub workspace: PathBuf,
    /// Manifest path (workspace-relative paths are resolved against it)
    pub manifest_path: PathBuf,
    /// Patch the manifest and run tests inside the build sandbox
    pub run_tests: bool,
    /// Bundle output filename, relative to the workspace
    pub bundle: String,
    /// Symbolic name of the dependency remote
    pub remote_name: String,
    /// URL of the dependency remote
    pub remote_url: String,
    /// Cache the builder state directory across runs
    pub cache_enabled: bool,
    /// Explicit cache key; derived from manifest bytes when empty
    pub cache_key: Option<String>,
}

/// Outcome of a successful pipeline run
#[derive(Debug, Clone)]
pub struct BuildReport {
    /// Application id from the manifest
    pub app_id: String,
    /// Branch recorded in the bundle
    pub branch: String,
    /// Resolved cache key (None when caching is disabled)
    pub cache_key: Option<String>,
    /// Key of the cache entry that was restored, if any
    pub cache_restored: Option<String>,
    /// Whether the manifest was patched for tests
    pub tests_enabled: bool,
    /// Absolute path of the produced bundle
    pub bundle_path: PathBuf,
    /// Artifact name (bundle filename minus `.flatpak`)
    pub artifact_name: String,
    /// Where the artifact was published
    pub artifact_path: PathBuf,
}

/// Run the whole pipeline. `on_build_output` receives each line of builder
/// output as it streams.
pub async fn run_pipeline(
    plan: &BuildPlan,
    cache: &dyn BuildCache,
    artifacts: &dyn ArtifactStore,
    on_build_output: &(dyn Fn(String) + Send + Sync),
) -> FlatbakeResult<BuildReport> {
    let manifest_path = if plan.manifest_path.is_absolute() {
        plan.manifest_path.clone()
    } else {
        plan.workspace.join(&plan.manifest_path)
    };

    // Unsupported extensions halt before any file or process access
    ManifestFormat::from_path(&manifest_path)?;

    // Raw on-disk bytes, read before any patching: the cache key must be
    // derived from exactly what the caller committed.
    let raw = fs::read(&manifest_path)
        .await
        .map_err(|e| FlatbakeError::io(format!("reading manifest {}", manifest_path.display()), e))?;
    let mut manifest = Manifest::from_bytes(&manifest_path, &raw)?;

    let app_id = manifest
        .app_id()
        .ok_or_else(|| FlatbakeError::MissingAppId(manifest_path.clone()))?
        .to_string();
    let branch = manifest.branch().to_string();
    info!("Building {} (branch {})", app_id, branch);

    let cache_key = plan
        .cache_enabled
        .then(|| resolve_key(plan.cache_key.as_deref(), &raw));

    flatpak::ensure_tools().await?;
    prepare_remote(&plan.remote_name, &plan.remote_url).await?;

    let cache_restored = match &cache_key {
        Some(key) => restore_best_effort(cache, key, &plan.workspace).await,
        None => None,
    };

    if plan.run_tests {
        manifest.enable_tests()?;
        manifest.save().await?;
        info!("Manifest patched for sandboxed test execution");
    }

    let builder = FlatpakBuilder::new(plan.workspace.clone());
    let request = BuildRequest {
        manifest_path: manifest_path.clone(),
        remote_name: plan.remote_name.clone(),
        ccache: plan.cache_enabled,
    };
    builder.build(&request, on_build_output).await?;

    // The bundle has not been produced yet, but the builder state is
    // complete; a save failure here must never fail the run.
    if let Some(key) = &cache_key {
        save_best_effort(cache, key, &plan.workspace).await;
    }

    let bundle_request = BundleRequest {
        bundle_path: PathBuf::from(&plan.bundle),
        runtime_repo_url: plan.remote_url.clone(),
        app_id: app_id.clone(),
        branch: branch.clone(),
    };
    bundle(LOCAL_REPO, &bundle_request, &plan.workspace).await?;
    let bundle_path = plan.workspace.join(&plan.bundle);

    let name = artifact_name(&bundle_path);
    let artifact_path = artifacts.publish(&name, &bundle_path).await?;

    Ok(BuildReport {
        app_id,
        branch,
        cache_key,
        cache_restored,
        tests_enabled: plan.run_tests,
        bundle_path,
        artifact_name: name,
        artifact_path,
    })
}

/// Cache restore never fails the pipeline; a miss or error is informational.
async fn restore_best_effort(
    cache: &dyn BuildCache,
    key: &str,
    workspace: &Path,
) -> Option<String> {
    match cache
        .restore(key, &FALLBACK_PREFIXES, workspace, &[STATE_DIR])
        .await
    {
        Ok(Some(hit)) => {
            info!("Restored build state from cache entry {}", hit);
            Some(hit)
        }
        Ok(None) => {
            info!("No cache found for key {}", key);
            None
        }
        Err(e) => {
            info!("No cache found for key {} ({})", key, e);
            None
        }
    }
}

/// Cache save is best-effort: the build already succeeded, so failures are
/// logged and swallowed.
async fn save_best_effort(cache: &dyn BuildCache, key: &str, workspace: &Path) {
    match cache.save(key, workspace, &[STATE_DIR]).await {
        Ok(()) => info!("Saved build state under cache key {}", key),
        Err(e) => error!("Cache save failed for key {}: {}", key, e),
    }
}
