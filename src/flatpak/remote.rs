//! flatpak remote registration and bundle creation

use crate::error::{FlatbakeError, FlatbakeResult};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

/// Symbolic name of the default public remote
pub const DEFAULT_REMOTE_NAME: &str = "flathub";

/// URL of the default public remote; custom remotes are registered only when
/// the configured URL differs from this exact string.
pub const DEFAULT_REMOTE_URL: &str = "https://flathub.org/repo/flathub.flatpakrepo";

/// Arguments for `flatpak remote-add`
fn remote_add_args(name: &str, url: &str) -> Vec<String> {
    vec![
        "remote-add".to_string(),
        "--if-not-exists".to_string(),
        name.to_string(),
        url.to_string(),
    ]
}

/// Register a custom remote when the configured URL is not the default.
///
/// Idempotent (`--if-not-exists`); a non-zero exit is fatal since the build
/// cannot install dependencies without its declared source.
pub async fn prepare_remote(name: &str, url: &str) -> FlatbakeResult<()> {
    if url == DEFAULT_REMOTE_URL {
        debug!("Using default remote, no registration needed");
        return Ok(());
    }

    let args = remote_add_args(name, url);
    debug!("Executing: flatpak {:?}", args);

    let output = Command::new("flatpak")
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| FlatbakeError::command_failed("flatpak remote-add", e))?;

    if output.status.success() {
        info!("Registered remote {} ({})", name, url);
        Ok(())
    } else {
        Err(FlatbakeError::RemoteRegistration {
            name: name.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// One bundle-creation invocation
#[derive(Debug, Clone)]
pub struct BundleRequest {
    /// Output bundle file
    pub bundle_path: PathBuf,
    /// Runtime source repository recorded as bundle metadata
    pub runtime_repo_url: String,
    /// Application id from the manifest
    pub app_id: String,
    /// Branch from the manifest (or the default)
    pub branch: String,
}

/// Arguments for `flatpak build-bundle`
fn bundle_args(local_repo: &str, req: &BundleRequest) -> Vec<String> {
    vec![
        "build-bundle".to_string(),
        local_repo.to_string(),
        req.bundle_path.display().to_string(),
        format!("--runtime-repo={}", req.runtime_repo_url),
        req.app_id.clone(),
        req.branch.clone(),
    ]
}

/// Produce the single-file bundle from the local repository the builder
/// exported to. Non-zero exit is fatal.
pub async fn bundle(local_repo: &str, req: &BundleRequest, workspace: &Path) -> FlatbakeResult<()> {
    let args = bundle_args(local_repo, req);
    debug!("Executing: flatpak {:?}", args);

    let output = Command::new("flatpak")
        .args(&args)
        .current_dir(workspace)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| FlatbakeError::command_failed("flatpak build-bundle", e))?;

    if output.status.success() {
        info!("Bundle written to {}", req.bundle_path.display());
        Ok(())
    } else {
        Err(FlatbakeError::BundleFailed {
            code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}
