//! flatpak-builder invocation
//!
//! The builder runs under `xvfb-run` so test processes that need a display
//! (enabled via the manifest patch) have a virtual one available.

use crate::error::{FlatbakeError, FlatbakeResult};
use crate::flatpak::{build_error_output, stream_child_output};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

/// Scratch directory the builder assembles the app into
pub const BUILD_DIR: &str = "flatpak_app";

/// Local OSTree repository the builder exports to
pub const LOCAL_REPO: &str = "repo";

/// Relative directory where flatpak-builder persists partial build state
pub const STATE_DIR: &str = ".flatpak-builder";

/// One build invocation
#[derive(Debug, Clone)]
pub struct BuildRequest {
    /// Manifest consumed by flatpak-builder
    pub manifest_path: PathBuf,
    /// Remote the builder installs dependencies from
    pub remote_name: String,
    /// Pass --ccache (only when the state-dir cache is enabled)
    pub ccache: bool,
}

/// Runs flatpak-builder inside a workspace directory
pub struct FlatpakBuilder {
    workspace: PathBuf,
}

impl FlatpakBuilder {
    /// Create a builder that runs with `workspace` as its working directory
    pub fn new(workspace: PathBuf) -> Self {
        Self { workspace }
    }

    /// Arguments passed to xvfb-run (flatpak-builder and all its flags)
    pub fn args(req: &BuildRequest) -> Vec<String> {
        let mut args = vec![
            "--auto-servernum".to_string(),
            "flatpak-builder".to_string(),
            format!("--repo={LOCAL_REPO}"),
            "--disable-rofiles-fuse".to_string(),
            format!("--install-deps-from={}", req.remote_name),
            "--force-clean".to_string(),
        ];
        if req.ccache {
            args.push("--ccache".to_string());
        }
        args.push(BUILD_DIR.to_string());
        args.push(req.manifest_path.display().to_string());
        args
    }

    /// Run the build, streaming output lines to `on_output`.
    ///
    /// Any non-zero exit is fatal; the error carries the output tail.
    pub async fn build(
        &self,
        req: &BuildRequest,
        on_output: &(dyn Fn(String) + Send + Sync),
    ) -> FlatbakeResult<()> {
        let args = Self::args(req);
        debug!("Executing: xvfb-run {:?}", args);

        let mut child = Command::new("xvfb-run")
            .args(&args)
            .current_dir(&self.workspace)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| FlatbakeError::command_failed("xvfb-run flatpak-builder", e))?;

        let output = stream_child_output(&mut child, on_output).await;

        let status = child
            .wait()
            .await
            .map_err(|e| FlatbakeError::command_failed("xvfb-run flatpak-builder", e))?;

        if status.success() {
            info!("flatpak-builder finished");
            Ok(())
        } else {
            Err(FlatbakeError::BuilderFailed {
                code: status.code().unwrap_or(-1),
                tail: build_error_output(&output),
            })
        }
    }
}
