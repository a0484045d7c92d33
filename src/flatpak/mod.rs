//! Flatpak tooling orchestration
//!
//! Thin wrappers over the external `flatpak` and `flatpak-builder` CLIs.
//! flatbake never reimplements any of their behavior; it only assembles
//! argument vectors, streams output and maps exit codes to errors.

mod builder;
mod remote;

pub use builder::{BuildRequest, FlatpakBuilder, BUILD_DIR, LOCAL_REPO, STATE_DIR};
pub use remote::{bundle, prepare_remote, BundleRequest, DEFAULT_REMOTE_NAME, DEFAULT_REMOTE_URL};

use crate::error::{FlatbakeError, FlatbakeResult};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

/// Max number of output lines to include in build error messages.
const BUILD_ERROR_TAIL_LINES: usize = 50;

/// Extract the useful tail of build output for error diagnostics.
///
/// Returns the last `BUILD_ERROR_TAIL_LINES` lines so error messages are
/// actionable without being overwhelming.
pub(crate) fn build_error_output(lines: &[String]) -> String {
    let total = lines.len();
    let tail = if total > BUILD_ERROR_TAIL_LINES {
        &lines[total - BUILD_ERROR_TAIL_LINES..]
    } else {
        lines
    };
    tail.join("\n")
}

/// Stream stdout+stderr from a child process, calling `on_output` for each line.
///
/// Returns all collected output lines for error reporting. This is a standalone
/// async function to avoid lifetime issues with the `dyn Fn` callback.
pub(crate) async fn stream_child_output(
    child: &mut tokio::process::Child,
    on_output: &(dyn Fn(String) + Send + Sync),
) -> Vec<String> {
    let stderr = child.stderr.take().expect("stderr piped");
    let stdout = child.stdout.take().expect("stdout piped");

    let mut stderr_reader = BufReader::new(stderr).lines();
    let mut stdout_reader = BufReader::new(stdout).lines();

    let mut all_output = Vec::new();
    let mut stderr_done = false;
    let mut stdout_done = false;

    while !stderr_done || !stdout_done {
        tokio::select! {
            line = stderr_reader.next_line(), if !stderr_done => {
                match line {
                    Ok(Some(line)) => {
                        on_output(line.clone());
                        all_output.push(line);
                    }
                    _ => stderr_done = true,
                }
            }
            line = stdout_reader.next_line(), if !stdout_done => {
                match line {
                    Ok(Some(line)) => {
                        on_output(line.clone());
                        all_output.push(line);
                    }
                    _ => stdout_done = true,
                }
            }
        }
    }

    all_output
}

/// Check whether `name` responds to a probe invocation
async fn tool_responds(name: &str, args: &[&str]) -> bool {
    Command::new(name)
        .args(args)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Verify the external tools the pipeline shells out to are on PATH
pub async fn ensure_tools() -> FlatbakeResult<()> {
    if !tool_responds("flatpak", &["--version"]).await {
        return Err(FlatbakeError::ToolNotFound {
            name: "flatpak".to_string(),
            hint: "Install it with your distribution's package manager".to_string(),
        });
    }
    if !tool_responds("flatpak-builder", &["--version"]).await {
        return Err(FlatbakeError::ToolNotFound {
            name: "flatpak-builder".to_string(),
            hint: "Install the flatpak-builder package".to_string(),
        });
    }
    // xvfb-run has no --version; --help exits 0
    if !tool_responds("xvfb-run", &["--help"]).await {
        return Err(FlatbakeError::ToolNotFound {
            name: "xvfb-run".to_string(),
            hint: "Install the xvfb (X virtual framebuffer) package".to_string(),
        });
    }
    Ok(())
}
