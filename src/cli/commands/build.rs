//! Build command - run the full pipeline

use crate::artifact::DirArtifactStore;
use crate::cache::DirCache;
use crate::cli::args::BuildArgs;
use crate::config::{Config, ConfigManager};
use crate::error::{FlatbakeError, FlatbakeResult};
use crate::pipeline::{run_pipeline, BuildPlan};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::env;
use std::path::PathBuf;
use tracing::debug;

/// Execute the build command
pub async fn execute(args: BuildArgs, config: &Config) -> FlatbakeResult<()> {
    let workspace = resolve_workspace(&args)?;
    debug!("Workspace: {}", workspace.display());

    let manifest_path = args
        .manifest
        .clone()
        .or_else(|| config.build.manifest.clone())
        .ok_or_else(|| {
            FlatbakeError::User(
                "No manifest given. Pass --manifest or set build.manifest in .flatbake.toml."
                    .to_string(),
            )
        })?;

    let plan = BuildPlan {
        workspace: workspace.clone(),
        manifest_path,
        run_tests: args.run_tests.unwrap_or(config.build.run_tests),
        bundle: args.bundle.clone().unwrap_or_else(|| config.build.bundle.clone()),
        remote_name: args
            .repo_name
            .clone()
            .unwrap_or_else(|| config.remote.name.clone()),
        remote_url: args
            .repo_url
            .clone()
            .unwrap_or_else(|| config.remote.url.clone()),
        cache_enabled: args.cache.unwrap_or(config.cache.enabled),
        cache_key: args.cache_key.clone().or_else(|| config.cache.key.clone()),
    };

    let cache_root = args
        .cache_root
        .clone()
        .or_else(|| config.cache.root.clone())
        .unwrap_or_else(ConfigManager::default_cache_root);
    let cache = DirCache::new(cache_root);

    let artifacts_dir = args
        .artifacts_dir
        .clone()
        .unwrap_or_else(|| config.artifacts.dir.clone());
    let artifacts_dir = if artifacts_dir.is_absolute() {
        artifacts_dir
    } else {
        workspace.join(artifacts_dir)
    };
    let store = DirArtifactStore::new(artifacts_dir);

    let pb = create_progress_bar("Running flatpak-builder...");
    let printer = {
        let pb = pb.clone();
        move |line: String| pb.println(line)
    };

    let result = run_pipeline(&plan, &cache, &store, &printer).await;
    pb.finish_and_clear();
    let report = result?;

    println!(
        "{} Built {} ({})",
        style("✓").green(),
        style(&report.app_id).cyan(),
        report.branch
    );
    match (&report.cache_key, &report.cache_restored) {
        (Some(key), Some(restored)) => {
            println!("  Cache:    {} (restored from {})", key, restored);
        }
        (Some(key), None) => println!("  Cache:    {} (no previous entry)", key),
        (None, _) => {}
    }
    println!("  Bundle:   {}", report.bundle_path.display());
    println!(
        "  Artifact: {} -> {}",
        report.artifact_name,
        report.artifact_path.display()
    );

    Ok(())
}

fn resolve_workspace(args: &BuildArgs) -> FlatbakeResult<PathBuf> {
    if let Some(ref path) = args.workspace {
        return path.canonicalize().map_err(|e| {
            FlatbakeError::io(format!("resolving workspace {}", path.display()), e)
        });
    }
    env::current_dir().map_err(|e| FlatbakeError::io("getting current directory", e))
}

fn create_progress_bar(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
