//! Init command - create project-local .flatbake.toml

use crate::cli::args::InitArgs;
use crate::config::LOCAL_CONFIG_NAME;
use crate::error::{FlatbakeError, FlatbakeResult};
use console::style;
use std::path::Path;
use tokio::fs;

/// Template for project-local config
const INIT_TEMPLATE: &str = r#"# flatbake project configuration
# Settings here override your global config (~/.config/flatbake/config.toml)

[build]
# manifest = "org.example.App.yml"
# bundle = "app.flatpak"
# run_tests = false

[remote]
# name = "flathub"
# url = "https://flathub.org/repo/flathub.flatpakrepo"

[cache]
# enabled = true
# key = ""                # explicit key; derived from manifest bytes if unset
# root = "/ci/cache"

[artifacts]
# dir = "artifacts"
"#;

/// Execute the init command
pub async fn execute(args: InitArgs) -> FlatbakeResult<()> {
    let target_dir = match args.path {
        Some(ref p) => p.clone(),
        None => std::env::current_dir()
            .map_err(|e| FlatbakeError::io("getting current directory", e))?,
    };

    let config_path = target_dir.join(LOCAL_CONFIG_NAME);

    if config_path.exists() && !args.force {
        return Err(FlatbakeError::User(format!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        )));
    }

    ensure_dir(&target_dir).await?;

    fs::write(&config_path, INIT_TEMPLATE)
        .await
        .map_err(|e| FlatbakeError::io(format!("writing {}", config_path.display()), e))?;

    println!(
        "{} Created project config {}",
        style("✓").green(),
        style(config_path.display()).cyan()
    );

    Ok(())
}

async fn ensure_dir(dir: &Path) -> FlatbakeResult<()> {
    if !dir.exists() {
        fs::create_dir_all(dir)
            .await
            .map_err(|e| FlatbakeError::io(format!("creating directory {}", dir.display()), e))?;
    }
    Ok(())
}
