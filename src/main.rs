//! flatbake - Flatpak build automation for CI
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use flatbake::cli::{Cli, Commands};
use flatbake::config::ConfigManager;
use flatbake::error::{FlatbakeError, FlatbakeResult};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> FlatbakeResult<()> {
    let cli = Cli::parse();

    // Initialize logging: 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("flatbake=warn"),
        1 => EnvFilter::new("flatbake=info"),
        _ => EnvFilter::new("flatbake=debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    let config_path = cli.config.clone();
    let no_local = cli.no_local;

    match cli.command {
        // These don't need config loading
        Commands::Init(args) => flatbake::cli::commands::init(args).await,
        Commands::Key(args) => flatbake::cli::commands::key(args).await,
        Commands::Check(args) => flatbake::cli::commands::check(args).await,

        Commands::Build(args) => {
            let config_manager = if let Some(path) = config_path {
                ConfigManager::with_path(path)
            } else {
                ConfigManager::new()
            };

            // Find local config unless --no-local is set
            let local_config_path = if no_local {
                debug!("Local config discovery disabled (--no-local)");
                None
            } else {
                let cwd = std::env::current_dir()
                    .map_err(|e| FlatbakeError::io("getting current directory", e))?;
                let found = ConfigManager::find_local_config(&cwd);
                if let Some(ref path) = found {
                    debug!("Found local config: {}", path.display());
                }
                found
            };

            let config = config_manager
                .load_merged(local_config_path.as_deref())
                .await?;

            flatbake::cli::commands::build(args, &config).await
        }
    }
}
