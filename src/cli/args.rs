//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// flatbake - Flatpak build automation for CI
///
/// Builds a distributable bundle from a declarative manifest with
/// flatpak-builder, caching builder state by manifest content.
#[derive(Parser, Debug)]
#[command(name = "flatbake")]
#[command(author, version, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "FLATBAKE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Skip local .flatbake.toml discovery
    #[arg(long, global = true)]
    pub no_local: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full pipeline: build, bundle and publish
    Build(BuildArgs),

    /// Print the resolved cache key for a manifest
    Key(KeyArgs),

    /// Validate a manifest and show what would be built
    Check(CheckArgs),

    /// Initialize a project-local .flatbake.toml config
    Init(InitArgs),
}

/// Arguments for the build command
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Manifest file (JSON or YAML)
    #[arg(short, long)]
    pub manifest: Option<PathBuf>,

    /// Run tests inside the build sandbox (yes/no, true/false,
    /// enabled/disabled, on/off, 1/0)
    #[arg(long, env = "FLATBAKE_RUN_TESTS", value_parser = switch_value)]
    pub run_tests: Option<bool>,

    /// Bundle output filename
    #[arg(short, long)]
    pub bundle: Option<String>,

    /// Symbolic name of the dependency remote
    #[arg(long)]
    pub repo_name: Option<String>,

    /// URL of the dependency remote
    #[arg(long)]
    pub repo_url: Option<String>,

    /// Cache the builder state directory across runs (same switch values
    /// as --run-tests)
    #[arg(long, env = "FLATBAKE_CACHE", value_parser = switch_value)]
    pub cache: Option<bool>,

    /// Explicit cache key (derived from manifest content if not given)
    #[arg(long, env = "FLATBAKE_CACHE_KEY")]
    pub cache_key: Option<String>,

    /// Cache root directory
    #[arg(long, env = "FLATBAKE_CACHE_ROOT")]
    pub cache_root: Option<PathBuf>,

    /// Directory artifacts are published into
    #[arg(long, env = "FLATBAKE_ARTIFACTS_DIR")]
    pub artifacts_dir: Option<PathBuf>,

    /// Directory to run the build in (defaults to current directory)
    #[arg(short, long)]
    pub workspace: Option<PathBuf>,
}

/// Arguments for the key command
#[derive(Parser, Debug)]
pub struct KeyArgs {
    /// Manifest file (JSON or YAML)
    pub manifest: PathBuf,

    /// Explicit cache key (printed unchanged when non-empty)
    #[arg(long, env = "FLATBAKE_CACHE_KEY")]
    pub cache_key: Option<String>,
}

/// Arguments for the check command
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Manifest file (JSON or YAML)
    pub manifest: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the init command
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Overwrite existing .flatbake.toml
    #[arg(short, long)]
    pub force: bool,

    /// Target directory (defaults to current directory)
    #[arg(short, long)]
    pub path: Option<PathBuf>,
}

/// clap adapter for the CI switch parser
fn switch_value(s: &str) -> Result<bool, String> {
    crate::config::parse_switch(s).map_err(|e| e.to_string())
}
