//! Check command - validate a manifest and show what would be built

use crate::cli::args::CheckArgs;
use crate::error::{FlatbakeError, FlatbakeResult};
use crate::manifest::Manifest;
use console::style;
use serde::Serialize;

/// Summary of a validated manifest
#[derive(Debug, Serialize)]
struct CheckReport<'a> {
    app_id: &'a str,
    branch: &'a str,
    format: &'static str,
    modules: usize,
}

/// Execute the check command
pub async fn execute(args: CheckArgs) -> FlatbakeResult<()> {
    let manifest = Manifest::load(&args.manifest).await?;

    let app_id = manifest
        .app_id()
        .ok_or_else(|| FlatbakeError::MissingAppId(args.manifest.clone()))?;

    let report = CheckReport {
        app_id,
        branch: manifest.branch(),
        format: manifest.format().name(),
        modules: manifest.module_count(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "{} {} is a valid {} manifest",
            style("✓").green(),
            style(args.manifest.display()).cyan(),
            report.format
        );
        println!("  App id:  {}", report.app_id);
        println!("  Branch:  {}", report.branch);
        println!("  Modules: {}", report.modules);
    }

    Ok(())
}
