//! Key command - print the resolved cache key for a manifest

use crate::cache::resolve_key;
use crate::cli::args::KeyArgs;
use crate::error::{FlatbakeError, FlatbakeResult};
use crate::manifest::ManifestFormat;
use tokio::fs;

/// Execute the key command
pub async fn execute(args: KeyArgs) -> FlatbakeResult<()> {
    // Same extension gate the pipeline applies
    ManifestFormat::from_path(&args.manifest)?;

    let bytes = fs::read(&args.manifest).await.map_err(|e| {
        FlatbakeError::io(format!("reading manifest {}", args.manifest.display()), e)
    })?;

    println!("{}", resolve_key(args.cache_key.as_deref(), &bytes));
    Ok(())
}
