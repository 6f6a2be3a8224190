//! `ragdex reindex`: rebuild the index from the corpus.

use anyhow::Result;

use crate::config::Config;
use crate::service::RagService;

pub async fn run_reindex(config: &Config) -> Result<()> {
    let service = RagService::from_config(config)?;
    let summary = service.reindex().await?;

    println!("reindex");
    println!("  documents: {}", summary.documents);
    println!("  chunks: {}", summary.chunks);
    println!("  skipped files: {}", summary.skipped);
    match summary.dims {
        Some(dims) => println!("  dims: {}", dims),
        None => println!("  dims: -"),
    }
    println!("  model: {}", summary.model);
    println!("  index: {}", config.index.path.display());
    Ok(())
}
