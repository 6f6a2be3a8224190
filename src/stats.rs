//! `ragdex stats`: summarize the persisted index.

use anyhow::Result;

use crate::config::Config;
use crate::service::collect_stats;
use crate::store::JsonFileStore;

pub async fn run_stats(config: &Config) -> Result<()> {
    let store = JsonFileStore::new(&config.index.path);
    let stats = collect_stats(&store, &config.corpus).await?;

    let size = std::fs::metadata(&config.index.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("ragdex index stats");
    println!("==================");
    println!();
    println!("  Index:       {}", config.index.path.display());
    println!("  Size:        {}", format_bytes(size));
    println!(
        "  Built:       {}",
        stats
            .built_at
            .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "never".to_string())
    );
    println!(
        "  Model:       {}",
        stats.model.as_deref().unwrap_or("-")
    );
    println!();
    println!("  Documents:   {}", stats.documents);
    println!("  Chunks:      {}", stats.chunks);
    println!(
        "  Dims:        {}",
        stats
            .dims
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string())
    );
    println!(
        "  Stale:       {}",
        match stats.stale {
            Some(true) => "yes (corpus changed since build)",
            Some(false) => "no",
            None => "unknown",
        }
    );
    println!();
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
