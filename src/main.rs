//! # ragdex CLI
//!
//! ## Usage
//!
//! ```bash
//! ragdex --config ./config/ragdex.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `ragdex reindex` | Rebuild the index from the corpus directory |
//! | `ragdex retrieve "<question>"` | Print the most similar chunks |
//! | `ragdex ask "<question>"` | Answer with retrieved context and citations |
//! | `ragdex stats` | Summarize the persisted index |
//!
//! Diagnostics go to stderr; set `RAGDEX_LOG=info` (or `debug`) for more.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use ragdex::{ask, config, reindex, retrieve, stats};
use ragdex_core::models::RetrievalMode;

/// ragdex: a flat-file retrieval-augmented generation index.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/ragdex.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "ragdex",
    about = "ragdex: chunk, embed, and retrieve plain-text documents, and answer with citations",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/ragdex.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the index from the corpus.
    ///
    /// Scans `corpus.root`, chunks every matching file, embeds the chunks,
    /// and atomically replaces the index artifact.
    Reindex,

    /// Print the chunks most similar to a question.
    Retrieve {
        question: String,

        /// Maximum number of chunks (defaults to `retrieval.top_k`).
        #[arg(long)]
        top_k: Option<usize>,

        /// Minimum similarity score, applied after top-k truncation.
        #[arg(long)]
        threshold: Option<f32>,

        /// Print the retrieval as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Answer a question.
    Ask {
        question: String,

        /// plain, retrieve-only, or retrieve-and-answer.
        #[arg(long, default_value = "retrieve-and-answer")]
        mode: RetrievalMode,

        #[arg(long)]
        top_k: Option<usize>,

        #[arg(long)]
        threshold: Option<f32>,

        /// Print the outcome as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show index statistics.
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_env("RAGDEX_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Reindex => {
            reindex::run_reindex(&cfg).await?;
        }
        Commands::Retrieve {
            question,
            top_k,
            threshold,
            json,
        } => {
            retrieve::run_retrieve(&cfg, &question, top_k, threshold, json).await?;
        }
        Commands::Ask {
            question,
            mode,
            top_k,
            threshold,
            json,
        } => {
            ask::run_ask(&cfg, &question, mode, top_k, threshold, json).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
    }

    Ok(())
}
