//! `ragdex retrieve`: print the ranked chunks for a question.

use anyhow::Result;

use ragdex_core::models::{Retrieval, RetrievalRequest, RetrievalResult, RetrievalStatus};

use crate::config::Config;
use crate::service::RagService;

const EXCERPT_CHARS: usize = 160;

pub async fn run_retrieve(
    config: &Config,
    question: &str,
    top_k: Option<usize>,
    threshold: Option<f32>,
    json: bool,
) -> Result<()> {
    let service = RagService::from_config(config)?;
    let retrieval = service
        .retrieve(&RetrievalRequest {
            question: question.to_string(),
            top_k,
            threshold,
        })
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&retrieval)?);
    } else {
        print_retrieval(&retrieval);
    }
    Ok(())
}

pub(crate) fn print_retrieval(retrieval: &Retrieval) {
    if retrieval.chunks.is_empty() {
        println!("{}", status_message(retrieval.status));
        return;
    }

    for (i, result) in retrieval.chunks.iter().enumerate() {
        print_result(i, result);
    }
}

fn print_result(i: usize, result: &RetrievalResult) {
    println!(
        "{}. [{:.2}] {}#{}",
        i + 1,
        result.score,
        result.document_id,
        result.sequence_index
    );
    println!("    excerpt: \"{}\"", excerpt(&result.text));
    println!();
}

pub(crate) fn status_message(status: RetrievalStatus) -> &'static str {
    match status {
        RetrievalStatus::NotIndexed => "No index yet. Run `ragdex reindex` first.",
        RetrievalStatus::EmptyCorpus => "The index is empty: the corpus produced no chunks.",
        RetrievalStatus::NoMatches => "No results.",
        RetrievalStatus::Matched => "",
    }
}

fn excerpt(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= EXCERPT_CHARS {
        return flat;
    }
    let cut: String = flat.chars().take(EXCERPT_CHARS).collect();
    format!("{}...", cut.trim_end())
}
