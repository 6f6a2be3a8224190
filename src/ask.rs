//! `ragdex ask`: answer a question in one of the retrieval modes.

use anyhow::Result;

use ragdex_core::models::{AskOutcome, AskRequest, Retrieval, RetrievalMode};

use crate::config::Config;
use crate::retrieve::print_retrieval;
use crate::service::RagService;

pub async fn run_ask(
    config: &Config,
    question: &str,
    mode: RetrievalMode,
    top_k: Option<usize>,
    threshold: Option<f32>,
    json: bool,
) -> Result<()> {
    let service = RagService::from_config(config)?;
    let outcome = service
        .ask(&AskRequest {
            question: question.to_string(),
            mode,
            top_k,
            threshold,
        })
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    match outcome {
        AskOutcome::Plain { answer } => println!("{}", answer),
        AskOutcome::RetrieveOnly { status, chunks } => {
            print_retrieval(&Retrieval { status, chunks });
        }
        AskOutcome::RetrieveAndAnswer {
            status,
            chunks,
            answer,
        } => {
            println!("{}", answer);
            println!();
            println!("--- Context ({}) ---", chunks.len());
            print_retrieval(&Retrieval { status, chunks });
        }
    }
    Ok(())
}
