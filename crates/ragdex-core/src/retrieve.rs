//! Similarity retrieval over an [`Index`].
//!
//! # Algorithm
//!
//! 1. Load the index through the [`IndexStore`] (cached or from storage).
//! 2. An index with zero chunks returns an empty result, never an error.
//! 3. Embed the question through the gateway (unit-norm vector).
//! 4. Score every chunk with a plain dot product (cosine for unit vectors).
//! 5. Stable sort by score descending, so ties keep insertion order.
//! 6. Keep the first `top_k`.
//! 7. If a threshold is given, drop the kept results scoring below it.
//!
//! The threshold is applied *after* truncation: a small `top_k` with a
//! threshold can return fewer than `top_k` results, while a larger `top_k`
//! widens the candidate pool before filtering. Changing this order changes
//! which chunks callers see.
//!
//! Cost is a linear scan, O(N) per query in the number of chunks.

use std::cmp::Ordering;

use crate::embedding::{dot, embed_text, Embedder};
use crate::error::{RagError, Result};
use crate::models::{Index, Retrieval, RetrievalResult, RetrievalStatus};
use crate::store::IndexStore;

/// Rank `index` against a unit-norm query vector.
///
/// Pure scoring step of [`retrieve`]: no I/O and no embedding calls.
pub fn rank(
    index: &Index,
    query_vec: &[f32],
    top_k: usize,
    threshold: Option<f32>,
) -> Vec<RetrievalResult> {
    let mut scored: Vec<(usize, f32)> = index
        .chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| (i, dot(query_vec, &chunk.embedding)))
        .collect();

    // `sort_by` is stable: equal scores stay in insertion order.
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    scored.truncate(top_k);

    if let Some(min) = threshold {
        scored.retain(|(_, score)| *score >= min);
    }

    scored
        .into_iter()
        .map(|(i, score)| {
            let chunk = &index.chunks[i];
            RetrievalResult {
                document_id: chunk.document_id.clone(),
                sequence_index: chunk.sequence_index,
                text: chunk.text.clone(),
                score,
            }
        })
        .collect()
}

/// Retrieve the chunks most similar to `question`.
///
/// An empty or never-built index is reported through
/// [`RetrievalStatus`] without calling the embedder. Embedding failures
/// propagate unchanged.
pub async fn retrieve<S: IndexStore + ?Sized>(
    store: &S,
    embedder: &dyn Embedder,
    question: &str,
    top_k: usize,
    threshold: Option<f32>,
) -> Result<Retrieval> {
    if question.trim().is_empty() {
        return Err(RagError::InvalidRequest(
            "question must not be empty".to_string(),
        ));
    }

    let index = store.load().await?;

    if index.is_empty() {
        let status = if index.is_built() {
            RetrievalStatus::EmptyCorpus
        } else {
            RetrievalStatus::NotIndexed
        };
        return Ok(Retrieval::empty(status));
    }

    let query_vec = embed_text(embedder, question).await?;

    if let Some(expected) = index.dims() {
        if expected != query_vec.len() {
            return Err(RagError::DimensionMismatch {
                expected,
                actual: query_vec.len(),
            });
        }
    }

    let chunks = rank(&index, &query_vec, top_k, threshold);
    let status = if chunks.is_empty() {
        RetrievalStatus::NoMatches
    } else {
        RetrievalStatus::Matched
    };

    Ok(Retrieval { status, chunks })
}
