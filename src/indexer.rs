//! Index rebuild pipeline.
//!
//! ```text
//! corpus documents ─▶ chunk_text ─▶ batches ─▶ embed_texts (N in flight) ─▶ Index
//! ```
//!
//! Chunk ids are `chunk-<n>` in document-scan order, so rebuilding an
//! unchanged corpus reproduces the same ids. Batches are embedded with
//! bounded concurrency through `futures::StreamExt::buffered`, which yields
//! results in submission order; the chunk-to-vector pairing therefore does
//! not depend on which request finishes first.
//!
//! Any embedding failure aborts the build: an index with missing vectors is
//! never produced.

use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;

use ragdex_core::chunk::chunk_text;
use ragdex_core::embedding::{embed_texts, Embedder};
use ragdex_core::models::{Chunk, Index};
use ragdex_core::{RagError, Result};

use crate::corpus::{corpus_digest, CorpusDocument};

/// Knobs for one rebuild.
#[derive(Debug, Clone, Copy)]
pub struct BuildOptions {
    pub max_chars: usize,
    pub batch_size: usize,
    pub concurrency: usize,
}

/// What a rebuild produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReindexSummary {
    /// Distinct documents contributing at least one chunk.
    pub documents: usize,
    pub chunks: usize,
    /// Corpus files that were found but could not be read.
    pub skipped: usize,
    pub dims: Option<usize>,
    pub model: String,
}

struct PendingChunk {
    document_id: String,
    sequence_index: usize,
    text: String,
}

/// Chunk and embed `documents` into a fresh [`Index`].
pub async fn build_index(
    documents: &[CorpusDocument],
    embedder: &dyn Embedder,
    options: BuildOptions,
) -> Result<Index> {
    let pending: Vec<PendingChunk> = documents
        .iter()
        .flat_map(|doc| {
            chunk_text(&doc.text, options.max_chars)
                .into_iter()
                .enumerate()
                .map(move |(sequence_index, text)| PendingChunk {
                    document_id: doc.path.clone(),
                    sequence_index,
                    text,
                })
        })
        .collect();

    let batches: Vec<Vec<String>> = pending
        .chunks(options.batch_size.max(1))
        .map(|batch| batch.iter().map(|c| c.text.clone()).collect())
        .collect();

    tracing::info!(
        documents = documents.len(),
        chunks = pending.len(),
        batches = batches.len(),
        model = embedder.model_name(),
        "embedding corpus"
    );

    let embedded: Vec<Vec<Vec<f32>>> = stream::iter(batches.iter())
        .map(|batch| embed_texts(embedder, batch))
        .buffered(options.concurrency.max(1))
        .try_collect()
        .await?;

    let vectors: Vec<Vec<f32>> = embedded.into_iter().flatten().collect();
    if vectors.len() != pending.len() {
        return Err(RagError::EmbeddingBackend(format!(
            "expected {} embeddings, got {}",
            pending.len(),
            vectors.len()
        )));
    }

    let expected_dims = embedder
        .dims()
        .or_else(|| vectors.first().map(|v| v.len()));
    if let Some(expected) = expected_dims {
        if let Some(bad) = vectors.iter().find(|v| v.len() != expected) {
            return Err(RagError::DimensionMismatch {
                expected,
                actual: bad.len(),
            });
        }
    }

    let chunks: Vec<Chunk> = pending
        .into_iter()
        .zip(vectors)
        .enumerate()
        .map(|(n, (p, embedding))| Chunk {
            id: format!("chunk-{}", n),
            document_id: p.document_id,
            sequence_index: p.sequence_index,
            text: p.text,
            embedding,
        })
        .collect();

    let mut index = Index::from_chunks(chunks);
    index.model = Some(embedder.model_name().to_string());
    index.corpus_digest = Some(corpus_digest(documents));
    Ok(index)
}
