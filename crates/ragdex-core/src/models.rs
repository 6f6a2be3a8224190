//! Data types shared by indexing, retrieval, and answering.
//!
//! Field names follow the persisted artifact and the retrieval response
//! shape: a chunk serializes as `{id, doc, chunk_index, text, embedding}`
//! and an index as `{chunks, doc_count}` plus optional build metadata.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A contiguous slice of one corpus document, with its unit-norm embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Stable identifier within one index generation (`chunk-<n>`).
    pub id: String,
    /// Path of the source document relative to the corpus root.
    #[serde(rename = "doc")]
    pub document_id: String,
    /// 0-based position of the chunk within its document.
    #[serde(rename = "chunk_index")]
    pub sequence_index: usize,
    pub text: String,
    pub embedding: Vec<f32>,
}

/// The durable collection of chunks built from a corpus.
///
/// Rebuilt wholesale on reindex and read-only in between. An index with
/// zero chunks is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Index {
    pub chunks: Vec<Chunk>,
    #[serde(rename = "doc_count", default)]
    pub document_count: usize,
    /// When the index was built. `None` means it has never been built.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub built_at: Option<DateTime<Utc>>,
    /// Embedding model that produced the vectors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Digest of the corpus contents the index was built from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corpus_digest: Option<String>,
}

impl Index {
    /// Assemble a freshly built index, deriving `document_count` from the chunks.
    pub fn from_chunks(chunks: Vec<Chunk>) -> Self {
        let document_count = count_documents(&chunks);
        Self {
            chunks,
            document_count,
            built_at: Some(Utc::now()),
            model: None,
            corpus_digest: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn is_built(&self) -> bool {
        self.built_at.is_some()
    }

    /// Embedding length shared by every chunk, or `None` for an empty index.
    pub fn dims(&self) -> Option<usize> {
        self.chunks.first().map(|c| c.embedding.len())
    }

    /// Check the equal-dimension invariant and repair a missing document count.
    ///
    /// Returns a human-readable description of the first violation.
    pub fn validate(&mut self) -> std::result::Result<(), String> {
        if let Some(dims) = self.dims() {
            if dims == 0 {
                return Err("chunk embeddings must not be empty".to_string());
            }
            if let Some(bad) = self.chunks.iter().find(|c| c.embedding.len() != dims) {
                return Err(format!(
                    "chunk {} has {} dimensions, expected {}",
                    bad.id,
                    bad.embedding.len(),
                    dims
                ));
            }
        }
        if self.document_count == 0 && !self.chunks.is_empty() {
            self.document_count = count_documents(&self.chunks);
        }
        Ok(())
    }
}

/// Number of distinct source documents contributing chunks.
pub fn count_documents(chunks: &[Chunk]) -> usize {
    chunks
        .iter()
        .map(|c| c.document_id.as_str())
        .collect::<HashSet<_>>()
        .len()
}

/// One ranked chunk, copied out of the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    #[serde(rename = "doc")]
    pub document_id: String,
    #[serde(rename = "chunk_index")]
    pub sequence_index: usize,
    pub text: String,
    /// Cosine similarity in `[-1, 1]`.
    pub score: f32,
}

/// Distinguishes the ways a retrieval can come back, including empty ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalStatus {
    /// No index has ever been built.
    NotIndexed,
    /// An index exists but the corpus produced no chunks.
    EmptyCorpus,
    /// The index has chunks but none survived top-K and threshold filtering.
    NoMatches,
    Matched,
}

/// Ranked chunks for a question, with the status of the lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Retrieval {
    pub status: RetrievalStatus,
    pub chunks: Vec<RetrievalResult>,
}

impl Retrieval {
    pub fn empty(status: RetrievalStatus) -> Self {
        Self {
            status,
            chunks: Vec::new(),
        }
    }
}

/// Retrieval request shape: `{question, top_k?, threshold?}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrievalRequest {
    pub question: String,
    #[serde(default)]
    pub top_k: Option<usize>,
    #[serde(default)]
    pub threshold: Option<f32>,
}

/// How a question is answered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalMode {
    /// Ask the chat model directly, without retrieval.
    Plain,
    /// Return the ranked chunks only.
    RetrieveOnly,
    /// Retrieve, then answer from the retrieved context with citations.
    #[default]
    RetrieveAndAnswer,
}

impl RetrievalMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetrievalMode::Plain => "plain",
            RetrievalMode::RetrieveOnly => "retrieve_only",
            RetrievalMode::RetrieveAndAnswer => "retrieve_and_answer",
        }
    }
}

impl fmt::Display for RetrievalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RetrievalMode {
    type Err = String;

    /// Accepts both `retrieve_only` and `retrieve-only` spellings.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.replace('-', "_").as_str() {
            "plain" => Ok(RetrievalMode::Plain),
            "retrieve_only" => Ok(RetrievalMode::RetrieveOnly),
            "retrieve_and_answer" => Ok(RetrievalMode::RetrieveAndAnswer),
            other => Err(format!(
                "unknown mode '{}'. Use plain, retrieve-only, or retrieve-and-answer.",
                other
            )),
        }
    }
}

/// A [`RetrievalRequest`] plus the answering mode.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AskRequest {
    pub question: String,
    #[serde(default)]
    pub mode: RetrievalMode,
    #[serde(default)]
    pub top_k: Option<usize>,
    #[serde(default)]
    pub threshold: Option<f32>,
}

impl AskRequest {
    pub fn retrieval(&self) -> RetrievalRequest {
        RetrievalRequest {
            question: self.question.clone(),
            top_k: self.top_k,
            threshold: self.threshold,
        }
    }
}

/// Result of an [`AskRequest`]; one fixed shape per [`RetrievalMode`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AskOutcome {
    Plain {
        answer: String,
    },
    RetrieveOnly {
        status: RetrievalStatus,
        chunks: Vec<RetrievalResult>,
    },
    RetrieveAndAnswer {
        status: RetrievalStatus,
        chunks: Vec<RetrievalResult>,
        answer: String,
    },
}

impl AskOutcome {
    pub fn answer(&self) -> Option<&str> {
        match self {
            AskOutcome::Plain { answer } | AskOutcome::RetrieveAndAnswer { answer, .. } => {
                Some(answer)
            }
            AskOutcome::RetrieveOnly { .. } => None,
        }
    }

    pub fn chunks(&self) -> &[RetrievalResult] {
        match self {
            AskOutcome::Plain { .. } => &[],
            AskOutcome::RetrieveOnly { chunks, .. }
            | AskOutcome::RetrieveAndAnswer { chunks, .. } => chunks,
        }
    }
}
