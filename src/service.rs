//! Service composition root.
//!
//! [`RagService`] owns the index store and the optional embedding and chat
//! backends, all constructed once up front. Operations that need a disabled
//! backend fail with a configuration error; the others still work. Rebuilds are
//! single-flight: a second `reindex` waits for the first to finish instead
//! of interleaving writes. Reads never block on a rebuild; they keep using
//! the snapshot they loaded until the store swaps in the new index.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

use ragdex_core::chat::ChatModel;
use ragdex_core::embedding::Embedder;
use ragdex_core::models::{AskOutcome, AskRequest, Retrieval, RetrievalMode, RetrievalRequest};
use ragdex_core::prompt;
use ragdex_core::retrieve::retrieve;
use ragdex_core::store::IndexStore;
use ragdex_core::{RagError, Result};

use crate::chat::create_chat;
use crate::config::{Config, CorpusConfig};
use crate::corpus::{corpus_digest, scan_corpus_blocking};
use crate::embedding::{create_optional_embedder, embedding_disabled};
use crate::indexer::{build_index, BuildOptions, ReindexSummary};
use crate::store::JsonFileStore;

/// Settings the service needs after construction.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub corpus: CorpusConfig,
    pub build: BuildOptions,
    pub top_k: usize,
    pub threshold: Option<f32>,
    pub citation_retry: bool,
}

impl ServiceSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            corpus: config.corpus.clone(),
            build: BuildOptions {
                max_chars: config.chunking.max_chars,
                batch_size: config.embedding.batch_size,
                concurrency: config.embedding.concurrency,
            },
            top_k: config.retrieval.top_k,
            threshold: config.retrieval.threshold,
            citation_retry: config.retrieval.citation_retry,
        }
    }
}

/// Facts about the resident index.
#[derive(Debug, Clone, Serialize)]
pub struct IndexStats {
    pub documents: usize,
    pub chunks: usize,
    pub dims: Option<usize>,
    pub built_at: Option<DateTime<Utc>>,
    pub model: Option<String>,
    /// Whether the corpus changed since the build; `None` when unknown.
    pub stale: Option<bool>,
}

pub struct RagService {
    store: Arc<dyn IndexStore>,
    embedder: Option<Arc<dyn Embedder>>,
    chat: Option<Arc<dyn ChatModel>>,
    settings: ServiceSettings,
    rebuild_lock: Mutex<()>,
}

impl RagService {
    pub fn new(
        store: Arc<dyn IndexStore>,
        embedder: Option<Arc<dyn Embedder>>,
        chat: Option<Arc<dyn ChatModel>>,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            store,
            embedder,
            chat,
            settings,
            rebuild_lock: Mutex::new(()),
        }
    }

    /// Wire the service from configuration: JSON file store plus the
    /// configured backends. Missing credentials fail here.
    pub fn from_config(config: &Config) -> Result<Self> {
        let store = Arc::new(JsonFileStore::new(&config.index.path));
        let embedder = create_optional_embedder(&config.embedding)?;
        let chat = create_chat(&config.chat)?;
        Ok(Self::new(
            store,
            embedder,
            chat,
            ServiceSettings::from_config(config),
        ))
    }

    /// Rebuild the index from the corpus and replace the persisted artifact.
    pub async fn reindex(&self) -> Result<ReindexSummary> {
        let embedder = self.embedder()?;
        let _guard = self.rebuild_lock.lock().await;

        let corpus = scan_corpus_blocking(&self.settings.corpus).await?;
        let index = build_index(&corpus.documents, embedder, self.settings.build).await?;
        let index = self.store.save(index).await?;

        let summary = ReindexSummary {
            documents: index.document_count,
            chunks: index.chunks.len(),
            skipped: corpus.skipped,
            dims: index.dims(),
            model: embedder.model_name().to_string(),
        };
        tracing::info!(
            documents = summary.documents,
            chunks = summary.chunks,
            skipped = summary.skipped,
            "reindex complete"
        );
        Ok(summary)
    }

    /// Rank indexed chunks for a question; request fields override the
    /// configured `top_k` and threshold.
    pub async fn retrieve(&self, request: &RetrievalRequest) -> Result<Retrieval> {
        let top_k = request.top_k.unwrap_or(self.settings.top_k);
        if top_k == 0 {
            return Err(RagError::InvalidRequest("top_k must be >= 1".to_string()));
        }
        let threshold = request.threshold.or(self.settings.threshold);
        let embedder = self.embedder()?;

        let retrieval = retrieve(
            self.store.as_ref(),
            embedder,
            &request.question,
            top_k,
            threshold,
        )
        .await?;

        tracing::debug!(
            status = ?retrieval.status,
            results = retrieval.chunks.len(),
            top_k,
            threshold = ?threshold,
            "retrieved"
        );
        Ok(retrieval)
    }

    /// Answer a question in the requested mode.
    pub async fn ask(&self, request: &AskRequest) -> Result<AskOutcome> {
        match request.mode {
            RetrievalMode::Plain => {
                let chat = self.chat()?;
                if request.question.trim().is_empty() {
                    return Err(RagError::InvalidRequest(
                        "question must not be empty".to_string(),
                    ));
                }
                let answer = chat.complete(&prompt::plain_prompt(&request.question)).await?;
                Ok(AskOutcome::Plain { answer })
            }
            RetrievalMode::RetrieveOnly => {
                let retrieval = self.retrieve(&request.retrieval()).await?;
                Ok(AskOutcome::RetrieveOnly {
                    status: retrieval.status,
                    chunks: retrieval.chunks,
                })
            }
            RetrievalMode::RetrieveAndAnswer => {
                let chat = self.chat()?;
                let retrieval = self.retrieve(&request.retrieval()).await?;
                let answer = self
                    .answer_with_citations(chat, &request.question, &retrieval)
                    .await?;
                Ok(AskOutcome::RetrieveAndAnswer {
                    status: retrieval.status,
                    chunks: retrieval.chunks,
                    answer,
                })
            }
        }
    }

    async fn answer_with_citations(
        &self,
        chat: &dyn ChatModel,
        question: &str,
        retrieval: &Retrieval,
    ) -> Result<String> {
        let answer = chat
            .complete(&prompt::compose(question, &retrieval.chunks))
            .await?;

        if !self.settings.citation_retry
            || retrieval.chunks.is_empty()
            || prompt::has_citations(&answer)
        {
            return Ok(answer);
        }

        tracing::info!("answer carried no citations; retrying with stricter prompt");
        chat.complete(&prompt::compose_citation_retry(question, &retrieval.chunks))
            .await
    }

    fn embedder(&self) -> Result<&dyn Embedder> {
        self.embedder.as_deref().ok_or_else(embedding_disabled)
    }

    fn chat(&self) -> Result<&dyn ChatModel> {
        self.chat.as_deref().ok_or_else(|| {
            RagError::Configuration(
                "chat provider is disabled; set [chat] provider = \"openai\"".to_string(),
            )
        })
    }

    /// Describe the resident index and whether the corpus moved on since.
    pub async fn stats(&self) -> Result<IndexStats> {
        collect_stats(self.store.as_ref(), &self.settings.corpus).await
    }
}

/// Index facts from `store`, comparing its corpus digest against `corpus`.
///
/// Needs no embedding backend, so it works with any configuration.
pub async fn collect_stats(store: &dyn IndexStore, corpus: &CorpusConfig) -> Result<IndexStats> {
    let index = store.load().await?;

    let stale = match &index.corpus_digest {
        Some(digest) => {
            let scanned = scan_corpus_blocking(corpus).await?;
            Some(corpus_digest(&scanned.documents) != *digest)
        }
        None => None,
    };

    Ok(IndexStats {
        documents: index.document_count,
        chunks: index.chunks.len(),
        dims: index.dims(),
        built_at: index.built_at,
        model: index.model.clone(),
        stale,
    })
}
