//! Embedding backends.
//!
//! Implements [`Embedder`] for:
//! - **[`OpenAiEmbedder`]**: the OpenAI-compatible `POST {url}/embeddings` API.
//! - **[`OllamaEmbedder`]**: a local Ollama instance's `POST {url}/api/embed`.
//! - **[`HashingEmbedder`]**: offline feature hashing, no network at all.
//!
//! Backends return raw vectors. Normalization happens in
//! [`ragdex_core::embedding::embed_texts`], which every caller goes through.
//!
//! Requests are sent exactly once. A timeout, transport error, non-2xx
//! status or malformed body becomes [`RagError::EmbeddingBackend`] and the
//! caller decides what to do with it.
//!
//! # Provider Selection
//!
//! ```rust,no_run
//! # use ragdex::config::EmbeddingConfig;
//! # use ragdex::embedding::create_embedder;
//! # use ragdex_core::embedding::Embedder;
//! let config = EmbeddingConfig {
//!     provider: "hashing".to_string(),
//!     dims: Some(256),
//!     ..EmbeddingConfig::default()
//! };
//! let embedder = create_embedder(&config).unwrap();
//! assert_eq!(embedder.model_name(), "hashing-256");
//! ```

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;

use ragdex_core::embedding::Embedder;
use ragdex_core::{RagError, Result};

use crate::config::EmbeddingConfig;

const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";
const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Build the configured embedding backend.
///
/// Credentials are checked here, so a missing API key fails at startup
/// rather than on the first request.
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    create_optional_embedder(config)?.ok_or_else(embedding_disabled)
}

/// Like [`create_embedder`], but a disabled provider yields `None`.
pub fn create_optional_embedder(config: &EmbeddingConfig) -> Result<Option<Arc<dyn Embedder>>> {
    let embedder: Arc<dyn Embedder> = match config.provider.as_str() {
        "disabled" => return Ok(None),
        "openai" => Arc::new(OpenAiEmbedder::new(config)?),
        "ollama" => Arc::new(OllamaEmbedder::new(config)?),
        "hashing" => {
            let dims = config.dims.ok_or_else(|| {
                RagError::Configuration("embedding.dims required for hashing provider".to_string())
            })?;
            Arc::new(HashingEmbedder::new(dims)?)
        }
        other => {
            return Err(RagError::Configuration(format!(
                "Unknown embedding provider: {}",
                other
            )))
        }
    };
    Ok(Some(embedder))
}

/// Error for operations that need embeddings while the provider is disabled.
pub fn embedding_disabled() -> RagError {
    RagError::Configuration(
        "embedding provider is disabled; set [embedding] provider to openai, ollama, or hashing"
            .to_string(),
    )
}

fn http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| RagError::Configuration(format!("failed to build HTTP client: {}", e)))
}

fn base_url(configured: Option<&str>, default: &str) -> String {
    configured
        .unwrap_or(default)
        .trim_end_matches('/')
        .to_string()
}

/// Send a request and decode a successful JSON body.
async fn send_json(request: reqwest::RequestBuilder, service: &str) -> Result<serde_json::Value> {
    let response = request
        .send()
        .await
        .map_err(|e| RagError::EmbeddingBackend(format!("{} request failed: {}", service, e)))?;

    let status = response.status();
    if !status.is_success() {
        let body_text = response.text().await.unwrap_or_default();
        return Err(RagError::EmbeddingBackend(format!(
            "{} API error {}: {}",
            service, status, body_text
        )));
    }

    response
        .json()
        .await
        .map_err(|e| RagError::EmbeddingBackend(format!("{} returned invalid JSON: {}", service, e)))
}

fn json_to_vector(value: &serde_json::Value, service: &str) -> Result<Vec<f32>> {
    let items = value.as_array().ok_or_else(|| {
        RagError::EmbeddingBackend(format!("Invalid {} response: embedding is not an array", service))
    })?;

    items
        .iter()
        .map(|v| {
            v.as_f64().map(|f| f as f32).ok_or_else(|| {
                RagError::EmbeddingBackend(format!(
                    "Invalid {} response: non-numeric embedding value",
                    service
                ))
            })
        })
        .collect()
}

// ============ OpenAI ============

/// Embedding backend for the OpenAI embeddings API (or a compatible server).
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
    dims: Option<usize>,
}

impl OpenAiEmbedder {
    /// # Errors
    ///
    /// [`RagError::Configuration`] if `model` is unset or the variable named
    /// by `api_key_env` is missing or empty.
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let model = config.model.clone().ok_or_else(|| {
            RagError::Configuration("embedding.model required for OpenAI provider".to_string())
        })?;
        let api_key = read_api_key(&config.api_key_env)?;

        Ok(Self {
            client: http_client(config.timeout_secs)?,
            url: base_url(config.url.as_deref(), DEFAULT_OPENAI_URL),
            api_key,
            model,
            dims: config.dims,
        })
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dims(&self) -> Option<usize> {
        self.dims
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });

        let request = self
            .client
            .post(format!("{}/embeddings", self.url))
            .bearer_auth(&self.api_key)
            .json(&body);

        let json = send_json(request, "OpenAI").await?;
        parse_openai_response(&json)
    }
}

/// Read a credential from the environment.
pub(crate) fn read_api_key(var: &str) -> Result<String> {
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(RagError::Configuration(format!(
            "{} environment variable not set",
            var
        ))),
    }
}

/// Extract `data[].embedding`, ordered by each item's `index` when present.
///
/// Every index must be in range and appear once.
fn parse_openai_response(json: &serde_json::Value) -> Result<Vec<Vec<f32>>> {
    let data = json.get("data").and_then(|d| d.as_array()).ok_or_else(|| {
        RagError::EmbeddingBackend("Invalid OpenAI response: missing data array".to_string())
    })?;

    let mut slots: Vec<Option<Vec<f32>>> = vec![None; data.len()];
    for (position, item) in data.iter().enumerate() {
        let embedding = item.get("embedding").ok_or_else(|| {
            RagError::EmbeddingBackend("Invalid OpenAI response: missing embedding".to_string())
        })?;
        let index = item
            .get("index")
            .and_then(|i| i.as_u64())
            .map(|i| i as usize)
            .unwrap_or(position);
        let slot = slots.get_mut(index).ok_or_else(|| {
            RagError::EmbeddingBackend(format!(
                "Invalid OpenAI response: index {} out of range for {} embeddings",
                index,
                data.len()
            ))
        })?;
        if slot.is_some() {
            return Err(RagError::EmbeddingBackend(format!(
                "Invalid OpenAI response: duplicate index {}",
                index
            )));
        }
        *slot = Some(json_to_vector(embedding, "OpenAI")?);
    }

    Ok(slots.into_iter().flatten().collect())
}

// ============ Ollama ============

/// Embedding backend for a local Ollama instance.
///
/// Requires Ollama to be running with the model pulled
/// (e.g. `ollama pull nomic-embed-text`).
pub struct OllamaEmbedder {
    client: reqwest::Client,
    url: String,
    model: String,
    dims: Option<usize>,
}

impl OllamaEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let model = config.model.clone().ok_or_else(|| {
            RagError::Configuration("embedding.model required for Ollama provider".to_string())
        })?;

        Ok(Self {
            client: http_client(config.timeout_secs)?,
            url: base_url(config.url.as_deref(), DEFAULT_OLLAMA_URL),
            model,
            dims: config.dims,
        })
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dims(&self) -> Option<usize> {
        self.dims
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });

        let request = self
            .client
            .post(format!("{}/api/embed", self.url))
            .json(&body);

        let json = send_json(request, "Ollama").await.map_err(|e| match e {
            RagError::EmbeddingBackend(msg) => RagError::EmbeddingBackend(format!(
                "{} (is Ollama running at {}?)",
                msg, self.url
            )),
            other => other,
        })?;
        parse_ollama_response(&json)
    }
}

fn parse_ollama_response(json: &serde_json::Value) -> Result<Vec<Vec<f32>>> {
    let embeddings = json
        .get("embeddings")
        .and_then(|e| e.as_array())
        .ok_or_else(|| {
            RagError::EmbeddingBackend(
                "Invalid Ollama response: missing embeddings array".to_string(),
            )
        })?;

    embeddings
        .iter()
        .map(|e| json_to_vector(e, "Ollama"))
        .collect()
}

// ============ Hashing ============

/// Offline bag-of-words embedder.
///
/// Each lowercase alphanumeric token is hashed with SHA-256 and counted in
/// one of `dims` buckets. Texts sharing words get similar vectors, which is
/// enough for smoke tests and air-gapped use.
pub struct HashingEmbedder {
    dims: usize,
    name: String,
}

impl HashingEmbedder {
    pub fn new(dims: usize) -> Result<Self> {
        if dims == 0 {
            return Err(RagError::Configuration(
                "embedding.dims must be > 0".to_string(),
            ));
        }
        Ok(Self {
            dims,
            name: format!("hashing-{}", dims),
        })
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vec = vec![0.0f32; self.dims];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let digest = Sha256::digest(token.to_lowercase().as_bytes());
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_le_bytes(bytes) % self.dims as u64) as usize;
            vec[bucket] += 1.0;
        }
        vec
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    fn model_name(&self) -> &str {
        &self.name
    }

    fn dims(&self) -> Option<usize> {
        Some(self.dims)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragdex_core::embedding::{dot, embed_text, l2_norm};

    fn hashing_config(dims: usize) -> EmbeddingConfig {
        EmbeddingConfig {
            provider: "hashing".to_string(),
            dims: Some(dims),
            ..EmbeddingConfig::default()
        }
    }

    #[test]
    fn test_parse_openai_response_orders_by_index() {
        let json = serde_json::json!({
            "data": [
                {"index": 1, "embedding": [0.0, 1.0]},
                {"index": 0, "embedding": [1.0, 0.0]}
            ]
        });
        let vectors = parse_openai_response(&json).unwrap();
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn test_parse_openai_response_rejects_bad_indices() {
        let duplicate = serde_json::json!({
            "data": [
                {"index": 0, "embedding": [1.0, 0.0]},
                {"index": 0, "embedding": [0.0, 1.0]}
            ]
        });
        assert!(matches!(
            parse_openai_response(&duplicate).unwrap_err(),
            RagError::EmbeddingBackend(_)
        ));

        let out_of_range = serde_json::json!({
            "data": [
                {"index": 0, "embedding": [1.0, 0.0]},
                {"index": 5, "embedding": [0.0, 1.0]}
            ]
        });
        assert!(matches!(
            parse_openai_response(&out_of_range).unwrap_err(),
            RagError::EmbeddingBackend(_)
        ));
    }

    #[test]
    fn test_parse_openai_response_missing_data() {
        let err = parse_openai_response(&serde_json::json!({"error": "nope"})).unwrap_err();
        assert!(matches!(err, RagError::EmbeddingBackend(_)));
    }

    #[test]
    fn test_parse_openai_response_non_numeric() {
        let json = serde_json::json!({"data": [{"embedding": [0.5, "x"]}]});
        assert!(parse_openai_response(&json).is_err());
    }

    #[test]
    fn test_parse_ollama_response() {
        let json = serde_json::json!({"embeddings": [[0.25, 0.5], [1.0, 2.0]]});
        let vectors = parse_ollama_response(&json).unwrap();
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[1], vec![1.0, 2.0]);

        let bad = serde_json::json!({"embeddings": [1.0]});
        assert!(parse_ollama_response(&bad).is_err());
    }

    #[test]
    fn test_disabled_provider_is_configuration_error() {
        let err = create_embedder(&EmbeddingConfig::default()).err().unwrap();
        assert!(matches!(err, RagError::Configuration(_)));
        assert!(create_optional_embedder(&EmbeddingConfig::default())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_openai_missing_key_fails_at_construction() {
        let config = EmbeddingConfig {
            provider: "openai".to_string(),
            model: Some("text-embedding-3-small".to_string()),
            api_key_env: "RAGDEX_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..EmbeddingConfig::default()
        };
        let err = create_embedder(&config).err().unwrap();
        match err {
            RagError::Configuration(msg) => {
                assert!(msg.contains("RAGDEX_TEST_KEY_THAT_IS_NEVER_SET"))
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_hashing_zero_dims_rejected() {
        assert!(HashingEmbedder::new(0).is_err());
    }

    #[tokio::test]
    async fn test_hashing_is_deterministic_and_case_insensitive() {
        let embedder = create_embedder(&hashing_config(64)).unwrap();
        let a = embedder
            .embed_batch(&["Invoice due".to_string()])
            .await
            .unwrap();
        let b = embedder
            .embed_batch(&["invoice DUE".to_string()])
            .await
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(a[0].len(), 64);
        assert_eq!(a[0].iter().sum::<f32>(), 2.0);
    }

    #[tokio::test]
    async fn test_hashing_shared_words_score_higher() {
        let embedder = HashingEmbedder::new(256).unwrap();
        let q = embed_text(&embedder, "invoice payment").await.unwrap();
        let near = embed_text(&embedder, "the invoice payment is due")
            .await
            .unwrap();
        let far = embed_text(&embedder, "sunny weather tomorrow").await.unwrap();
        assert!((l2_norm(&q) - 1.0).abs() < 1e-5);
        assert!(dot(&q, &near) > dot(&q, &far));
    }
}
