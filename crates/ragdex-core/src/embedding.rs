//! Embedding trait and vector utilities.
//!
//! [`Embedder`] is implemented by the hosted and offline backends in the
//! `ragdex` app crate. Backends return raw vectors; [`embed_text`] and
//! [`embed_texts`] are the gateway entry points and L2-normalize every
//! vector, so a plain [`dot`] product of two gateway outputs equals their
//! cosine similarity.

use async_trait::async_trait;

use crate::error::{RagError, Result};

/// Trait for embedding backends.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Returns the model identifier (e.g. `"text-embedding-3-small"`).
    fn model_name(&self) -> &str;

    /// Returns the vector dimensionality, when known up front.
    fn dims(&self) -> Option<usize>;

    /// Embed a batch of texts, returning one raw vector per input, in order.
    ///
    /// Transport failures, timeouts, and malformed responses surface as
    /// [`RagError::EmbeddingBackend`]. Implementations must not retry.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Embed a single text and normalize it to unit length.
pub async fn embed_text(embedder: &dyn Embedder, text: &str) -> Result<Vec<f32>> {
    let mut vectors = embed_texts(embedder, &[text.to_string()]).await?;
    vectors
        .pop()
        .ok_or_else(|| RagError::EmbeddingBackend("empty embedding response".to_string()))
}

/// Embed a batch of texts and normalize each vector to unit length.
///
/// Fails with [`RagError::EmbeddingBackend`] if the backend returns a
/// different number of vectors than it was given texts.
pub async fn embed_texts(embedder: &dyn Embedder, texts: &[String]) -> Result<Vec<Vec<f32>>> {
    if texts.is_empty() {
        return Ok(Vec::new());
    }

    let raw = embedder.embed_batch(texts).await?;
    if raw.len() != texts.len() {
        return Err(RagError::EmbeddingBackend(format!(
            "expected {} embeddings from {}, got {}",
            texts.len(),
            embedder.model_name(),
            raw.len()
        )));
    }
    if let Some(position) = raw.iter().position(|v| v.is_empty()) {
        return Err(RagError::EmbeddingBackend(format!(
            "{} returned an empty embedding for input {}",
            embedder.model_name(),
            position
        )));
    }

    Ok(raw.into_iter().map(normalize).collect())
}

/// Scale a vector to unit L2 norm.
///
/// A zero vector has no direction; its norm is treated as `1.0` so the
/// vector is returned unchanged rather than filled with NaN.
pub fn normalize(mut vec: Vec<f32>) -> Vec<f32> {
    let norm = l2_norm(&vec);
    let norm = if norm == 0.0 { 1.0 } else { norm };
    for v in vec.iter_mut() {
        *v /= norm;
    }
    vec
}

/// Euclidean length of a vector, accumulated in `f64`.
pub fn l2_norm(vec: &[f32]) -> f32 {
    vec.iter()
        .map(|&v| f64::from(v) * f64::from(v))
        .sum::<f64>()
        .sqrt() as f32
}

/// Dot product of two vectors. Equals cosine similarity for unit vectors.
///
/// Returns `0.0` for vectors of different lengths.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Compute cosine similarity between two arbitrary vectors.
///
/// Returns a value in `[-1.0, 1.0]`:
/// - `1.0` = identical direction
/// - `0.0` = orthogonal (unrelated)
/// - `-1.0` = opposite direction
///
/// Returns `0.0` for empty vectors or vectors of different lengths.
///
/// # Formula
///
/// ```text
///            a · b
/// cos(θ) = ─────────
///          ‖a‖ × ‖b‖
/// ```
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}
