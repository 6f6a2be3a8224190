use thiserror::Error;

/// Failure taxonomy shared by every ragdex component.
///
/// An empty index is deliberately absent: retrieving from a missing or
/// empty index yields a well-formed empty [`Retrieval`](crate::models::Retrieval)
/// carrying a status flag instead of an error.
#[derive(Debug, Error)]
pub enum RagError {
    /// Missing credential, disabled provider, or an invalid setting.
    /// Fatal for the call that needed it and never retried.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The embedding service failed, timed out, or answered with a
    /// malformed body. Callers may retry with backoff.
    #[error("embedding backend error: {0}")]
    EmbeddingBackend(String),

    /// The chat completion service failed.
    #[error("chat backend error: {0}")]
    ChatBackend(String),

    /// A single corpus file could not be read. Rebuilds log and skip these.
    #[error("could not read corpus file {path}: {source}")]
    CorpusRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The persisted index exists but cannot be used. A rebuild is required.
    #[error("malformed index artifact at {path}: {message}")]
    MalformedIndex { path: String, message: String },

    /// Reading or writing the persisted index failed.
    #[error("index storage error at {path}: {source}")]
    Storage {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The query embedding does not have the index's dimensionality.
    #[error("query embedding has {actual} dimensions but the index has {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The request itself is unusable (e.g. an empty question).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

pub type Result<T> = std::result::Result<T, RagError>;
