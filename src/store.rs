//! Flat-file JSON index store.
//!
//! The whole index is one JSON document:
//!
//! ```json
//! {"chunks": [{"id": "chunk-0", "doc": "a.md", "chunk_index": 0,
//!              "text": "...", "embedding": [0.1, ...]}],
//!  "doc_count": 1, "built_at": "2024-05-01T12:00:00Z",
//!  "model": "text-embedding-3-small", "corpus_digest": "..."}
//! ```
//!
//! Saves write a temporary file next to the artifact and rename it into
//! place, so a crash mid-write leaves the previous artifact intact.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use ragdex_core::models::Index;
use ragdex_core::store::IndexStore;
use ragdex_core::{RagError, Result};

pub struct JsonFileStore {
    path: PathBuf,
    cache: RwLock<Option<Arc<Index>>>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: RwLock::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the artifact, bypassing the cache. `Ok(None)` if it does not exist.
    pub async fn read_from_disk(&self) -> Result<Option<Index>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(RagError::Storage {
                    path: self.path.display().to_string(),
                    source,
                })
            }
        };

        let mut index: Index =
            serde_json::from_slice(&bytes).map_err(|e| self.malformed(e.to_string()))?;
        index.validate().map_err(|m| self.malformed(m))?;

        if index.built_at.is_none() {
            index.built_at = Some(self.modified_at().await);
        }

        Ok(Some(index))
    }

    fn malformed(&self, message: String) -> RagError {
        RagError::MalformedIndex {
            path: self.path.display().to_string(),
            message,
        }
    }

    /// Artifacts written without `built_at` date from the file's mtime.
    async fn modified_at(&self) -> DateTime<Utc> {
        tokio::fs::metadata(&self.path)
            .await
            .and_then(|m| m.modified())
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now())
    }

    fn set_cache(&self, index: Arc<Index>) {
        let mut slot = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(index);
    }
}

#[async_trait]
impl IndexStore for JsonFileStore {
    async fn load(&self) -> Result<Arc<Index>> {
        if let Some(index) = self.cached() {
            return Ok(index);
        }

        match self.read_from_disk().await? {
            Some(index) => {
                tracing::debug!(
                    path = %self.path.display(),
                    chunks = index.chunks.len(),
                    "loaded index"
                );
                let index = Arc::new(index);
                self.set_cache(index.clone());
                Ok(index)
            }
            // Not cached: a later build by another process must still be seen.
            None => Ok(Arc::new(Index::default())),
        }
    }

    async fn save(&self, index: Index) -> Result<Arc<Index>> {
        let bytes = serde_json::to_vec(&index).map_err(|e| RagError::Storage {
            path: self.path.display().to_string(),
            source: io::Error::new(io::ErrorKind::InvalidData, e),
        })?;

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&path, &bytes))
            .await
            .map_err(|e| RagError::Storage {
                path: self.path.display().to_string(),
                source: io::Error::other(e),
            })?
            .map_err(|source| RagError::Storage {
                path: self.path.display().to_string(),
                source,
            })?;

        let index = Arc::new(index);
        self.set_cache(index.clone());
        tracing::info!(
            path = %self.path.display(),
            chunks = index.chunks.len(),
            "saved index"
        );
        Ok(index)
    }

    fn cached(&self) -> Option<Arc<Index>> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

fn write_atomically(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&parent)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
