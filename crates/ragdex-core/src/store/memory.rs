//! In-memory [`IndexStore`] implementation for tests and embedding.
//!
//! Holds the index behind `std::sync::RwLock`. Nothing is persisted, so a
//! fresh store behaves like a never-built index.

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Index;

use super::IndexStore;

/// In-memory store; the "artifact" is the resident value itself.
pub struct InMemoryIndexStore {
    index: RwLock<Option<Arc<Index>>>,
}

impl InMemoryIndexStore {
    pub fn new() -> Self {
        Self {
            index: RwLock::new(None),
        }
    }

    /// Start from an existing index, e.g. one built by a test fixture.
    pub fn with_index(index: Index) -> Self {
        Self {
            index: RwLock::new(Some(Arc::new(index))),
        }
    }
}

impl Default for InMemoryIndexStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IndexStore for InMemoryIndexStore {
    async fn load(&self) -> Result<Arc<Index>> {
        Ok(self
            .cached()
            .unwrap_or_else(|| Arc::new(Index::default())))
    }

    async fn save(&self, index: Index) -> Result<Arc<Index>> {
        let index = Arc::new(index);
        let mut slot = self.index.write().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(index.clone());
        Ok(index)
    }

    fn cached(&self) -> Option<Arc<Index>> {
        self.index
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
