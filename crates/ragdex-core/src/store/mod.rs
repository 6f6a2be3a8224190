//! Index storage abstraction.
//!
//! An [`IndexStore`] owns the persisted index artifact and keeps the most
//! recently loaded or saved [`Index`] resident. Callers always receive an
//! `Arc<Index>` snapshot: a save builds a brand-new value and swaps the
//! cached pointer, so readers holding the previous snapshot are never
//! affected by a concurrent rebuild.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Index;

/// Abstract storage backend for the chunk index.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`load`](IndexStore::load) | Cached index, or read it from storage |
/// | [`save`](IndexStore::save) | Persist a full index and swap the cache |
/// | [`cached`](IndexStore::cached) | Resident index without touching storage |
#[async_trait]
pub trait IndexStore: Send + Sync {
    /// Return the resident index, reading the artifact if nothing is cached.
    ///
    /// A missing artifact yields an empty, never-built [`Index`], not an
    /// error. An unparseable one yields
    /// [`RagError::MalformedIndex`](crate::RagError::MalformedIndex).
    async fn load(&self) -> Result<Arc<Index>>;

    /// Replace the persisted artifact with `index` and make it resident.
    async fn save(&self, index: Index) -> Result<Arc<Index>>;

    /// The resident index, if any.
    fn cached(&self) -> Option<Arc<Index>>;
}
