//! # ragdex core
//!
//! Runtime-free logic for ragdex: the data model, line-packing chunker,
//! embedding and chat traits, vector math, the index store abstraction,
//! similarity retrieval, and prompt composition.
//!
//! This crate contains no tokio, filesystem, or HTTP dependencies. The
//! `ragdex` app crate supplies the hosted gateways, the flat-file store,
//! the corpus scanner, and the CLI.
//!
//! ## Data Flow
//!
//! ```text
//! corpus text ─▶ chunk_text ─▶ Embedder ─▶ Index ─▶ IndexStore
//!                                                      │
//!            question ─▶ Embedder ─▶ retrieve ◀────────┘
//!                                       │
//!                                       ▼
//!                               prompt::compose ─▶ ChatModel
//! ```

pub mod chat;
pub mod chunk;
pub mod embedding;
pub mod error;
pub mod models;
pub mod prompt;
pub mod retrieve;
pub mod store;

pub use error::{RagError, Result};
