//! # ragdex
//!
//! A flat-file retrieval-augmented generation index.
//!
//! ragdex chunks a directory of plain-text documents, embeds every chunk
//! through a hosted (or offline) embedding backend, persists the result as a
//! single JSON artifact, and answers questions by ranking chunks with cosine
//! similarity and composing a citation-tagged prompt for a chat model.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌────────────┐
//! │  Corpus  │──▶│   Indexer    │──▶│ JSON index │
//! │ .md/.txt │   │ chunk+embed  │   │  (atomic)  │
//! └──────────┘   └──────────────┘   └─────┬──────┘
//!                                         │
//!                     ┌───────────────────┤
//!                     ▼                   ▼
//!               ┌───────────┐      ┌─────────────┐
//!               │ retrieve  │─────▶│ prompt+chat │
//!               └───────────┘      └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! ragdex reindex
//! ragdex retrieve "when is the invoice due?" --top-k 3
//! ragdex ask "when is the invoice due?" --mode retrieve-and-answer
//! ragdex stats
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`corpus`] | Corpus directory scanner |
//! | [`embedding`] | OpenAI, Ollama, and hashing embedders |
//! | [`chat`] | OpenAI chat completions |
//! | [`store`] | Flat-file JSON index store |
//! | [`indexer`] | Chunk + embed rebuild pipeline |
//! | [`service`] | Composition root: reindex, retrieve, ask, stats |
//! | [`reindex`], [`retrieve`], [`ask`], [`stats`] | CLI command output |
//!
//! Runtime-free pieces (data model, chunker, retrieval, prompts) live in
//! the `ragdex-core` crate.

pub mod ask;
pub mod chat;
pub mod config;
pub mod corpus;
pub mod embedding;
pub mod indexer;
pub mod reindex;
pub mod retrieve;
pub mod service;
pub mod stats;
pub mod store;
