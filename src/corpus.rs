//! Corpus scanner.
//!
//! Walks `corpus.root`, keeps files whose path relative to the root matches
//! an include glob (case-insensitively) and no exclude glob, and reads them
//! as text. The relative path, with `/` separators, becomes the document id.
//!
//! A missing root is an empty corpus. Unreadable entries are logged and
//! skipped so a single bad file never aborts a rebuild.

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use sha2::{Digest, Sha256};
use std::path::Path;
use walkdir::WalkDir;

use ragdex_core::{RagError, Result};

use crate::config::CorpusConfig;

const DEFAULT_EXCLUDES: [&str; 3] = ["**/.git/**", "**/target/**", "**/node_modules/**"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusDocument {
    /// Path relative to the corpus root.
    pub path: String,
    pub text: String,
}

#[derive(Debug, Default)]
pub struct Corpus {
    /// Sorted by path.
    pub documents: Vec<CorpusDocument>,
    /// Matching entries that could not be read.
    pub skipped: usize,
}

pub fn scan_corpus(config: &CorpusConfig) -> Result<Corpus> {
    let root = &config.root;
    if !root.exists() {
        tracing::warn!(root = %root.display(), "corpus root does not exist; treating as empty");
        return Ok(Corpus::default());
    }

    let include_set = build_globset(&config.include_globs)?;

    let mut excludes: Vec<String> = DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect();
    excludes.extend(config.exclude_globs.iter().cloned());
    let exclude_set = build_globset(&excludes)?;

    let mut corpus = Corpus::default();

    for entry in WalkDir::new(root).follow_links(config.follow_symlinks) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable corpus entry");
                corpus.skipped += 1;
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().replace('\\', "/");

        if exclude_set.is_match(&rel_str) || !include_set.is_match(&rel_str) {
            continue;
        }

        match read_document(path, &rel_str) {
            Ok(doc) => corpus.documents.push(doc),
            Err(e) => {
                tracing::warn!(error = %e, "skipping corpus file");
                corpus.skipped += 1;
            }
        }
    }

    // Sort for deterministic chunk ids
    corpus.documents.sort_by(|a, b| a.path.cmp(&b.path));

    tracing::info!(
        documents = corpus.documents.len(),
        skipped = corpus.skipped,
        root = %root.display(),
        "scanned corpus"
    );
    Ok(corpus)
}

/// [`scan_corpus`] on the blocking thread pool, for async callers.
pub async fn scan_corpus_blocking(config: &CorpusConfig) -> Result<Corpus> {
    let owned = config.clone();
    tokio::task::spawn_blocking(move || scan_corpus(&owned))
        .await
        .map_err(|e| RagError::CorpusRead {
            path: config.root.display().to_string(),
            source: std::io::Error::other(e),
        })?
}

fn read_document(path: &Path, relative_path: &str) -> Result<CorpusDocument> {
    let bytes = std::fs::read(path).map_err(|source| RagError::CorpusRead {
        path: relative_path.to_string(),
        source,
    })?;

    Ok(CorpusDocument {
        path: relative_path.to_string(),
        text: String::from_utf8_lossy(&bytes).into_owned(),
    })
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| RagError::Configuration(format!("invalid glob '{}': {}", pattern, e)))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| RagError::Configuration(format!("invalid glob set: {}", e)))
}

/// SHA-256 over `(path, text)` pairs in path order, hex encoded.
pub fn corpus_digest(documents: &[CorpusDocument]) -> String {
    let mut sorted: Vec<&CorpusDocument> = documents.iter().collect();
    sorted.sort_by(|a, b| a.path.cmp(&b.path));

    let mut hasher = Sha256::new();
    for doc in sorted {
        hasher.update(doc.path.as_bytes());
        hasher.update([0u8]);
        hasher.update(doc.text.as_bytes());
        hasher.update([0u8]);
    }
    format!("{:x}", hasher.finalize())
}
