//! Prompt composition for grounded answers.
//!
//! Retrieved chunks are rendered as citation-tagged context blocks
//! (`[doc#chunk_index]` followed by the chunk text, blocks separated by a
//! blank line) inside framing text that tells the model to answer from the
//! context and to say so when the context is insufficient.
//!
//! When nothing was retrieved the prompt still carries an explicit
//! [`NO_CONTEXT_MARKER`], so the model cannot silently fall back to an
//! ungrounded answer.

use crate::models::RetrievalResult;

/// Placed in the context section when retrieval returned nothing.
pub const NO_CONTEXT_MARKER: &str = "[NO CONTEXT FOUND]";

/// Section headings accepted as a trailing citation list.
const CITATION_SECTIONS: [&str; 4] = ["CITATIONS:", "Citations:", "SOURCES:", "Sources:"];

/// Citation tag for a chunk: `[doc#chunk_index]`.
pub fn citation_tag(document_id: &str, sequence_index: usize) -> String {
    format!("[{}#{}]", document_id, sequence_index)
}

/// Render the context section: one tagged block per result, or the
/// no-context marker.
pub fn context_block(results: &[RetrievalResult]) -> String {
    if results.is_empty() {
        return format!(
            "{}\nThe index returned no passages for this question.",
            NO_CONTEXT_MARKER
        );
    }

    results
        .iter()
        .map(|r| {
            format!(
                "{}\n{}",
                citation_tag(&r.document_id, r.sequence_index),
                r.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Build the grounded prompt for `question` from retrieved chunks.
pub fn compose(question: &str, results: &[RetrievalResult]) -> String {
    let grounding = if results.is_empty() {
        format!(
            "No context was found for this question. Begin your reply by stating that the \
             documents contain no relevant information (the context is marked {}), and do \
             not present an answer as if it were supported by the documents.",
            NO_CONTEXT_MARKER
        )
    } else {
        "Answer using only the context below. Cite every fact with the tag of the passage \
         it comes from, for example [guide.md#0]. If the context is insufficient to answer, \
         say so explicitly instead of guessing."
            .to_string()
    };

    format!(
        "You are a retrieval-augmented assistant.\n\n\
         {}\n\n\
         CONTEXT:\n{}\n\n\
         QUESTION: {}\n",
        grounding,
        context_block(results),
        question.trim()
    )
}

/// Stricter prompt used when a first answer carried no citations.
pub fn compose_citation_retry(question: &str, results: &[RetrievalResult]) -> String {
    let ids = results
        .iter()
        .map(|r| citation_tag(&r.document_id, r.sequence_index))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "You must include citations in your answer.\n\n\
         Available passage tags to cite:\n{}\n\n\
         QUESTION: {}\n\n\
         CONTEXT:\n{}\n\n\
         Rewrite your answer and:\n\
         1. Include inline citations like [filename#chunk_index] for each fact\n\
         2. End with a CITATIONS section listing all sources used\n\
         3. Say explicitly if the context does not answer the question\n",
        ids,
        question.trim(),
        context_block(results)
    )
}

/// Prompt for answering without retrieval.
pub fn plain_prompt(question: &str) -> String {
    format!(
        "You are a helpful assistant. Answer the following question:\n\n{}",
        question.trim()
    )
}

/// Whether an answer cites its sources.
///
/// Accepts either a citation section heading (`CITATIONS:`, `Sources:`) or
/// at least one inline tag of the form `[name#123]`.
pub fn has_citations(answer: &str) -> bool {
    if CITATION_SECTIONS.iter().any(|s| answer.contains(s)) {
        return true;
    }

    answer.match_indices('[').any(|(start, _)| {
        let rest = &answer[start + 1..];
        let Some(end) = rest.find(']') else {
            return false;
        };
        let inner = &rest[..end];
        match inner.rsplit_once('#') {
            Some((name, num)) => {
                !name.is_empty()
                    && !name.chars().any(char::is_whitespace)
                    && !num.is_empty()
                    && num.chars().all(|c| c.is_ascii_digit())
            }
            None => false,
        }
    })
}
