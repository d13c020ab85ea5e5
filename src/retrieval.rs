//! Retrieval post-processing: similarity cutoff, reranking, paragraph-level
//! deduplication, and bundle formatting.
//!
//! Vector search returns scored fragments; this module turns them into an
//! answer-ready text block per collection. Because every unit carries the
//! full text of its original paragraph (see [`crate::split`]), the final
//! bundle lists whole paragraphs, each exactly once, no matter how many
//! fragments of it were retrieved.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::document::ScoredCandidate;
use crate::error::{RagError, Result};
use crate::reranker::{RerankDoc, Reranker};

/// Sentinel returned when no paragraph survives filtering. Never empty, so
/// callers can test for it.
pub const NOT_FOUND: &str = "Information Not Found";

/// Header line of a non-empty bundle.
const BUNDLE_HEADER: &str = "List Paragraph Related:\n";

/// Maximum characters of candidate text passed to the reranker.
const RERANK_TEXT_LIMIT: usize = 30_000;

static DASH_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("-+").expect("valid dash regex"));
static WS_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Per-request retrieval tuning.
///
/// `None` disables the corresponding optional stage. Defaults mirror a
/// typical setup: 20 raw hits, cutoff at 0.5, rerank down to 5.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalOptions {
    /// Number of raw candidates requested from vector search.
    pub similarity_top_k: usize,
    /// Inclusive minimum similarity score; candidates scoring below are
    /// dropped. `None` disables the cutoff.
    pub similarity_cutoff: Option<f32>,
    /// Number of candidates the reranker keeps. `None` disables reranking.
    pub rerank_top_n: Option<usize>,
}

impl Default for RetrievalOptions {
    fn default() -> Self {
        Self { similarity_top_k: 20, similarity_cutoff: Some(0.5), rerank_top_n: Some(5) }
    }
}

/// Normalize one candidate text for the reranker: collapse dash and
/// whitespace runs, truncate, and carry no metadata.
fn sanitize_for_rerank(candidate: &ScoredCandidate) -> RerankDoc {
    let text = DASH_RUN_RE.replace_all(&candidate.unit.text, "-");
    let text = WS_RUN_RE.replace_all(&text, " ");
    let text: String = text.chars().take(RERANK_TEXT_LIMIT).collect();
    RerankDoc { id: candidate.unit.id.clone(), text }
}

/// Apply cutoff → rerank → dedup → format to one collection's candidates.
///
/// Reranking is applied to sanitized copies only; the surviving candidates
/// keep their original text and metadata. A reranker failure fails the whole
/// call — a partially ranked result is never returned.
pub async fn postprocess(
    question: &str,
    mut candidates: Vec<ScoredCandidate>,
    options: &RetrievalOptions,
    reranker: Option<&dyn Reranker>,
) -> Result<String> {
    if let Some(cutoff) = options.similarity_cutoff {
        candidates.retain(|c| c.score >= cutoff);
        debug!(surviving = candidates.len(), cutoff, "applied similarity cutoff");
    }

    if let Some(top_n) = options.rerank_top_n {
        let reranker = reranker.ok_or_else(|| RagError::RerankerError {
            reranker: "none".to_string(),
            message: "reranking requested but no reranker is configured".to_string(),
        })?;
        let docs: Vec<RerankDoc> = candidates.iter().map(sanitize_for_rerank).collect();
        let kept_ids = reranker.rerank(question, &docs, top_n).await?;
        let kept: HashSet<String> = kept_ids.into_iter().collect();
        // Filter the originals; sanitized copies go no further.
        candidates.retain(|c| kept.contains(c.id()));
        debug!(surviving = candidates.len(), top_n, "applied rerank filter");
    }

    let survivors = dedup_paragraphs(candidates);
    Ok(format_bundle(&survivors))
}

/// Keep the first candidate per distinct `paragraph_id`, in the given order.
///
/// Candidates with an empty `paragraph_id` or empty
/// `paragraph_full_content` are excluded entirely. Idempotent: running it
/// on its own output changes nothing.
pub fn dedup_paragraphs(candidates: Vec<ScoredCandidate>) -> Vec<ScoredCandidate> {
    let mut seen: HashSet<String> = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| {
            if c.unit.paragraph_id.is_empty() || c.unit.paragraph_full_content.is_empty() {
                return false;
            }
            seen.insert(c.unit.paragraph_id.clone())
        })
        .collect()
}

/// The display string for one surviving paragraph.
fn paragraph_display(candidate: &ScoredCandidate) -> String {
    format!(
        "Position: {}{}\n\nContent:\n {}",
        candidate.unit.meta.file_path,
        candidate.unit.meta.header_path_str(),
        candidate.unit.paragraph_full_content,
    )
}

/// Render the final bundle: the [`NOT_FOUND`] sentinel when nothing
/// survived, otherwise a header plus 1-indexed `<paragraph_i>` sections.
pub fn format_bundle(survivors: &[ScoredCandidate]) -> String {
    if survivors.is_empty() {
        return NOT_FOUND.to_string();
    }

    let mut documents = BUNDLE_HEADER.to_string();
    for (i, candidate) in survivors.iter().enumerate() {
        let n = i + 1;
        documents.push_str(&format!(
            "\n<paragraph_{n}>\n\n{}\n\n</paragraph_{n}>\n\n",
            paragraph_display(candidate)
        ));
    }
    documents
}
