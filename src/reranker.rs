//! Reranker trait for secondary relevance scoring.

use async_trait::async_trait;

use crate::error::Result;

/// A sanitized candidate handed to the reranker: identifier plus normalized
/// text, no metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RerankDoc {
    /// Stable identifier mapping back to the original candidate.
    pub id: String,
    /// Whitespace-collapsed, truncated candidate text.
    pub text: String,
}

/// A reranker that judges which candidates are most relevant to a query.
///
/// Implementations can use cross-encoder models, LLM-based scoring, or
/// other strategies to improve precision beyond initial vector similarity.
/// The reranker sees only sanitized copies; the post-processor maps the
/// returned identifiers back onto the original candidates.
#[async_trait]
pub trait Reranker: Send + Sync {
    /// Return the identifiers of the `top_n` documents most relevant to
    /// `query`, most relevant first.
    async fn rerank(&self, query: &str, docs: &[RerankDoc], top_n: usize) -> Result<Vec<String>>;
}

/// A no-op reranker that keeps the given order, truncated to `top_n`.
///
/// Useful as a stand-in when wiring a pipeline before a real reranker is
/// available.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpReranker;

#[async_trait]
impl Reranker for NoOpReranker {
    async fn rerank(&self, _query: &str, docs: &[RerankDoc], top_n: usize) -> Result<Vec<String>> {
        Ok(docs.iter().take(top_n).map(|d| d.id.clone()).collect())
    }
}
