//! Error types for the `ragmark` crate.

use thiserror::Error;

/// Errors that can occur in RAG operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    VectorStoreError {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred during document segmentation or chunking.
    #[error("Chunking error: {0}")]
    ChunkingError(String),

    /// An error occurred during contextual enrichment of a single unit.
    ///
    /// The pipeline logs these and drops the affected unit; they never
    /// abort the batch.
    #[error("Enrichment error ({provider}): {message}")]
    EnrichmentError {
        /// The enrichment provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred during result reranking.
    ///
    /// When reranking is enabled, this fails the whole collection's
    /// retrieval call; reranking is never silently skipped.
    #[error("Reranker error ({reranker}): {message}")]
    RerankerError {
        /// The reranker that produced the error.
        reranker: String,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error. Fatal at pipeline construction.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An error in the indexing/retrieval pipeline orchestration.
    #[error("Pipeline error: {0}")]
    PipelineError(String),
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
