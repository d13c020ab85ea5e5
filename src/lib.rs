//! # ragmark
//!
//! Markdown chunking, contextual enrichment, and retrieval post-processing
//! for RAG pipelines.
//!
//! ## Overview
//!
//! `ragmark` implements the transformation and filtering logic that sits
//! between raw Markdown documents and a vector store, and between raw
//! search hits and an answer-ready context block:
//!
//! 1. **Segment** documents into heading-delimited blocks with provenance
//!    (`file_name`, `file_path`, heading breadcrumb).
//! 2. **Merge** undersized blocks into same-file neighbors under a token
//!    threshold, with deterministic tie-breaking.
//! 3. **Split** merged blocks into bounded-size units, each carrying a
//!    content hash (`paragraph_id`) and the verbatim original paragraph for
//!    later full-context lookup.
//! 4. Optionally **enrich** each unit with a short situating context via a
//!    bounded pool of concurrent collaborator calls, tolerating per-unit
//!    failure.
//! 5. At query time, **post-process** scored search hits: similarity
//!    cutoff → rerank → paragraph-level dedup → formatted bundle.
//!
//! Embedding models, vector databases, enrichment and rerank services are
//! collaborators behind async traits; [`InMemoryVectorStore`] ships for
//! development and tests, and the `openai` feature adds HTTP clients for
//! OpenAI-compatible services.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::{path::Path, sync::Arc};
//! use ragmark::{CollectionInfo, InMemoryVectorStore, RagConfig, RagPipeline, RetrievalOptions};
//! use ragmark::openai::OpenAIEmbeddingProvider;
//!
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::builder().min_chunk_size(256).max_chunk_size(1024).build()?)
//!     .embedding_provider(Arc::new(OpenAIEmbeddingProvider::from_env()?))
//!     .vector_store(Arc::new(InMemoryVectorStore::new()))
//!     .build()?;
//!
//! pipeline.index(&CollectionInfo::new("manuals", "product manuals"), Path::new("docs")).await?;
//! let bundles = pipeline
//!     .retrieve("How do I install?", &["manuals".into()], &RetrievalOptions::default())
//!     .await?;
//! ```

pub mod config;
pub mod document;
pub mod embedding;
pub mod enrich;
pub mod error;
pub mod inmemory;
pub mod merge;
#[cfg(feature = "openai")]
pub mod openai;
pub mod pipeline;
pub mod reranker;
pub mod retrieval;
pub mod segment;
pub mod split;
pub mod tokens;
pub mod vectorstore;

pub use config::{RagConfig, RagConfigBuilder};
pub use document::{Block, BlockMeta, CollectionInfo, ScoredCandidate, Unit};
pub use embedding::EmbeddingProvider;
pub use enrich::{enrich_units, Enricher, CONTENT_MARKER};
pub use error::{RagError, Result};
pub use inmemory::InMemoryVectorStore;
pub use merge::merge_small_blocks;
pub use pipeline::{RagPipeline, RagPipelineBuilder};
pub use reranker::{NoOpReranker, RerankDoc, Reranker};
pub use retrieval::{dedup_paragraphs, format_bundle, postprocess, RetrievalOptions, NOT_FOUND};
pub use segment::{segment_dir, segment_markdown};
pub use split::{paragraph_id, split_blocks, split_text};
pub use tokens::{TokenCounter, TokenSizer};
pub use vectorstore::VectorStore;
