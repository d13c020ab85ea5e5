//! RAG pipeline orchestrator.
//!
//! The [`RagPipeline`] coordinates the full index-and-retrieve workflow by
//! composing an [`EmbeddingProvider`], a [`VectorStore`], and optional
//! [`Enricher`] and [`Reranker`] collaborators around the chunking core
//! (segment → merge → split → enrich).
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ragmark::{CollectionInfo, InMemoryVectorStore, RagConfig, RagPipeline, RetrievalOptions};
//!
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(my_embedder))
//!     .vector_store(Arc::new(InMemoryVectorStore::new()))
//!     .build()?;
//!
//! let info = CollectionInfo::new("manuals", "product manuals");
//! pipeline.index(&info, Path::new("./docs")).await?;
//! let bundles = pipeline
//!     .retrieve("how do I install?", &["manuals".into()], &RetrievalOptions::default())
//!     .await?;
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tracing::{error, info};

use crate::config::RagConfig;
use crate::document::{CollectionInfo, Unit};
use crate::embedding::EmbeddingProvider;
use crate::enrich::{enrich_units, Enricher};
use crate::error::{RagError, Result};
use crate::merge::merge_small_blocks;
use crate::reranker::Reranker;
use crate::retrieval::{postprocess, RetrievalOptions};
use crate::segment::segment_dir;
use crate::split::split_blocks;
use crate::tokens::{TokenCounter, TokenSizer};
use crate::vectorstore::VectorStore;

/// The RAG pipeline orchestrator.
///
/// Holds collaborator handles and nothing else; construct one per process
/// via [`RagPipeline::builder()`] and pass it around explicitly.
pub struct RagPipeline {
    config: RagConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
    enricher: Option<Arc<dyn Enricher>>,
    reranker: Option<Arc<dyn Reranker>>,
    sizer: Arc<dyn TokenSizer>,
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the vector store.
    pub fn vector_store(&self) -> &Arc<dyn VectorStore> {
        &self.vector_store
    }

    /// Chunk every Markdown document under `dir` without touching the store:
    /// segment → merge undersized blocks → sentence-split with paragraph
    /// backreference → optional enrichment.
    ///
    /// Exposed separately so chunking output can be inspected before
    /// committing an index.
    pub async fn chunk_dir(&self, dir: &Path) -> Vec<Unit> {
        let blocks = segment_dir(dir);
        let blocks = merge_small_blocks(blocks, self.config.min_chunk_size, self.sizer.as_ref());
        let units = split_blocks(&blocks, self.config.max_chunk_size, self.sizer.as_ref());
        info!(unit_count = units.len(), "chunked directory");

        match (&self.enricher, self.config.context_retrieval) {
            (Some(enricher), true) => {
                enrich_units(
                    units,
                    Arc::clone(enricher),
                    self.config.max_workers,
                    &self.config.language,
                )
                .await
            }
            _ => units,
        }
    }

    /// Index a directory of Markdown documents into a collection:
    /// chunk → embed → store, then write the collection's registry entry.
    ///
    /// Returns the number of units stored. Success and failure are
    /// collection-level; there is no per-unit write status.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::PipelineError`] if embedding or storage fails.
    pub async fn index(&self, collection: &CollectionInfo, dir: &Path) -> Result<usize> {
        let mut units = self.chunk_dir(dir).await;
        if units.is_empty() {
            info!(collection = %collection.name, unit_count = 0, "indexed collection (empty)");
            return Ok(0);
        }

        let texts: Vec<&str> = units.iter().map(|u| u.embedding_text()).collect();
        let embeddings = self.embedding_provider.embed_batch(&texts).await.map_err(|e| {
            error!(collection = %collection.name, error = %e, "embedding failed during indexing");
            RagError::PipelineError(format!(
                "embedding failed for collection '{}': {e}",
                collection.name
            ))
        })?;
        for (unit, embedding) in units.iter_mut().zip(embeddings) {
            unit.embedding = embedding;
        }

        let dimensions = self.embedding_provider.dimensions();
        self.vector_store.create_collection(collection, dimensions).await.map_err(|e| {
            error!(collection = %collection.name, error = %e, "failed to create collection");
            RagError::PipelineError(format!(
                "failed to create collection '{}': {e}",
                collection.name
            ))
        })?;
        self.vector_store.upsert(&collection.name, &units).await.map_err(|e| {
            error!(collection = %collection.name, error = %e, "upsert failed during indexing");
            RagError::PipelineError(format!(
                "upsert failed for collection '{}': {e}",
                collection.name
            ))
        })?;

        info!(collection = %collection.name, unit_count = units.len(), "indexed collection");
        Ok(units.len())
    }

    /// Delete a collection and its registry entry.
    pub async fn delete_collection(&self, name: &str) -> Result<()> {
        self.vector_store.delete_collection(name).await.map_err(|e| {
            error!(collection = name, error = %e, "failed to delete collection");
            RagError::PipelineError(format!("failed to delete collection '{name}': {e}"))
        })
    }

    /// List the registry entries of all indexed collections.
    pub async fn list_collections(&self) -> Result<Vec<CollectionInfo>> {
        self.vector_store.list_collections().await
    }

    /// Retrieve an answer-ready paragraph bundle per collection.
    ///
    /// The question is embedded once; each requested collection is searched
    /// and post-processed independently (cutoff → rerank → dedup → format).
    /// Requesting an unknown collection, or a search/rerank failure in any
    /// collection, fails the whole call — no partial ranking is returned.
    pub async fn retrieve(
        &self,
        question: &str,
        collections: &[String],
        options: &RetrievalOptions,
    ) -> Result<HashMap<String, String>> {
        if options.similarity_top_k == 0 {
            return Err(RagError::ConfigError(
                "similarity_top_k must be greater than zero".to_string(),
            ));
        }
        if options.rerank_top_n.is_some() && self.reranker.is_none() {
            return Err(RagError::ConfigError(
                "reranking requested but no reranker is configured".to_string(),
            ));
        }

        let query_embedding = self.embedding_provider.embed(question).await.map_err(|e| {
            error!(error = %e, "embedding failed during retrieval");
            RagError::PipelineError(format!("query embedding failed: {e}"))
        })?;

        let mut bundles = HashMap::new();
        for name in collections {
            if !self.vector_store.collection_exists(name).await? {
                return Err(RagError::VectorStoreError {
                    backend: "registry".to_string(),
                    message: format!("collection '{name}' does not exist"),
                });
            }

            let candidates = self
                .vector_store
                .search(name, &query_embedding, options.similarity_top_k)
                .await
                .map_err(|e| {
                    error!(collection = %name, error = %e, "vector store search failed");
                    RagError::PipelineError(format!("search failed in collection '{name}': {e}"))
                })?;

            let bundle =
                postprocess(question, candidates, options, self.reranker.as_deref()).await?;
            bundles.insert(name.clone(), bundle);
        }

        info!(collection_count = bundles.len(), "retrieval completed");
        Ok(bundles)
    }
}

/// Builder for constructing a [`RagPipeline`].
///
/// `config`, `embedding_provider`, and `vector_store` are required;
/// `enricher`, `reranker`, and `token_sizer` are optional. The default
/// token sizer is tiktoken's `cl100k_base`.
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    enricher: Option<Arc<dyn Enricher>>,
    reranker: Option<Arc<dyn Reranker>>,
    sizer: Option<Arc<dyn TokenSizer>>,
}

impl RagPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the vector store backend.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    /// Set an optional contextual enricher.
    pub fn enricher(mut self, enricher: Arc<dyn Enricher>) -> Self {
        self.enricher = Some(enricher);
        self
    }

    /// Set an optional reranker for post-search filtering.
    pub fn reranker(mut self, reranker: Arc<dyn Reranker>) -> Self {
        self.reranker = Some(reranker);
        self
    }

    /// Override the token sizer (tests use a deterministic word counter).
    pub fn token_sizer(mut self, sizer: Arc<dyn TokenSizer>) -> Self {
        self.sizer = Some(sizer);
        self
    }

    /// Build the [`RagPipeline`], validating that all required pieces are
    /// present and consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if a required field is missing, if
    /// `context_retrieval` is enabled without an enricher, or if the default
    /// token encoding fails to load.
    pub fn build(self) -> Result<RagPipeline> {
        let config =
            self.config.ok_or_else(|| RagError::ConfigError("config is required".to_string()))?;
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let vector_store = self
            .vector_store
            .ok_or_else(|| RagError::ConfigError("vector_store is required".to_string()))?;
        if config.context_retrieval && self.enricher.is_none() {
            return Err(RagError::ConfigError(
                "context_retrieval is enabled but no enricher is configured".to_string(),
            ));
        }
        let sizer = match self.sizer {
            Some(sizer) => sizer,
            None => Arc::new(TokenCounter::new()?),
        };

        Ok(RagPipeline {
            config,
            embedding_provider,
            vector_store,
            enricher: self.enricher,
            reranker: self.reranker,
            sizer,
        })
    }
}
