//! Vector store trait for storing and searching embedded units.

use async_trait::async_trait;

use crate::document::{CollectionInfo, ScoredCandidate, Unit};
use crate::error::Result;

/// A storage backend for embedded units with similarity search.
///
/// Implementations manage named collections of [`Unit`]s and double as the
/// collection registry: descriptive [`CollectionInfo`] is written when a
/// collection is created and read back to validate retrieval requests.
///
/// # Example
///
/// ```rust,ignore
/// use ragmark::{CollectionInfo, InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.create_collection(&CollectionInfo::new("docs", "manuals"), 384).await?;
/// store.upsert("docs", &units).await?;
/// let hits = store.search("docs", &query_embedding, 5).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create a named collection with its registry entry. No-op if it
    /// already exists.
    async fn create_collection(&self, info: &CollectionInfo, dimensions: usize) -> Result<()>;

    /// Delete a named collection, its registry entry, and all its units.
    async fn delete_collection(&self, name: &str) -> Result<()>;

    /// List the registry entries of all collections.
    async fn list_collections(&self) -> Result<Vec<CollectionInfo>>;

    /// Whether a collection with this name exists.
    async fn collection_exists(&self, name: &str) -> Result<bool> {
        Ok(self.list_collections().await?.iter().any(|c| c.name == name))
    }

    /// Upsert units into a collection. Units must have embeddings set.
    async fn upsert(&self, collection: &str, units: &[Unit]) -> Result<()>;

    /// Search for the `top_k` units most similar to the given embedding.
    ///
    /// Returns candidates ordered by descending similarity score.
    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredCandidate>>;
}
