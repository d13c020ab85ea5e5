//! Data types for blocks, retrievable units, and search results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Provenance metadata carried by every block and unit.
///
/// This is an explicit struct rather than an open key-value map so that the
/// embedding-exclusion rule for backreference fields (see [`Unit`]) is
/// visible in the type system instead of buried in a key list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct BlockMeta {
    /// Base name of the source file, e.g. `policy.md`.
    pub file_name: String,
    /// Full path of the source file.
    pub file_path: String,
    /// Heading breadcrumb of the enclosing section, e.g. `/Intro/Scope`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_path: Option<String>,
}

impl BlockMeta {
    /// The `header_path` or an empty string when the block sits above any heading.
    pub fn header_path_str(&self) -> &str {
        self.header_path.as_deref().unwrap_or("")
    }
}

/// A structural segment of a Markdown document prior to sentence-level
/// splitting: one heading section or stand-alone paragraph group.
///
/// Blocks are owned by the pipeline's working `Vec`; a block never owns or
/// references its neighbors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Block {
    /// The text content of the block.
    pub text: String,
    /// Provenance metadata.
    pub meta: BlockMeta,
}

/// A bounded-size retrievable item produced by the sentence splitter.
///
/// Every unit derived from one (possibly merged) block shares that block's
/// `paragraph_id` and `paragraph_full_content`, so retrieval can recover the
/// whole original paragraph even though the vector index only ever sees a
/// fragment. Those two fields are *backreference only*: they never enter the
/// embedded representation — see [`Unit::embedding_text`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Unit {
    /// Unique identifier for the unit.
    pub id: String,
    /// The text content that is embedded and searched.
    pub text: String,
    /// SHA-256 hex digest of the original, pre-split block text.
    ///
    /// A pure function of content: two units derived from byte-identical
    /// source blocks share the same id, which is what paragraph-level
    /// deduplication relies on.
    pub paragraph_id: String,
    /// Verbatim text of the original, pre-split block.
    pub paragraph_full_content: String,
    /// Provenance metadata inherited from the source block.
    pub meta: BlockMeta,
    /// The vector embedding for this unit's text. Empty until the pipeline
    /// attaches one.
    pub embedding: Vec<f32>,
}

impl Unit {
    /// The representation fed to the embedding provider.
    ///
    /// Exactly `text`; `paragraph_id` and `paragraph_full_content` are
    /// excluded by construction.
    pub fn embedding_text(&self) -> &str {
        &self.text
    }
}

/// A retrieved [`Unit`] paired with a relevance score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredCandidate {
    /// The retrieved unit.
    pub unit: Unit,
    /// The similarity score (higher is more relevant).
    pub score: f32,
}

impl ScoredCandidate {
    /// The stable identifier used by reranking to map sanitized copies back
    /// to their originals.
    pub fn id(&self) -> &str {
        &self.unit.id
    }
}

/// Descriptive metadata for a named collection in the vector store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollectionInfo {
    /// Unique collection name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// When the collection was created.
    pub created_at: DateTime<Utc>,
}

impl CollectionInfo {
    /// Create a collection record stamped with the current time.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self { name: name.into(), description: description.into(), created_at: Utc::now() }
    }
}
