//! Configuration for the RAG pipeline.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Configuration parameters for chunking and enrichment.
///
/// Validation happens once, at pipeline construction; a bad configuration
/// never surfaces per-request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Blocks below this token count are merged into a same-file neighbor.
    pub min_chunk_size: usize,
    /// Maximum tokens per retrievable unit after sentence splitting.
    pub max_chunk_size: usize,
    /// Whether to run contextual enrichment before embedding.
    pub context_retrieval: bool,
    /// Upper bound on concurrent enrichment calls.
    pub max_workers: usize,
    /// Target natural language for enrichment summaries.
    pub language: String,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            min_chunk_size: 256,
            max_chunk_size: 1024,
            context_retrieval: false,
            max_workers: 4,
            language: "English".to_string(),
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the merge threshold in tokens.
    pub fn min_chunk_size(mut self, size: usize) -> Self {
        self.config.min_chunk_size = size;
        self
    }

    /// Set the maximum unit size in tokens.
    pub fn max_chunk_size(mut self, size: usize) -> Self {
        self.config.max_chunk_size = size;
        self
    }

    /// Enable or disable contextual enrichment.
    pub fn context_retrieval(mut self, enabled: bool) -> Self {
        self.config.context_retrieval = enabled;
        self
    }

    /// Set the enrichment worker bound.
    pub fn max_workers(mut self, workers: usize) -> Self {
        self.config.max_workers = workers;
        self
    }

    /// Set the target language for enrichment summaries.
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.config.language = language.into();
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - `max_chunk_size == 0`
    /// - `min_chunk_size >= max_chunk_size`
    /// - `max_workers == 0`
    pub fn build(self) -> Result<RagConfig> {
        if self.config.max_chunk_size == 0 {
            return Err(RagError::ConfigError(
                "max_chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.config.min_chunk_size >= self.config.max_chunk_size {
            return Err(RagError::ConfigError(format!(
                "min_chunk_size ({}) must be less than max_chunk_size ({})",
                self.config.min_chunk_size, self.config.max_chunk_size
            )));
        }
        if self.config.max_workers == 0 {
            return Err(RagError::ConfigError(
                "max_workers must be greater than zero".to_string(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = RagConfig::builder().build().unwrap();
        assert_eq!(config, RagConfig::default());
    }

    #[test]
    fn min_at_or_above_max_is_rejected() {
        let err = RagConfig::builder().min_chunk_size(512).max_chunk_size(512).build();
        assert!(matches!(err, Err(RagError::ConfigError(_))));
    }

    #[test]
    fn zero_workers_is_rejected() {
        let err = RagConfig::builder().max_workers(0).build();
        assert!(matches!(err, Err(RagError::ConfigError(_))));
    }
}
