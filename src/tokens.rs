//! Sub-word token counting.
//!
//! Every size decision in the pipeline (merge threshold, split budget) is
//! made in tokens of a fixed encoding, not characters. The production
//! counter is tiktoken's `cl100k_base`; the [`TokenSizer`] trait keeps the
//! merge and split algorithms testable with a cheap deterministic sizer.

use tiktoken_rs::{cl100k_base, CoreBPE};

use crate::error::{RagError, Result};

/// Counts sub-word tokens in a text span.
pub trait TokenSizer: Send + Sync {
    /// Number of tokens in `text`.
    fn count_tokens(&self, text: &str) -> usize;
}

/// A [`TokenSizer`] backed by tiktoken's `cl100k_base` encoding.
///
/// Construction loads the BPE ranks once; share one counter across the
/// pipeline.
pub struct TokenCounter {
    bpe: CoreBPE,
}

impl TokenCounter {
    /// Create a counter for the `cl100k_base` encoding.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if the encoding fails to load.
    pub fn new() -> Result<Self> {
        let bpe = cl100k_base().map_err(|e| {
            RagError::ConfigError(format!("failed to load cl100k_base encoding: {e}"))
        })?;
        Ok(Self { bpe })
    }
}

impl TokenSizer for TokenCounter {
    fn count_tokens(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }
}

impl std::fmt::Debug for TokenCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCounter").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_are_stable_and_nonzero() {
        let counter = TokenCounter::new().unwrap();
        let text = "The quick brown fox jumps over the lazy dog.";
        let first = counter.count_tokens(text);
        assert!(first > 0);
        assert_eq!(first, counter.count_tokens(text));
    }

    #[test]
    fn empty_text_counts_zero() {
        let counter = TokenCounter::new().unwrap();
        assert_eq!(counter.count_tokens(""), 0);
    }
}
