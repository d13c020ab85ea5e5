//! Sentence-level splitting with paragraph backreference.
//!
//! Re-splits (possibly merged) blocks into units of at most `max_size`
//! tokens using a layered separator hierarchy: blank line → newline →
//! sentence terminators (Latin and CJK/Vietnamese) → whitespace, with a
//! character-window fallback for degenerate runs. Zero overlap between
//! consecutive units.
//!
//! Before splitting, each block's full text is hashed; every unit derived
//! from that block carries the same `paragraph_id` and the verbatim
//! `paragraph_full_content`, so retrieval can later surface the whole
//! original paragraph from any of its fragments.

use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};

use crate::document::{Block, Unit};
use crate::tokens::TokenSizer;

/// Sentence fragments ending in a Latin or CJK/Vietnamese terminator.
static SENTENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[^,.;。？！]+[,.;。？！]?").expect("valid sentence regex"));

/// A word together with its trailing whitespace, so segments rejoin losslessly.
static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S+\s*").expect("valid word regex"));

/// Separator hierarchy, applied in priority order.
#[derive(Debug, Clone, Copy)]
enum SplitLevel {
    Paragraph,
    Line,
    Sentence,
    Word,
}

const LEVELS: [SplitLevel; 4] =
    [SplitLevel::Paragraph, SplitLevel::Line, SplitLevel::Sentence, SplitLevel::Word];

/// SHA-256 hex digest of a block's full pre-split text.
pub fn paragraph_id(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// Split every block into bounded units carrying the block's identity.
///
/// Unit order within a block matches the original text; unit ids are
/// `{paragraph_id}_{index}` and unique per input block sequence.
pub fn split_blocks(
    blocks: &[Block],
    max_size: usize,
    sizer: &dyn TokenSizer,
) -> Vec<Unit> {
    let mut units = Vec::new();
    for (block_index, block) in blocks.iter().enumerate() {
        let id = paragraph_id(&block.text);
        for (i, text) in split_text(&block.text, max_size, sizer).into_iter().enumerate() {
            units.push(Unit {
                id: format!("{id}_{block_index}_{i}"),
                text,
                paragraph_id: id.clone(),
                paragraph_full_content: block.text.clone(),
                meta: block.meta.clone(),
                embedding: Vec::new(),
            });
        }
    }
    units
}

/// Split `text` into pieces of at most `max_size` tokens, zero overlap.
pub fn split_text(text: &str, max_size: usize, sizer: &dyn TokenSizer) -> Vec<String> {
    split_at_level(text, max_size, sizer, 0)
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn split_at_level(
    text: &str,
    max_size: usize,
    sizer: &dyn TokenSizer,
    level: usize,
) -> Vec<String> {
    if sizer.count_tokens(text) <= max_size {
        return vec![text.to_string()];
    }
    let Some(split_level) = LEVELS.get(level) else {
        // Nothing finer than words: fall back to a character window. A
        // token always covers at least one character, so a window of
        // `max_size` characters stays within the token budget.
        return split_by_chars(text, max_size.max(1));
    };

    let segments = segment(text, *split_level);
    let mut chunks = Vec::new();
    let mut current = String::new();

    for seg in segments {
        if current.is_empty() {
            current = seg.to_string();
        } else if sizer.count_tokens(&format!("{current}{seg}")) <= max_size {
            current.push_str(seg);
        } else {
            flush(current, max_size, sizer, level, &mut chunks);
            current = seg.to_string();
        }
    }
    if !current.is_empty() {
        flush(current, max_size, sizer, level, &mut chunks);
    }
    chunks
}

/// Emit a packed chunk, descending a level if it still exceeds the budget.
fn flush(
    chunk: String,
    max_size: usize,
    sizer: &dyn TokenSizer,
    level: usize,
    out: &mut Vec<String>,
) {
    if sizer.count_tokens(&chunk) > max_size {
        out.extend(split_at_level(&chunk, max_size, sizer, level + 1));
    } else {
        out.push(chunk);
    }
}

/// Split at one separator level, keeping separators attached so that
/// concatenating the segments reproduces the input.
fn segment(text: &str, level: SplitLevel) -> Vec<&str> {
    match level {
        SplitLevel::Paragraph => split_keeping_separator(text, "\n\n"),
        SplitLevel::Line => split_keeping_separator(text, "\n"),
        SplitLevel::Sentence => SENTENCE_RE.find_iter(text).map(|m| m.as_str()).collect(),
        SplitLevel::Word => WORD_RE.find_iter(text).map(|m| m.as_str()).collect(),
    }
}

/// Split at a separator while keeping it attached to the preceding segment.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut result = Vec::new();
    let mut start = 0;

    while let Some(pos) = text[start..].find(separator) {
        let end = start + pos + separator.len();
        result.push(&text[start..end]);
        start = end;
    }
    if start < text.len() {
        result.push(&text[start..]);
    }
    result
}

/// Character-window fallback, respecting UTF-8 boundaries.
fn split_by_chars(text: &str, window: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        if current.chars().count() >= window {
            chunks.push(std::mem::take(&mut current));
        }
        current.push(ch);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::BlockMeta;
    use crate::tokens::TokenSizer;

    struct WordSizer;

    impl TokenSizer for WordSizer {
        fn count_tokens(&self, text: &str) -> usize {
            text.split_whitespace().count()
        }
    }

    fn block(text: &str) -> Block {
        Block {
            text: text.to_string(),
            meta: BlockMeta {
                file_name: "a.md".to_string(),
                file_path: "/docs/a.md".to_string(),
                header_path: Some("/A".to_string()),
            },
        }
    }

    #[test]
    fn small_block_stays_whole() {
        let units = split_blocks(&[block("one two three")], 10, &WordSizer);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].text, "one two three");
    }

    #[test]
    fn splits_on_blank_lines_first() {
        let text = "alpha beta gamma\n\ndelta epsilon zeta";
        let units = split_blocks(&[block(text)], 4, &WordSizer);
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].text, "alpha beta gamma");
        assert_eq!(units[1].text, "delta epsilon zeta");
    }

    #[test]
    fn every_unit_respects_the_token_budget() {
        let text = "a b c d e f g h. i j k l m n o p. q r s t u v w x.";
        let units = split_blocks(&[block(text)], 6, &WordSizer);
        assert!(units.len() > 1);
        for unit in &units {
            assert!(WordSizer.count_tokens(&unit.text) <= 6, "oversized: {:?}", unit.text);
        }
    }

    #[test]
    fn units_share_id_and_full_content_and_keep_order() {
        let text = "first part here\n\nsecond part here\n\nthird part here";
        let units = split_blocks(&[block(text)], 3, &WordSizer);
        assert_eq!(units.len(), 3);
        let id = paragraph_id(text);
        for unit in &units {
            assert_eq!(unit.paragraph_id, id);
            assert_eq!(unit.paragraph_full_content, text);
            assert_eq!(unit.meta.header_path.as_deref(), Some("/A"));
        }
        assert!(units[0].text.starts_with("first"));
        assert!(units[1].text.starts_with("second"));
        assert!(units[2].text.starts_with("third"));
    }

    #[test]
    fn identical_content_in_different_blocks_shares_paragraph_id() {
        let units = split_blocks(&[block("same words"), block("same words")], 10, &WordSizer);
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].paragraph_id, units[1].paragraph_id);
        // But the unit ids themselves stay distinct.
        assert_ne!(units[0].id, units[1].id);
    }

    #[test]
    fn cjk_terminators_split_sentences() {
        let text = "một hai ba bốn。năm sáu bảy tám。";
        let units = split_blocks(&[block(text)], 4, &WordSizer);
        assert_eq!(units.len(), 2);
        assert!(units[0].text.starts_with("một"));
        assert!(units[1].text.starts_with("năm"));
    }

    #[test]
    fn embedding_text_excludes_backreference_fields() {
        let text = "alpha beta\n\ngamma delta";
        let units = split_blocks(&[block(text)], 2, &WordSizer);
        for unit in &units {
            assert!(!unit.embedding_text().contains(&unit.paragraph_id));
            assert!(unit.embedding_text().len() < unit.paragraph_full_content.len());
        }
    }
}
