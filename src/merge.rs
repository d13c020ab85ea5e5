//! Size-aware merging of undersized blocks.
//!
//! A single left-to-right scan folds every block whose token count falls
//! below `min_size` into an adjacent block from the same file, re-evaluating
//! the merged slot before advancing. Each merge removes one element, so the
//! scan is O(n) amortized.

use crate::document::Block;
use crate::tokens::TokenSizer;

/// Concatenate two adjacent blocks, keeping the earlier block's metadata.
fn merge_blocks(first: &Block, second: &Block) -> Block {
    Block {
        text: format!("{}\n\n{}", first.text, second.text),
        meta: first.meta.clone(),
    }
}

/// Merge blocks smaller than `min_size` tokens into an adjacent same-file
/// neighbor.
///
/// When both neighbors are eligible, the smaller one (by token count) wins;
/// on a tie the block merges into its *previous* neighbor. A merge never
/// crosses a `file_name` boundary, and the scan re-evaluates the merged
/// position, so the output is a fixed point: every remaining undersized
/// block has no eligible neighbor left. Document order is preserved.
pub fn merge_small_blocks(
    mut blocks: Vec<Block>,
    min_size: usize,
    sizer: &dyn TokenSizer,
) -> Vec<Block> {
    let mut i = 0;
    while i < blocks.len() {
        let curr_size = sizer.count_tokens(&blocks[i].text);
        if curr_size >= min_size {
            i += 1;
            continue;
        }

        let file_name = &blocks[i].meta.file_name;
        let prev_mergeable = i > 0 && blocks[i - 1].meta.file_name == *file_name;
        let next_mergeable =
            i + 1 < blocks.len() && blocks[i + 1].meta.file_name == *file_name;

        match (prev_mergeable, next_mergeable) {
            (true, true) => {
                let prev_size = sizer.count_tokens(&blocks[i - 1].text);
                let next_size = sizer.count_tokens(&blocks[i + 1].text);
                if prev_size <= next_size {
                    blocks[i - 1] = merge_blocks(&blocks[i - 1], &blocks[i]);
                    blocks.remove(i);
                    // Re-evaluate from the merged slot.
                    i -= 1;
                } else {
                    blocks[i] = merge_blocks(&blocks[i], &blocks[i + 1]);
                    blocks.remove(i + 1);
                }
            }
            (true, false) => {
                blocks[i - 1] = merge_blocks(&blocks[i - 1], &blocks[i]);
                blocks.remove(i);
                i -= 1;
            }
            (false, true) => {
                blocks[i] = merge_blocks(&blocks[i], &blocks[i + 1]);
                blocks.remove(i + 1);
            }
            (false, false) => {
                // Boundary or file change: the undersized block stays.
                i += 1;
            }
        }
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::BlockMeta;

    /// Deterministic sizer for tests: one token per whitespace-separated word.
    pub(crate) struct WordSizer;

    impl TokenSizer for WordSizer {
        fn count_tokens(&self, text: &str) -> usize {
            text.split_whitespace().count()
        }
    }

    fn block(file: &str, words: usize) -> Block {
        Block {
            text: vec!["w"; words].join(" "),
            meta: BlockMeta {
                file_name: file.to_string(),
                file_path: format!("/docs/{file}"),
                header_path: None,
            },
        }
    }

    #[test]
    fn undersized_block_merges_with_smaller_neighbor() {
        // [a:40, a:10, a:200], min 50: block 2 folds into block 1.
        let blocks = vec![block("a", 40), block("a", 10), block("a", 200)];
        let merged = merge_small_blocks(blocks, 50, &WordSizer);
        assert_eq!(merged.len(), 2);
        assert_eq!(WordSizer.count_tokens(&merged[0].text), 50);
        assert_eq!(WordSizer.count_tokens(&merged[1].text), 200);
    }

    #[test]
    fn tie_breaks_into_previous_neighbor() {
        let mut left = block("a", 60);
        left.text = format!("LEFT {}", left.text);
        let mut right = block("a", 61);
        right.text = format!("RIGHT {}", right.text);
        let blocks = vec![left, block("a", 5), right];

        let merged = merge_small_blocks(blocks, 50, &WordSizer);
        assert_eq!(merged.len(), 2);
        assert!(merged[0].text.starts_with("LEFT"));
        assert_eq!(WordSizer.count_tokens(&merged[0].text), 66);
        assert!(merged[1].text.starts_with("RIGHT"));
    }

    #[test]
    fn larger_previous_loses_to_smaller_next() {
        let blocks = vec![block("a", 100), block("a", 5), block("a", 60)];
        let merged = merge_small_blocks(blocks, 50, &WordSizer);
        assert_eq!(merged.len(), 2);
        assert_eq!(WordSizer.count_tokens(&merged[0].text), 100);
        assert_eq!(WordSizer.count_tokens(&merged[1].text), 65);
    }

    #[test]
    fn merge_never_crosses_file_boundary() {
        let blocks = vec![block("a", 200), block("b", 3), block("c", 200)];
        let merged = merge_small_blocks(blocks, 50, &WordSizer);
        assert_eq!(merged.len(), 3);
        assert_eq!(WordSizer.count_tokens(&merged[1].text), 3);
        assert_eq!(merged[1].meta.file_name, "b");
    }

    #[test]
    fn merged_slot_is_revisited_until_fixed_point() {
        // Three tiny blocks collapse transitively into one.
        let blocks = vec![block("a", 10), block("a", 10), block("a", 10)];
        let merged = merge_small_blocks(blocks, 50, &WordSizer);
        assert_eq!(merged.len(), 1);
        assert_eq!(WordSizer.count_tokens(&merged[0].text), 30);
    }

    #[test]
    fn merged_block_keeps_earlier_metadata() {
        let mut first = block("a", 10);
        first.meta.header_path = Some("/First".to_string());
        let mut second = block("a", 10);
        second.meta.header_path = Some("/Second".to_string());

        let merged = merge_small_blocks(vec![first, second], 50, &WordSizer);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].meta.header_path.as_deref(), Some("/First"));
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let merged = merge_small_blocks(Vec::new(), 50, &WordSizer);
        assert!(merged.is_empty());
    }
}
