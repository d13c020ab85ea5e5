//! Property tests for chunk merging: termination at a fixed point, file
//! boundaries, and content preservation.

use proptest::prelude::*;
use ragmark::document::{Block, BlockMeta};
use ragmark::merge::merge_small_blocks;
use ragmark::tokens::TokenSizer;

const MIN_SIZE: usize = 50;

/// Deterministic sizer: one token per whitespace-separated word.
struct WordSizer;

impl TokenSizer for WordSizer {
    fn count_tokens(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }
}

/// A block whose words are tagged with its file marker, so cross-file
/// contamination is visible in the text itself.
fn tagged_block(file_idx: usize, words: usize) -> Block {
    let marker = ["wa", "wb", "wc"][file_idx];
    let file = ["a.md", "b.md", "c.md"][file_idx];
    Block {
        text: vec![marker; words].join(" "),
        meta: BlockMeta {
            file_name: file.to_string(),
            file_path: format!("/docs/{file}"),
            header_path: None,
        },
    }
}

fn arb_blocks() -> impl Strategy<Value = Vec<Block>> {
    proptest::collection::vec((0usize..3, 1usize..120), 0..30)
        .prop_map(|specs| specs.into_iter().map(|(f, w)| tagged_block(f, w)).collect())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// After merging, no remaining undersized block has a same-file
    /// neighbor it could still legally merge with.
    #[test]
    fn merge_reaches_a_fixed_point(blocks in arb_blocks()) {
        let merged = merge_small_blocks(blocks, MIN_SIZE, &WordSizer);
        for (i, block) in merged.iter().enumerate() {
            if WordSizer.count_tokens(&block.text) >= MIN_SIZE {
                continue;
            }
            if i > 0 {
                prop_assert_ne!(&merged[i - 1].meta.file_name, &block.meta.file_name);
            }
            if i + 1 < merged.len() {
                prop_assert_ne!(&merged[i + 1].meta.file_name, &block.meta.file_name);
            }
        }
    }

    /// No merged block contains words from a different file.
    #[test]
    fn merge_never_mixes_files(blocks in arb_blocks()) {
        let merged = merge_small_blocks(blocks, MIN_SIZE, &WordSizer);
        for block in &merged {
            let marker = match block.meta.file_name.as_str() {
                "a.md" => "wa",
                "b.md" => "wb",
                _ => "wc",
            };
            prop_assert!(
                block.text.split_whitespace().all(|w| w == marker),
                "block for {} contains foreign words: {:?}",
                block.meta.file_name,
                block.text,
            );
        }
    }

    /// Per file, merging reorders nothing and loses nothing: the
    /// concatenated words before and after are identical.
    #[test]
    fn merge_preserves_per_file_content_and_order(blocks in arb_blocks()) {
        let words_per_file = |blocks: &[Block], file: &str| -> Vec<String> {
            blocks
                .iter()
                .filter(|b| b.meta.file_name == file)
                .flat_map(|b| b.text.split_whitespace().map(str::to_string).collect::<Vec<_>>())
                .collect()
        };

        let before: Vec<Vec<String>> =
            ["a.md", "b.md", "c.md"].iter().map(|f| words_per_file(&blocks, f)).collect();
        let merged = merge_small_blocks(blocks, MIN_SIZE, &WordSizer);
        let after: Vec<Vec<String>> =
            ["a.md", "b.md", "c.md"].iter().map(|f| words_per_file(&merged, f)).collect();

        prop_assert_eq!(before, after);
    }

    /// Identical input always produces identical output, tie-breaks included.
    #[test]
    fn merge_is_deterministic(blocks in arb_blocks()) {
        let once = merge_small_blocks(blocks.clone(), MIN_SIZE, &WordSizer);
        let twice = merge_small_blocks(blocks, MIN_SIZE, &WordSizer);
        prop_assert_eq!(once, twice);
    }
}
