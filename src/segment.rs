//! Markdown segmentation.
//!
//! Splits documents into structural [`Block`]s at heading boundaries,
//! preserving per-block provenance (`file_name`, `file_path`, heading
//! breadcrumb). Blocks are emitted in document order; no block ever spans
//! two documents.

use std::path::Path;

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::document::{Block, BlockMeta};

/// Segment every `*.md` file under `dir` (recursively, sorted by path) into
/// blocks.
///
/// An unreadable file is logged and skipped; it does not abort the other
/// documents.
pub fn segment_dir(dir: &Path) -> Vec<Block> {
    let mut files: Vec<_> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(e) => {
                warn!(error = %e, "failed to walk directory entry");
                None
            }
        })
        .filter(|e| {
            e.file_type().is_file()
                && e.path().extension().and_then(|ext| ext.to_str()) == Some("md")
        })
        .map(|e| e.into_path())
        .collect();
    files.sort();

    let mut blocks = Vec::new();
    for path in files {
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "failed to read document, skipping");
                continue;
            }
        };
        let file_name =
            path.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_string();
        let file_path = path.display().to_string();
        let file_blocks = segment_markdown(&text, &file_name, &file_path);
        debug!(file = %file_path, block_count = file_blocks.len(), "segmented document");
        blocks.extend(file_blocks);
    }
    blocks
}

/// Split one Markdown document into heading-delimited blocks.
///
/// Each heading starts a new block; the heading line itself stays in the
/// block's text. The `header_path` breadcrumb is the `/`-joined stack of
/// enclosing headings with a leading `/`, e.g. `/Manual/Install`. Content
/// before the first heading becomes a block with no `header_path`. Lines
/// inside fenced code blocks (``` or ~~~) are never treated as headings.
pub fn segment_markdown(text: &str, file_name: &str, file_path: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut headers: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_path: Option<String> = None;
    let mut in_fence = false;

    let push_block = |body: &str, header_path: Option<String>, blocks: &mut Vec<Block>| {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return;
        }
        blocks.push(Block {
            text: trimmed.to_string(),
            meta: BlockMeta {
                file_name: file_name.to_string(),
                file_path: file_path.to_string(),
                header_path,
            },
        });
    };

    for line in text.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
        }
        let level = trimmed.chars().take_while(|c| *c == '#').count();
        let is_heading = !in_fence
            && level > 0
            && level <= 6
            && trimmed[level..].starts_with(|c: char| c.is_whitespace());

        if is_heading {
            push_block(&current, current_path.clone(), &mut blocks);
            current.clear();

            let header_text = trimmed[level..].trim().to_string();
            headers.truncate(level.saturating_sub(1));
            headers.push(header_text);
            current_path = Some(format!("/{}", headers.join("/")));
            current.push_str(line);
        } else {
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(line);
        }
    }
    push_block(&current, current_path, &mut blocks);

    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "\
preamble text

# Intro
intro body

## Scope
scope body

# Usage
usage body
";

    #[test]
    fn heading_paths_nest_and_reset() {
        let blocks = segment_markdown(DOC, "doc.md", "/docs/doc.md");
        assert_eq!(blocks.len(), 4);

        assert_eq!(blocks[0].text, "preamble text");
        assert_eq!(blocks[0].meta.header_path, None);

        assert_eq!(blocks[1].meta.header_path.as_deref(), Some("/Intro"));
        assert!(blocks[1].text.starts_with("# Intro"));

        assert_eq!(blocks[2].meta.header_path.as_deref(), Some("/Intro/Scope"));

        // An H1 after an H2 truncates the breadcrumb back to one level.
        assert_eq!(blocks[3].meta.header_path.as_deref(), Some("/Usage"));
    }

    #[test]
    fn provenance_is_attached_to_every_block() {
        let blocks = segment_markdown(DOC, "doc.md", "/docs/doc.md");
        for block in &blocks {
            assert_eq!(block.meta.file_name, "doc.md");
            assert_eq!(block.meta.file_path, "/docs/doc.md");
        }
    }

    #[test]
    fn hash_without_space_is_not_a_heading() {
        let blocks = segment_markdown("#hashtag text\nmore", "a.md", "a.md");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].meta.header_path, None);
    }

    #[test]
    fn hash_comments_inside_fences_are_body_text() {
        let doc = "\
# Setup

Run this:

```bash
# install deps
apt-get install foo
```

Done.
";
        let blocks = segment_markdown(doc, "setup.md", "setup.md");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].meta.header_path.as_deref(), Some("/Setup"));
        assert!(blocks[0].text.contains("# install deps"));
        assert!(blocks[0].text.ends_with("Done."));
    }

    #[test]
    fn tilde_fences_also_suppress_headings() {
        let doc = "# Top\n~~~\n## not a heading\n~~~\nafter\n";
        let blocks = segment_markdown(doc, "a.md", "a.md");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].meta.header_path.as_deref(), Some("/Top"));
    }

    #[test]
    fn unreadable_files_do_not_abort_siblings() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("good.md"), "# Ok\nbody").unwrap();
        // Invalid UTF-8 makes read_to_string fail for this file only.
        std::fs::write(dir.path().join("bad.md"), [0xFF, 0xFE, 0xFD]).unwrap();

        let blocks = segment_dir(dir.path());
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].meta.file_name, "good.md");
    }

    #[test]
    fn files_are_processed_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.md"), "bee").unwrap();
        std::fs::write(dir.path().join("a.md"), "aye").unwrap();

        let blocks = segment_dir(dir.path());
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].meta.file_name, "a.md");
        assert_eq!(blocks[1].meta.file_name, "b.md");
    }
}
