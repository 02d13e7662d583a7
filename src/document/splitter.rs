//! Frontmatter/content splitter.
//!
//! Splits a slide document on delimiter lines and emits ordered
//! [`SlideRecord`]s. Classification is positional: only a block bracketed by
//! delimiter lines on both sides is eligible to be frontmatter, and it must
//! additionally pass the strict mapping parse. Bare `key: value` content
//! that is not bracketed is therefore always content.

use tracing::{debug, warn};

use crate::types::{Frontmatter, SlideRecord};

use super::frontmatter::{merge_frontmatter, parse_strict_mapping};

/// The block delimiter: a line that is exactly these three characters.
const DELIMITER: &str = "---";

/// One raw block between delimiter lines.
struct Block {
    text: String,
    preceded: bool,
    followed: bool,
}

/// Split a slide document into ordered slide records.
///
/// The first frontmatter block encountered before any slide has been emitted
/// becomes the document-level defaults; later frontmatter blocks attach to
/// the next non-whitespace content block. A trailing frontmatter block with
/// no following content is dropped.
pub fn split_document(text: &str) -> Vec<SlideRecord> {
    let blocks = split_blocks(text);

    let mut defaults = Frontmatter::new();
    let mut saw_defaults = false;
    let mut pending: Option<Frontmatter> = None;
    let mut slides = Vec::new();

    for block in &blocks {
        if block.preceded && block.followed {
            match parse_strict_mapping(&block.text) {
                Some(mapping) => {
                    if !saw_defaults && slides.is_empty() && pending.is_none() {
                        defaults = mapping;
                        saw_defaults = true;
                    } else {
                        // Last frontmatter before the content block wins.
                        pending = Some(mapping);
                    }
                    continue;
                }
                None => {
                    if !block.text.trim().is_empty() {
                        warn!("delimited block failed strict mapping parse; treating as content");
                    }
                }
            }
        }

        let content = trim_blank_lines(&block.text);
        if content.is_empty() {
            // An all-whitespace block produces no slide and leaves any
            // pending frontmatter attached to the next real content.
            continue;
        }

        slides.push(SlideRecord {
            ordinal: slides.len() + 1,
            frontmatter: merge_frontmatter(&defaults, pending.take().as_ref()),
            content: content.to_string(),
        });
    }

    if pending.is_some() {
        debug!("trailing frontmatter block with no content; dropped");
    }

    slides
}

/// Split on delimiter lines, recording which blocks are bracketed.
fn split_blocks(text: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut current = String::new();
    let mut preceded = false;

    let mut push = |buf: &mut String, preceded: bool, followed: bool| {
        blocks.push(Block {
            text: std::mem::take(buf),
            preceded,
            followed,
        });
    };

    for line in text.lines() {
        if line.trim_end_matches('\r') == DELIMITER {
            push(&mut current, preceded, true);
            preceded = true;
        } else {
            current.push_str(line);
            current.push('\n');
        }
    }
    push(&mut current, preceded, false);

    blocks
}

/// Trim leading and trailing blank lines, preserving interior structure.
fn trim_blank_lines(block: &str) -> &str {
    block.trim_matches(['\n', '\r', ' ', '\t'])
}

// =============================================================================
// Tests
// =============================================================================
