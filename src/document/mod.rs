//! Slide document parsing.
//!
//! A slide document is a sequence of blocks separated by lines that are
//! exactly `---`. A block bracketed by delimiters on both sides that parses
//! as a strict key/value mapping is frontmatter; everything else is slide
//! content.

mod frontmatter;
mod splitter;

pub use frontmatter::{merge_frontmatter, parse_strict_mapping};
pub use splitter::split_document;

pub use crate::types::Frontmatter;
