//! Text measurement.
//!
//! Sizes are estimated from display cell widths: wide (CJK) characters count
//! as two cells, combining marks as zero. The pixel constants assume the
//! monospace metrics the deck styles are designed around.

use unicode_width::UnicodeWidthStr;

/// Estimated advance of one cell, in pixels.
pub const CHAR_WIDTH: f32 = 8.0;

/// Line height, in pixels.
pub const LINE_HEIGHT: f32 = 16.0;

/// Display width of a string in cells.
pub fn string_width(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

/// Unwrapped pixel width of the widest line.
pub fn text_width(text: &str) -> f32 {
    text.lines()
        .map(string_width)
        .max()
        .unwrap_or(0) as f32
        * CHAR_WIDTH
}

/// Height of `text` wrapped into `max_width` pixels, in pixels.
///
/// Wrapping is greedy by word; a word wider than the line gets a line of its
/// own rather than being split.
pub fn measure_text_height(text: &str, max_width: f32) -> f32 {
    if text.trim().is_empty() {
        return 0.0;
    }
    let cells_per_line = (max_width / CHAR_WIDTH).floor().max(1.0) as usize;

    let mut lines = 0usize;
    for source_line in text.lines() {
        let mut used = 0usize;
        let mut line_open = false;
        for word in source_line.split_whitespace() {
            let width = string_width(word);
            let needed = if line_open { width + 1 } else { width };
            if line_open && used + needed > cells_per_line {
                lines += 1;
                used = width;
            } else {
                used += needed;
                line_open = true;
            }
        }
        lines += 1;
    }

    lines as f32 * LINE_HEIGHT
}
