//! Layout measurement.
//!
//! The fit-to-container rescale needs the mounted content's natural size.
//! [`measure`] computes it with a flexbox pass; [`text_measure`] provides
//! the cell-based text metrics it leans on.

mod measure;
mod text_measure;

pub use measure::natural_size;
pub use text_measure::{measure_text_height, string_width, CHAR_WIDTH, LINE_HEIGHT};
