//! Text shaping, line wrapping and glyph drawing.

mod raster;
mod shaping;
mod wrap;

pub use raster::{LineSlot, Palette, draw_line, draw_text};
pub use shaping::{ShapedGlyph, ShapedRun, measure_text, shape};
pub use wrap::wrap_line;
