//! Rune sequences to positioned glyph runs.

use std::ops::Range;

use ab_glyph::{Font, FontArc, GlyphId, PxScale, ScaleFont};

use crate::content::is_emoji;

/// A glyph placed on the pen line of its run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapedGlyph {
    /// Index of the source rune; glyphs map one-to-one onto runes.
    pub rune: usize,
    pub ch: char,
    pub id: GlyphId,
    /// Pen position relative to the start of the run.
    pub x: f32,
    pub advance: f32,
    /// The font has no outline for this rune.
    pub missing: bool,
}

impl ShapedGlyph {
    /// Joiners and variation selectors take no room and draw nothing.
    pub fn is_zero_width(&self) -> bool {
        matches!(self.ch, '\u{200D}' | '\u{FE0E}' | '\u{FE0F}')
    }
}

/// Glyphs for one paragraph at one size.
#[derive(Debug, Clone)]
pub struct ShapedRun {
    pub scale: PxScale,
    pub glyphs: Vec<ShapedGlyph>,
}

impl ShapedRun {
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Pen position where the glyph for `rune` starts; `len()` maps to the run's end.
    pub fn x_at(&self, rune: usize) -> f32 {
        match self.glyphs.get(rune) {
            Some(glyph) => glyph.x,
            None => self.total_width(),
        }
    }

    /// Horizontal extent of the runes in `range`.
    pub fn width_of(&self, range: Range<usize>) -> f32 {
        if range.is_empty() {
            return 0.0;
        }
        let last = &self.glyphs[range.end - 1];
        last.x + last.advance - self.glyphs[range.start].x
    }

    pub fn total_width(&self) -> f32 {
        self.glyphs.last().map_or(0.0, |glyph| glyph.x + glyph.advance)
    }
}

/// Shapes `runes` at `font_size` pixels, applying pair kerning.
///
/// Emoji the font cannot draw get a one-em slot for their placeholder.
pub fn shape(font: &FontArc, runes: &[char], font_size: f32) -> ShapedRun {
    let scale = PxScale::from(font_size);
    let scaled = font.as_scaled(scale);

    let mut glyphs = Vec::with_capacity(runes.len());
    let mut pen = 0.0f32;
    let mut previous: Option<GlyphId> = None;

    for (rune, &ch) in runes.iter().enumerate() {
        let id = font.glyph_id(ch);
        let missing = id.0 == 0;
        let mut glyph = ShapedGlyph {
            rune,
            ch,
            id,
            x: pen,
            advance: 0.0,
            missing,
        };

        if glyph.is_zero_width() {
            glyphs.push(glyph);
            continue;
        }

        if let Some(prev) = previous {
            pen += scaled.kern(prev, id);
            glyph.x = pen;
        }

        glyph.advance = if missing && is_emoji(ch) {
            font_size
        } else {
            scaled.h_advance(id)
        };
        pen += glyph.advance;
        previous = Some(id);
        glyphs.push(glyph);
    }

    ShapedRun { scale, glyphs }
}

/// Width of `text` at `font_size` pixels.
pub fn measure_text(font: &FontArc, font_size: f32, text: &str) -> f32 {
    let runes: Vec<char> = text.chars().collect();
    shape(font, &runes, font_size).total_width()
}
