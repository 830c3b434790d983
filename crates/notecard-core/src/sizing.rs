//! Density-driven font size selection.

use crate::content::Paragraph;

/// Flows with this many paragraphs or more keep the base font size.
pub const ADAPTIVE_PARAGRAPH_LIMIT: usize = 6;

/// Density figures the heuristic is driven by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContentDensity {
    pub chars: usize,
    pub paragraphs: usize,
    pub blank_lines: usize,
}

impl ContentDensity {
    pub fn measure(paragraphs: &[Paragraph]) -> Self {
        Self {
            chars: paragraphs.iter().map(Paragraph::rune_count).sum(),
            paragraphs: paragraphs.len(),
            blank_lines: paragraphs.iter().filter(|p| p.is_blank()).count(),
        }
    }

    /// Extra pixels added on top of the base size for sparse content.
    pub fn size_bonus(&self, text_region_height: u32) -> u32 {
        let non_blank = self.paragraphs.saturating_sub(self.blank_lines);
        let largeness = (self.chars as f64).powf(0.60)
            + (non_blank as f64).powf(1.0)
            + (self.blank_lines as f64).powf(0.70);
        if largeness <= 0.0 {
            return 0;
        }

        let base = f64::from(text_region_height) / 366.0 - (self.blank_lines as f64 + 1.0) / 10.0;
        if base <= 0.0 {
            return 0;
        }
        let zoom = base.powf(1.2);

        (200.0 / largeness * zoom).floor() as u32
    }
}

/// Picks the font size used uniformly for the whole flow.
///
/// Media or long flows keep `base_font_size`; otherwise short content grows.
pub fn effective_font_size(
    paragraphs: &[Paragraph],
    base_font_size: u32,
    text_region_height: u32,
) -> u32 {
    let has_media = paragraphs.iter().any(Paragraph::is_media);
    if has_media || paragraphs.len() >= ADAPTIVE_PARAGRAPH_LIMIT {
        return base_font_size;
    }

    base_font_size + ContentDensity::measure(paragraphs).size_bonus(text_region_height)
}
