//! Glyph rasterization onto RGBA canvases.

use std::ops::Range;

use ab_glyph::{Font, FontArc, ScaleFont, point};
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_filled_circle_mut;

use super::shaping::{ShapedGlyph, ShapedRun, shape};
use crate::content::{RuneClass, SpanKind, TextLine};
use crate::paint::{blend_at, blend_rect};

/// Draw colors for each span role plus the overlays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub normal: Rgba<u8>,
    pub link: Rgba<u8>,
    pub mention: Rgba<u8>,
    pub hashtag: Rgba<u8>,
    pub emoji: Rgba<u8>,
    pub highlight: Rgba<u8>,
}

impl Palette {
    pub const NOTE: Palette = Palette {
        normal: Rgba([255, 230, 238, 255]),
        link: Rgba([242, 211, 152, 255]),
        mention: Rgba([227, 42, 109, 255]),
        hashtag: Rgba([151, 210, 251, 255]),
        emoji: Rgba([255, 204, 77, 255]),
        highlight: Rgba([255, 230, 238, 40]),
    };

    pub fn for_class(&self, class: RuneClass) -> Rgba<u8> {
        if class.emoji {
            return self.emoji;
        }
        match class.kind {
            SpanKind::Normal => self.normal,
            SpanKind::Link => self.link,
            SpanKind::Mention => self.mention,
            SpanKind::Hashtag => self.hashtag,
        }
    }
}

/// Vertical slot one wrapped line occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSlot {
    pub x: i64,
    pub top: i64,
    pub height: u32,
}

/// Draws the runes in `range` of a shaped paragraph into `slot`.
pub fn draw_line(
    canvas: &mut RgbaImage,
    font: &FontArc,
    run: &ShapedRun,
    line: &TextLine,
    range: Range<usize>,
    slot: LineSlot,
    palette: &Palette,
) {
    let baseline = slot.top as f32 + font.as_scaled(run.scale).ascent();
    let origin = run.x_at(range.start);

    for glyph in &run.glyphs[range] {
        let x = slot.x as f32 + glyph.x - origin;
        let class = line.class_at(glyph.rune);

        if class.highlighted {
            blend_rect(
                canvas,
                x.floor() as i64,
                slot.top,
                glyph.advance.ceil() as u32,
                slot.height,
                palette.highlight,
            );
        }
        if glyph.is_zero_width() || glyph.ch.is_whitespace() {
            continue;
        }

        if class.emoji && glyph.missing {
            draw_emoji_placeholder(canvas, x, slot, glyph, palette.emoji);
        } else {
            draw_glyph(
                canvas,
                font,
                run,
                glyph,
                x,
                baseline,
                palette.for_class(class),
            );
        }
    }
}

fn draw_glyph(
    canvas: &mut RgbaImage,
    font: &FontArc,
    run: &ShapedRun,
    glyph: &ShapedGlyph,
    x: f32,
    baseline: f32,
    color: Rgba<u8>,
) {
    let positioned = glyph.id.with_scale_and_position(run.scale, point(x, baseline));
    let Some(outlined) = font.outline_glyph(positioned) else {
        return;
    };
    let bounds = outlined.px_bounds();
    let (left, top) = (bounds.min.x as i64, bounds.min.y as i64);
    outlined.draw(|gx, gy, coverage| {
        blend_at(
            canvas,
            left + i64::from(gx),
            top + i64::from(gy),
            color,
            coverage,
        );
    });
}

/// Round token standing in for an emoji the embedded font cannot draw.
fn draw_emoji_placeholder(
    canvas: &mut RgbaImage,
    x: f32,
    slot: LineSlot,
    glyph: &ShapedGlyph,
    color: Rgba<u8>,
) {
    let radius = (glyph.advance * 0.35).round() as i32;
    let cx = (x + glyph.advance / 2.0).round() as i32;
    let cy = (slot.top + i64::from(slot.height) / 2) as i32;
    draw_filled_circle_mut(canvas, (cx, cy), radius, color);
}

/// Draws a single-color string with its baseline at `baseline`.
pub fn draw_text(
    canvas: &mut RgbaImage,
    font: &FontArc,
    font_size: f32,
    x: f32,
    baseline: f32,
    color: Rgba<u8>,
    text: &str,
) {
    let runes: Vec<char> = text.chars().collect();
    let run = shape(font, &runes, font_size);
    for glyph in &run.glyphs {
        if glyph.is_zero_width() || glyph.ch.is_whitespace() {
            continue;
        }
        draw_glyph(canvas, font, &run, glyph, x + glyph.x, baseline, color);
    }
}
