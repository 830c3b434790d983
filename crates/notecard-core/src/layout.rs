//! Vertical paragraph flow: wrapped text lines interleaved with media.
//!
//! One [`Cursor`] is created per flow and threaded by `&mut` through every
//! drawing step. The overflow check runs before each line is drawn.

use std::ops::ControlFlow;

use ab_glyph::FontArc;
use image::RgbaImage;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::content::{MediaRef, Paragraph, TextLine};
use crate::error::RenderError;
use crate::images::fit_to_width;
use crate::media::{ImageFetcher, fetch_at_boundary};
use crate::paint::overlay;
use crate::text::{LineSlot, Palette, draw_line, shape, wrap_line};

/// Drawing position within one flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    /// 1-based number of the next line to draw.
    pub line_number: u32,
    /// Top edge of the next line slot.
    pub y_offset: u32,
    /// Runes of the current paragraph already drawn.
    pub chars_consumed: usize,
}

impl Default for Cursor {
    fn default() -> Self {
        Self {
            line_number: 1,
            y_offset: 0,
            chars_consumed: 0,
        }
    }
}

impl Cursor {
    pub fn advance_line(&mut self, line_height: u32) {
        self.line_number += 1;
        self.y_offset += line_height;
    }

    /// Whether the next line no longer fits in the region.
    pub fn would_overflow(&self, metrics: &FlowMetrics) -> bool {
        let by_count = u64::from(metrics.font_size) * u64::from(self.line_number) * 12 / 10
            > u64::from(metrics.region_height);
        by_count || self.y_offset + metrics.line_height > metrics.region_height
    }
}

/// Fixed measurements of one flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowMetrics {
    pub font_size: u32,
    pub line_height: u32,
    pub width: u32,
    pub region_height: u32,
}

impl FlowMetrics {
    pub fn new(font_size: u32, width: u32, region_height: u32) -> Self {
        Self {
            font_size,
            line_height: font_size * 12 / 10,
            width,
            region_height,
        }
    }
}

/// Transparent layer holding a finished flow.
#[derive(Debug)]
pub struct TextLayer {
    pub image: RgbaImage,
    pub overflowed: bool,
    pub lines_drawn: u32,
    pub cursor: Cursor,
}

struct FlowPainter<'a> {
    font: &'a FontArc,
    palette: &'a Palette,
    metrics: FlowMetrics,
    cursor: Cursor,
    canvas: RgbaImage,
    lines_drawn: u32,
    overflowed: bool,
}

impl<'a> FlowPainter<'a> {
    fn new(font: &'a FontArc, palette: &'a Palette, metrics: FlowMetrics) -> Self {
        Self {
            font,
            palette,
            metrics,
            cursor: Cursor::default(),
            canvas: RgbaImage::new(metrics.width.max(1), metrics.region_height.max(1)),
            lines_drawn: 0,
            overflowed: false,
        }
    }

    fn blank(&mut self) {
        self.cursor.advance_line(self.metrics.line_height);
    }

    /// Wraps and draws one text paragraph; breaks once the region is full.
    fn text(&mut self, line: &TextLine) -> ControlFlow<()> {
        let run = shape(self.font, line.runes(), self.metrics.font_size as f32);
        self.cursor.chars_consumed = 0;

        for range in wrap_line(&run, line, self.metrics.width as f32) {
            if self.cursor.would_overflow(&self.metrics) {
                self.overflowed = true;
                return ControlFlow::Break(());
            }

            let slot = LineSlot {
                x: 0,
                top: i64::from(self.cursor.y_offset),
                height: self.metrics.line_height,
            };
            self.cursor.chars_consumed += range.len();
            draw_line(
                &mut self.canvas,
                self.font,
                &run,
                line,
                range,
                slot,
                self.palette,
            );
            self.lines_drawn += 1;
            self.cursor.advance_line(self.metrics.line_height);
        }
        ControlFlow::Continue(())
    }

    /// Draws a fetched image at `top`, scaled down to the flow width.
    ///
    /// Returns `false` when the image could not be prepared, leaving the cursor untouched.
    fn media(&mut self, top: u32, image: &RgbaImage) -> bool {
        let fitted = match fit_to_width(image, self.metrics.width) {
            Ok(fitted) => fitted,
            Err(err) => {
                debug!(error = %err, "media resize failed");
                return false;
            }
        };
        overlay(&mut self.canvas, &fitted, 0, i64::from(top));
        self.cursor.y_offset = top + fitted.height();
        true
    }

    fn finish(self) -> TextLayer {
        TextLayer {
            image: self.canvas,
            overflowed: self.overflowed,
            lines_drawn: self.lines_drawn,
            cursor: self.cursor,
        }
    }
}

/// Lays out the full paragraph sequence, fetching media as it is reached.
///
/// # Errors
/// Returns [`RenderError::Cancelled`] if `cancel` fires at a fetch boundary.
pub async fn layout_flow<F: ImageFetcher>(
    paragraphs: &[Paragraph],
    metrics: FlowMetrics,
    font: &FontArc,
    palette: &Palette,
    fetcher: &F,
    cancel: &CancellationToken,
) -> Result<TextLayer, RenderError> {
    let mut painter = FlowPainter::new(font, palette, metrics);

    for (index, paragraph) in paragraphs.iter().enumerate() {
        let step = match paragraph {
            Paragraph::Blank => {
                if !paragraphs.get(index + 1).is_some_and(Paragraph::is_media) {
                    painter.blank();
                }
                ControlFlow::Continue(())
            }
            Paragraph::Text(line) => painter.text(line),
            Paragraph::Media(media) => {
                let top = if index == 0 { 0 } else { painter.cursor.y_offset };
                if top >= metrics.region_height {
                    painter.overflowed = true;
                    break;
                }
                if draw_media(&mut painter, media, top, fetcher, cancel).await? {
                    ControlFlow::Continue(())
                } else {
                    painter.text(&media.fallback_line())
                }
            }
        };
        if step.is_break() {
            break;
        }
    }

    Ok(painter.finish())
}

async fn draw_media<F: ImageFetcher>(
    painter: &mut FlowPainter<'_>,
    media: &MediaRef,
    top: u32,
    fetcher: &F,
    cancel: &CancellationToken,
) -> Result<bool, RenderError> {
    match fetch_at_boundary(fetcher, &media.url, cancel).await? {
        Ok(image) => Ok(painter.media(top, &image)),
        Err(err) => {
            debug!(url = %media.url, error = %err, "media fell back to text");
            Ok(false)
        }
    }
}

/// Lays out text lines without any media; used for the author name.
pub fn layout_lines(
    lines: &[TextLine],
    metrics: FlowMetrics,
    font: &FontArc,
    palette: &Palette,
) -> TextLayer {
    let mut painter = FlowPainter::new(font, palette, metrics);
    for line in lines {
        if painter.text(line).is_break() {
            break;
        }
    }
    painter.finish()
}
