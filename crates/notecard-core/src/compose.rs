//! Final note card compositing: background, overflow fade and the bottom bar.

use chrono::{DateTime, Utc};
use image::{Rgba, RgbaImage};

use crate::assets::Assets;
use crate::content::{AuthorBadge, TextLine};
use crate::error::RenderError;
use crate::images::{crop_to_square, encode_png, resize_image, round_image};
use crate::layout::{FlowMetrics, TextLayer, layout_lines};
use crate::paint::{fade_in_band, fade_out_columns, fill_rect, overlay};
use crate::renderer::run_blocking;
use crate::style::{PreviewStyle, StyleProfile};
use crate::text::{LineSlot, Palette, draw_line, shape, wrap_line};

pub const BACKGROUND: Rgba<u8> = Rgba([23, 23, 23, 255]);
pub const BAR_BACKGROUND: Rgba<u8> = Rgba([10, 10, 10, 255]);
const DATE_COLOR: Rgba<u8> = Rgba([160, 160, 160, 255]);

const OVERFLOW_FADE_HEIGHT: u32 = 140;
const NAME_FADE_LENGTH: u32 = 60;
const AVATAR_INSET: u32 = 10;
const STAMP_BAR_FRACTION: f64 = 0.45;
const DATE_COLUMN_WIDTH: u32 = 240;
const DATE_COLUMN_GAP: u32 = 250;
const DATE_LINE_SPACING: f32 = 1.5;
const DATE_FORMAT: &str = "%b %d, %Y";

/// A finished preview bitmap.
#[derive(Debug)]
pub struct RenderResult {
    pub image: RgbaImage,
    /// Set when the text flow was cut short.
    pub overflowed: bool,
}

impl RenderResult {
    /// # Errors
    /// Returns [`RenderError::Encode`] if PNG encoding fails.
    pub fn encode_png(&self) -> Result<Vec<u8>, RenderError> {
        encode_png(&self.image).map_err(RenderError::Encode)
    }

    /// Encodes on the blocking pool, consuming the bitmap.
    ///
    /// # Errors
    /// Returns [`RenderError::Encode`] if encoding fails, or a fault if it panics.
    pub async fn into_png(self) -> Result<Vec<u8>, RenderError> {
        run_blocking("png encoding", move || self.encode_png()).await
    }
}

pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(DATE_FORMAT).to_string()
}

/// Assembles the text layer and author bar into the final card.
///
/// # Errors
/// Returns [`RenderError::Asset`] if the brand stamp cannot be scaled.
pub fn compose_note(
    profile: &StyleProfile,
    assets: &Assets,
    layer: &TextLayer,
    author: &AuthorBadge,
    avatar: Option<&RgbaImage>,
) -> Result<RenderResult, RenderError> {
    let mut canvas = RgbaImage::from_pixel(profile.width, profile.height, BACKGROUND);
    overlay(
        &mut canvas,
        &layer.image,
        i64::from(profile.padding_left),
        i64::from(StyleProfile::TOP_MARGIN),
    );

    let bar_top = profile.bar_top();
    fill_rect(
        &mut canvas,
        0,
        bar_top as i32,
        profile.width,
        profile.bar_height,
        BAR_BACKGROUND,
    );
    if layer.overflowed {
        let band = OVERFLOW_FADE_HEIGHT.min(bar_top);
        fade_in_band(&mut canvas, i64::from(bar_top - band), band, BACKGROUND);
    }

    if let Some(avatar) = avatar {
        draw_avatar(&mut canvas, profile, avatar);
    }
    draw_author_name(&mut canvas, profile, assets, &author.display_name);
    let stamp_width = draw_stamp(&mut canvas, profile, assets.logo())?;
    let date = format_timestamp(&author.timestamp);
    draw_date(&mut canvas, profile, assets, stamp_width, &date);

    Ok(RenderResult {
        image: canvas,
        overflowed: layer.overflowed,
    })
}

fn draw_avatar(canvas: &mut RgbaImage, profile: &StyleProfile, avatar: &RgbaImage) {
    let side = profile.bar_height.saturating_sub(2 * AVATAR_INSET);
    if side == 0 {
        return;
    }
    let Ok(scaled) = resize_image(&crop_to_square(avatar), side, side) else {
        return;
    };
    overlay(
        canvas,
        &round_image(&scaled),
        i64::from(profile.padding_left),
        i64::from(profile.bar_top() + AVATAR_INSET),
    );
}

fn author_x(profile: &StyleProfile) -> u32 {
    let shift = if profile.style == PreviewStyle::Facebook { 25 } else { 65 };
    profile.padding_left + shift
}

/// Draws the name on one line, then masks whatever runs past half the bar.
fn draw_author_name(
    canvas: &mut RgbaImage,
    profile: &StyleProfile,
    assets: &Assets,
    name: &str,
) {
    let x = author_x(profile);
    let one_line = profile.font_size * 12 / 10;
    let metrics = FlowMetrics::new(profile.font_size, profile.width, one_line);
    let lines = [TextLine::plain(name)];
    let layer = layout_lines(&lines, metrics, assets.font(), &Palette::NOTE);

    let bar_top = profile.bar_top();
    let top = bar_top + profile.bar_height.saturating_sub(metrics.line_height) / 2;
    overlay(canvas, &layer.image, i64::from(x), i64::from(top));

    let padding = i64::from(profile.padding_left);
    let max_width = i64::from(profile.width / 2) - 2 * padding;
    let mask_x = padding + i64::from(x) + max_width;
    let width = i64::from(profile.width);
    if mask_x < width {
        fill_rect(
            canvas,
            mask_x.max(0) as i32,
            bar_top as i32,
            (width - mask_x.max(0)) as u32,
            profile.bar_height,
            BAR_BACKGROUND,
        );
    }
    fade_out_columns(
        canvas,
        mask_x,
        i64::from(bar_top),
        NAME_FADE_LENGTH,
        profile.bar_height,
        BAR_BACKGROUND,
    );
}

/// Draws the brand logo at the right edge of the bar; returns its width.
fn draw_stamp(
    canvas: &mut RgbaImage,
    profile: &StyleProfile,
    logo: &RgbaImage,
) -> Result<u32, RenderError> {
    let stamp_height = f64::from(profile.bar_height) * STAMP_BAR_FRACTION;
    let ratio = f64::from(logo.width()) / f64::from(logo.height().max(1));
    let (w, h) = ((stamp_height * ratio) as u32, stamp_height as u32);

    let stamp =
        resize_image(logo, w, h).map_err(|e| RenderError::Asset(format!("logo: {e}")))?;
    let x =
        i64::from(profile.width) - i64::from(stamp.width()) - i64::from(profile.padding_left);
    let y = profile.bar_top() + (profile.bar_height - stamp.height()) / 2;
    overlay(canvas, &stamp, x, i64::from(y));
    Ok(stamp.width())
}

/// Right-aligned date column left of the stamp.
fn draw_date(
    canvas: &mut RgbaImage,
    profile: &StyleProfile,
    assets: &Assets,
    stamp_width: u32,
    text: &str,
) {
    let font_size = (6.0 * profile.bar_scale * 260.0 / 72.0) as f32;
    let column_x = i64::from(profile.width)
        - i64::from(profile.padding_left)
        - i64::from(stamp_width)
        - i64::from(DATE_COLUMN_GAP);
    let stamp_height = (f64::from(profile.bar_height) * STAMP_BAR_FRACTION) as u32;
    let top = profile.bar_top() + (profile.bar_height - stamp_height) / 2 + 3;

    let palette = Palette {
        normal: DATE_COLOR,
        ..Palette::NOTE
    };
    let line = TextLine::plain(text);
    let run = shape(assets.font(), line.runes(), font_size);
    let line_advance = font_size * DATE_LINE_SPACING;

    let rows = wrap_line(&run, &line, DATE_COLUMN_WIDTH as f32);
    for (row, range) in rows.into_iter().enumerate() {
        let visible = line.runes()[range.clone()]
            .iter()
            .rposition(|c| !c.is_whitespace())
            .map_or(range.start, |last| range.start + last + 1);
        let width = run.width_of(range.start..visible);
        let slot = LineSlot {
            x: column_x + (DATE_COLUMN_WIDTH as f32 - width).round() as i64,
            top: i64::from(top) + (row as f32 * line_advance) as i64,
            height: line_advance as u32,
        };
        draw_line(canvas, assets.font(), &run, &line, range, slot, &palette);
    }
}
