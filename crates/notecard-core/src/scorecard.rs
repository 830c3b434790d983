//! Fixed-template card for structured score records.
//!
//! Nothing here wraps or adapts: every string sits at a fixed offset from the
//! card's top-left corner, and long strings simply run past their slot.

use ab_glyph::FontArc;
use chrono::{DateTime, Utc};
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::compose::{RenderResult, format_timestamp};
use crate::paint::{fill_rounded_rect, vertical_gradient};
use crate::text::{draw_text, measure_text};

pub const CARD_WIDTH: u32 = 1200;
pub const CARD_HEIGHT: u32 = 630;

const CARD_MARGIN: f64 = 60.0;
const CARD_RADIUS: f64 = 20.0;
const SHADOW_OFFSET: f64 = 5.0;
const DETAIL_INSET: f32 = 40.0;

const DEFAULT_TITLE: &str = "Golf Scorecard";
const SUBTITLE_PLACEHOLDER: &str = "Golf Course";

const GRADIENT_TOP: Rgba<u8> = Rgba([27, 138, 156, 255]);
const GRADIENT_BOTTOM: Rgba<u8> = Rgba([77, 182, 172, 255]);
const PRIMARY: Rgba<u8> = Rgba([27, 138, 156, 255]);
const SHADOW: Rgba<u8> = Rgba([0, 0, 0, 30]);
const CARD: Rgba<u8> = Rgba([255, 255, 255, 255]);
const SUBTITLE_COLOR: Rgba<u8> = Rgba([31, 41, 55, 255]);
const DETAIL_COLOR: Rgba<u8> = Rgba([107, 114, 128, 255]);

pub const UNDER_COLOR: Rgba<u8> = Rgba([76, 175, 80, 255]);
pub const OVER_COLOR: Rgba<u8> = Rgba([244, 67, 54, 255]);
pub const EVEN_COLOR: Rgba<u8> = Rgba([30, 136, 229, 255]);

/// A structured record summarized on the card.
///
/// Every field may be missing; the card applies its own fallbacks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorecardModel {
    pub title: String,
    /// Course or record name.
    pub subtitle: String,
    /// Primary value, e.g. the total score.
    pub value: i32,
    /// Explicit signed delta; derived from `reference_total` when absent.
    pub score_to_par: Option<i32>,
    /// Reference total the delta is measured against (par).
    pub reference_total: i32,
    /// Preferred over the record timestamp in the detail rows.
    pub date: Option<String>,
}

impl ScorecardModel {
    pub fn title(&self) -> &str {
        non_empty(&self.title).unwrap_or(DEFAULT_TITLE)
    }

    pub fn subtitle(&self) -> &str {
        non_empty(&self.subtitle).unwrap_or(SUBTITLE_PLACEHOLDER)
    }

    pub fn delta(&self) -> i32 {
        match self.score_to_par {
            Some(delta) => delta,
            None if self.reference_total > 0 => self.value - self.reference_total,
            None => 0,
        }
    }

    /// `"<value> (<delta>)"`, e.g. `"70 (-2)"` or `"72 (E)"`.
    pub fn primary_text(&self) -> String {
        format!("{} ({})", self.value, format_delta(self.delta()))
    }

    pub fn primary_color(&self) -> Rgba<u8> {
        match self.delta() {
            d if d < 0 => UNDER_COLOR,
            d if d > 0 => OVER_COLOR,
            _ => EVEN_COLOR,
        }
    }

    /// Left-aligned rows under the primary value.
    pub fn detail_rows(&self, player: &str, timestamp: &DateTime<Utc>) -> Vec<String> {
        let date = match self.date.as_deref().and_then(non_empty) {
            Some(date) => date.to_string(),
            None => format_timestamp(timestamp),
        };
        let mut rows = vec![format!("Player: {player}"), format!("Date: {date}")];
        if self.reference_total > 0 {
            rows.push(format!("Par: {}", self.reference_total));
        }
        rows
    }
}

fn non_empty(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// `+N` above zero, the bare number below, `E` at zero.
pub fn format_delta(delta: i32) -> String {
    match delta {
        0 => "E".to_string(),
        d if d > 0 => format!("+{d}"),
        d => d.to_string(),
    }
}

/// Draws the scorecard onto a fresh 1200×630 canvas.
pub fn draw_scorecard(
    font: &FontArc,
    card: &ScorecardModel,
    player: &str,
    timestamp: &DateTime<Utc>,
    brand: &str,
) -> RenderResult {
    let mut canvas = RgbaImage::new(CARD_WIDTH, CARD_HEIGHT);
    vertical_gradient(&mut canvas, GRADIENT_TOP, GRADIENT_BOTTOM);

    let (card_x, card_y) = (CARD_MARGIN, CARD_MARGIN);
    let card_size = (
        f64::from(CARD_WIDTH) - 2.0 * CARD_MARGIN,
        f64::from(CARD_HEIGHT) - 2.0 * CARD_MARGIN,
    );
    fill_rounded_rect(
        &mut canvas,
        (card_x + SHADOW_OFFSET, card_y + SHADOW_OFFSET),
        card_size,
        CARD_RADIUS,
        SHADOW,
    );
    fill_rounded_rect(&mut canvas, (card_x, card_y), card_size, CARD_RADIUS, CARD);

    let (left, top) = (card_x as f32, card_y as f32);
    let mut centered = |size: f32, baseline: f32, color: Rgba<u8>, text: &str| {
        let x = (CARD_WIDTH as f32 - measure_text(font, size, text)) / 2.0;
        draw_text(&mut canvas, font, size, x, top + baseline, color, text);
    };
    centered(48.0, 80.0, PRIMARY, card.title());
    centered(36.0, 140.0, SUBTITLE_COLOR, card.subtitle());
    centered(72.0, 250.0, card.primary_color(), &card.primary_text());

    for (row, text) in card.detail_rows(player, timestamp).iter().enumerate() {
        let baseline = top + 380.0 + 40.0 * row as f32;
        draw_text(
            &mut canvas,
            font,
            24.0,
            left + DETAIL_INSET,
            baseline,
            DETAIL_COLOR,
            text,
        );
    }

    let right = left + card_size.0 as f32;
    let bottom = top + card_size.1 as f32;
    let brand_x = right - measure_text(font, 24.0, brand) - DETAIL_INSET;
    draw_text(
        &mut canvas,
        font,
        24.0,
        brand_x,
        bottom - 40.0,
        PRIMARY,
        brand,
    );

    RenderResult {
        image: canvas,
        overflowed: false,
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::assets::Assets;

    fn card(value: i32, par: i32) -> ScorecardModel {
        ScorecardModel {
            value,
            reference_total: par,
            ..ScorecardModel::default()
        }
    }

    fn timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_even_round() {
        let card = card(72, 72);
        assert_eq!(card.primary_text(), "72 (E)");
        assert_eq!(card.primary_color(), EVEN_COLOR);
    }

    #[test]
    fn test_under_par_round() {
        let card = card(70, 72);
        assert_eq!(card.primary_text(), "70 (-2)");
        assert_eq!(card.primary_color(), UNDER_COLOR);
    }

    #[test]
    fn test_over_par_round() {
        let card = card(75, 72);
        assert_eq!(card.primary_text(), "75 (+3)");
        assert_eq!(card.primary_color(), OVER_COLOR);
    }

    #[test]
    fn test_explicit_delta_wins() {
        let card = ScorecardModel {
            value: 80,
            score_to_par: Some(-1),
            reference_total: 72,
            ..ScorecardModel::default()
        };
        assert_eq!(card.primary_text(), "80 (-1)");
    }

    #[test]
    fn test_missing_par_is_even() {
        assert_eq!(card(68, 0).primary_text(), "68 (E)");
    }

    #[test]
    fn test_fallback_strings() {
        let card = ScorecardModel {
            subtitle: "   ".to_string(),
            ..ScorecardModel::default()
        };
        assert_eq!(card.title(), "Golf Scorecard");
        assert_eq!(card.subtitle(), "Golf Course");
    }

    #[test]
    fn test_detail_rows_prefer_explicit_date() {
        let mut card = card(72, 72);
        assert_eq!(
            card.detail_rows("ana", &timestamp()),
            vec!["Player: ana", "Date: Mar 09, 2024", "Par: 72"]
        );

        card.date = Some("Saturday".to_string());
        card.reference_total = 0;
        assert_eq!(card.detail_rows("ana", &timestamp()), vec!["Player: ana", "Date: Saturday"]);
    }

    #[test]
    fn test_model_deserializes_with_defaults() {
        let card: ScorecardModel =
            serde_json::from_str(r#"{"value": 71, "reference_total": 72}"#).unwrap();
        assert_eq!(card.primary_text(), "71 (-1)");
        assert!(card.date.is_none());
    }

    #[test]
    fn test_draw_fixed_canvas() {
        let assets = Assets::embedded().unwrap();
        let result = draw_scorecard(
            assets.font(),
            &card(70, 72),
            "ana",
            &timestamp(),
            "gambit.golf",
        );
        assert_eq!(result.image.dimensions(), (CARD_WIDTH, CARD_HEIGHT));
        assert!(!result.overflowed);

        // gradient corner, white card interior
        assert_eq!(result.image.get_pixel(0, 0), &GRADIENT_TOP);
        assert_eq!(result.image.get_pixel(100, 330), &CARD);
        // shadow peeks out below the card
        let shadowed = result.image.get_pixel(600, CARD_HEIGHT - 58);
        let plain = result.image.get_pixel(30, CARD_HEIGHT - 58);
        assert!(shadowed.0[1] < plain.0[1]);
        // primary value drawn in its delta color
        let score_color = UNDER_COLOR;
        assert!(result.image.pixels().any(|p| p == &score_color));
    }
}
