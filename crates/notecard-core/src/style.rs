//! Presentation variants and the canvas geometry each one implies.

use serde::{Deserialize, Serialize};

/// Preview consumer the card is being rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewStyle {
    #[default]
    Default,
    Telegram,
    Twitter,
    Facebook,
}

impl PreviewStyle {
    /// Parses a style token. Unknown or empty tokens resolve to `Default`.
    pub fn from_token(token: Option<&str>) -> Self {
        let Some(token) = token.map(str::trim) else {
            return Self::Default;
        };
        match token.to_ascii_lowercase().as_str() {
            "telegram" => Self::Telegram,
            "twitter" | "x" => Self::Twitter,
            "facebook" | "fb" => Self::Facebook,
            _ => Self::Default,
        }
    }

    /// Guesses the consumer from a crawler's `User-Agent`.
    pub fn from_user_agent(user_agent: &str) -> Option<Self> {
        if user_agent.contains("TelegramBot") {
            Some(Self::Telegram)
        } else if user_agent.contains("Twitterbot") {
            Some(Self::Twitter)
        } else if user_agent.contains("facebookexternalhit") || user_agent.contains("Facebot") {
            Some(Self::Facebook)
        } else {
            None
        }
    }

    /// Returns the short display name for this style.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Telegram => "telegram",
            Self::Twitter => "twitter",
            Self::Facebook => "facebook",
        }
    }

    pub fn profile(self) -> StyleProfile {
        StyleProfile::for_style(self)
    }
}

/// Canvas geometry for one render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyleProfile {
    pub style: PreviewStyle,
    pub width: u32,
    pub height: u32,
    pub padding_left: u32,
    pub bar_height: u32,
    pub bar_scale: f64,
    pub font_size: u32,
}

impl StyleProfile {
    const BASE_WIDTH: u32 = 700;
    const BASE_HEIGHT: u32 = 525;
    const BASE_PADDING: u32 = 25;
    const BASE_BAR_HEIGHT: u32 = 70;
    const BASE_FONT_SIZE: u32 = 25;

    /// Distance between the top of the canvas and the text region.
    pub const TOP_MARGIN: u32 = 20;

    pub fn for_style(style: PreviewStyle) -> Self {
        let mut profile = Self {
            style,
            width: Self::BASE_WIDTH,
            height: Self::BASE_HEIGHT,
            padding_left: Self::BASE_PADDING,
            bar_height: Self::BASE_BAR_HEIGHT,
            bar_scale: 1.0,
            font_size: Self::BASE_FONT_SIZE,
        };

        match style {
            PreviewStyle::Default => {}
            PreviewStyle::Telegram => {
                profile.padding_left += 10;
                profile.width -= 10;
            }
            PreviewStyle::Twitter => {
                profile.height = profile.width * 268 / 512;
            }
            PreviewStyle::Facebook => {
                profile.height = profile.width * 355 / 680;
                profile.padding_left = 180;
                profile.bar_scale = 0.55;
                profile.bar_height = (f64::from(profile.bar_height) * profile.bar_scale) as u32;
                profile.font_size = 18;
            }
        }

        profile
    }

    /// Width available to the paragraph flow.
    pub fn text_width(&self) -> u32 {
        self.width.saturating_sub(self.padding_left * 2)
    }

    /// Height available to the paragraph flow, between the top margin and the bar.
    pub fn text_region_height(&self) -> u32 {
        self.height
            .saturating_sub(Self::TOP_MARGIN)
            .saturating_sub(self.bar_height)
    }

    /// Y coordinate of the top edge of the bottom bar.
    pub fn bar_top(&self) -> u32 {
        self.height - self.bar_height
    }
}

impl Default for StyleProfile {
    fn default() -> Self {
        Self::for_style(PreviewStyle::Default)
    }
}
