//! Process-wide immutable assets, parsed once and shared by every render.

use ab_glyph::FontArc;
use image::RgbaImage;

use crate::error::RenderError;

/// Parsed font and logo.
///
/// Build one at startup and hand out `Arc<Assets>`; nothing here is ever mutated.
pub struct Assets {
    font: FontArc,
    logo: RgbaImage,
}

impl Assets {
    /// Parses the assets embedded in `notecard-assets`.
    ///
    /// # Errors
    /// Returns an error if the embedded font or logo cannot be parsed.
    pub fn embedded() -> Result<Self, RenderError> {
        Self::from_bytes(notecard_assets::FONT_TTF, notecard_assets::LOGO_PNG)
    }

    /// Parses assets from raw bytes.
    ///
    /// # Errors
    /// Returns an error if the font or logo cannot be parsed.
    pub fn from_bytes(font: &'static [u8], logo: &[u8]) -> Result<Self, RenderError> {
        let font =
            FontArc::try_from_slice(font).map_err(|e| RenderError::Asset(format!("font: {e}")))?;
        let logo = image::load_from_memory(logo)
            .map_err(|e| RenderError::Asset(format!("logo: {e}")))?
            .to_rgba8();
        Ok(Self { font, logo })
    }

    pub fn font(&self) -> &FontArc {
        &self.font
    }

    pub fn logo(&self) -> &RgbaImage {
        &self.logo
    }
}

impl std::fmt::Debug for Assets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assets")
            .field("logo", &self.logo.dimensions())
            .finish_non_exhaustive()
    }
}
