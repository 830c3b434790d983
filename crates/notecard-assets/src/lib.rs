//! Binary assets compiled into notecard.
//!
//! Everything here is read-only and lives for the whole process.

/// The single embedded font family used for every glyph (DejaVu Sans).
pub const FONT_TTF: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

/// Brand logo stamped into the bottom bar of note cards.
pub const LOGO_PNG: &[u8] = include_bytes!("../assets/logo.png");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logo_has_png_signature() {
        assert_eq!(
            &LOGO_PNG[..8],
            &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A],
        );
    }

    #[test]
    fn test_font_is_truetype() {
        assert_eq!(&FONT_TTF[..4], &[0x00, 0x01, 0x00, 0x00]);
    }
}
