//! Decode/resize/encode helpers shared by the media stage and compositing.

use image::{DynamicImage, RgbaImage};

/// Decodes an image payload, sniffing the format from its bytes.
///
/// # Errors
/// Returns an error string if format detection or decoding fails.
pub fn decode_image(data: &[u8]) -> Result<RgbaImage, String> {
    let reader = image::ImageReader::new(std::io::Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| format!("decode: {e}"))?;
    let dyn_img = reader.decode().map_err(|e| format!("decode: {e}"))?;
    Ok(dyn_img.to_rgba8())
}

/// Resizes with a Lanczos3 convolution.
///
/// # Errors
/// Returns an error string if the resizer rejects the buffers.
pub fn resize_image(src: &RgbaImage, dst_w: u32, dst_h: u32) -> Result<RgbaImage, String> {
    use fast_image_resize as fir;

    let (dst_w, dst_h) = (dst_w.max(1), dst_h.max(1));
    if src.width() == dst_w && src.height() == dst_h {
        return Ok(src.clone());
    }

    let src_image = fir::images::Image::from_vec_u8(
        src.width(),
        src.height(),
        src.as_raw().clone(),
        fir::PixelType::U8x4,
    )
    .map_err(|e| format!("resize: {e}"))?;

    let mut dst_image = fir::images::Image::new(dst_w, dst_h, fir::PixelType::U8x4);
    let mut resizer = fir::Resizer::new();
    let options = fir::ResizeOptions::new()
        .resize_alg(fir::ResizeAlg::Convolution(fir::FilterType::Lanczos3));
    resizer
        .resize(&src_image, &mut dst_image, Some(&options))
        .map_err(|e| format!("resize: {e}"))?;

    RgbaImage::from_raw(dst_w, dst_h, dst_image.into_vec())
        .ok_or_else(|| "resize: invalid output buffer".to_string())
}

/// Scales `src` down so it is at most `max_width` wide, keeping its aspect ratio.
///
/// Images already narrow enough are returned at their natural size.
///
/// # Errors
/// Returns an error string if resizing fails.
pub fn fit_to_width(src: &RgbaImage, max_width: u32) -> Result<RgbaImage, String> {
    if src.width() <= max_width {
        return Ok(src.clone());
    }
    let height = (u64::from(src.height()) * u64::from(max_width) / u64::from(src.width())) as u32;
    resize_image(src, max_width, height)
}

/// Center-crops to the largest square.
pub fn crop_to_square(src: &RgbaImage) -> RgbaImage {
    let side = src.width().min(src.height());
    let left = (src.width() - side) / 2;
    let top = (src.height() - side) / 2;
    image::imageops::crop_imm(src, left, top, side, side).to_image()
}

/// Makes everything outside the inscribed circle transparent, with a soft edge.
pub fn round_image(src: &RgbaImage) -> RgbaImage {
    let mut out = src.clone();
    let radius = f64::from(src.width().min(src.height())) / 2.0;
    let (cx, cy) = (f64::from(src.width()) / 2.0, f64::from(src.height()) / 2.0);

    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let dx = f64::from(x) + 0.5 - cx;
        let dy = f64::from(y) + 0.5 - cy;
        let distance = (dx * dx + dy * dy).sqrt();
        let coverage = (radius - distance + 0.5).clamp(0.0, 1.0);
        pixel.0[3] = (f64::from(pixel.0[3]) * coverage).round() as u8;
    }
    out
}

/// Encodes a finished bitmap as PNG.
///
/// # Errors
/// Returns an error string if PNG encoding fails.
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>, String> {
    use image::ImageEncoder as _;
    use image::codecs::png::{CompressionType, FilterType, PngEncoder};

    let opaque = img.pixels().all(|p| p.0[3] == u8::MAX);
    let mut buf = Vec::new();

    let encoder =
        PngEncoder::new_with_quality(&mut buf, CompressionType::Fast, FilterType::Adaptive);

    if opaque {
        let rgb = DynamicImage::ImageRgba8(img.clone()).to_rgb8();
        let (w, h) = rgb.dimensions();
        encoder
            .write_image(rgb.as_raw(), w, h, image::ExtendedColorType::Rgb8)
            .map_err(|e| format!("encode: {e}"))?;
    } else {
        let (w, h) = img.dimensions();
        encoder
            .write_image(img.as_raw(), w, h, image::ExtendedColorType::Rgba8)
            .map_err(|e| format!("encode: {e}"))?;
    }

    Ok(buf)
}
