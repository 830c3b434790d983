//! Pixel compositing primitives on top of `image` buffers.

use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

/// Source-over compositing of `src`, scaled by `coverage`, onto `dst`.
pub fn blend_pixel(dst: &mut Rgba<u8>, src: Rgba<u8>, coverage: f32) {
    let sa = f32::from(src.0[3]) / 255.0 * coverage.clamp(0.0, 1.0);
    if sa <= 0.0 {
        return;
    }
    let da = f32::from(dst.0[3]) / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        *dst = Rgba([0, 0, 0, 0]);
        return;
    }
    for channel in 0..3 {
        let sc = f32::from(src.0[channel]);
        let dc = f32::from(dst.0[channel]);
        let value = (sc * sa + dc * da * (1.0 - sa)) / out_a;
        dst.0[channel] = value.round().clamp(0.0, 255.0) as u8;
    }
    dst.0[3] = (out_a * 255.0).round() as u8;
}

/// Blends `color` onto the pixel at `(x, y)` if it lies inside the canvas.
pub fn blend_at(canvas: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>, coverage: f32) {
    if x < 0 || y < 0 || x >= i64::from(canvas.width()) || y >= i64::from(canvas.height()) {
        return;
    }
    blend_pixel(canvas.get_pixel_mut(x as u32, y as u32), color, coverage);
}

/// Overwrites a rectangle with an opaque color.
pub fn fill_rect(
    canvas: &mut RgbaImage,
    x: i32,
    y: i32,
    width: u32,
    height: u32,
    color: Rgba<u8>,
) {
    if width == 0 || height == 0 {
        return;
    }
    draw_filled_rect_mut(canvas, Rect::at(x, y).of_size(width, height), color);
}

/// Alpha-blends a rectangle onto the canvas.
pub fn blend_rect(
    canvas: &mut RgbaImage,
    x: i64,
    y: i64,
    width: u32,
    height: u32,
    color: Rgba<u8>,
) {
    for py in y..y + i64::from(height) {
        for px in x..x + i64::from(width) {
            blend_at(canvas, px, py, color, 1.0);
        }
    }
}

/// Vertical band whose opacity grows with the square of the distance from its top.
///
/// Row `i` of `height` gets alpha `255 * (i / height)^2`.
pub fn fade_in_band(canvas: &mut RgbaImage, top: i64, height: u32, color: Rgba<u8>) {
    let width = canvas.width();
    for row in 0..height {
        let t = f64::from(row) / f64::from(height);
        let alpha = (255.0 * t * t) as u8;
        let Rgba([r, g, b, _]) = color;
        blend_rect(
            canvas,
            0,
            top + i64::from(row),
            width,
            1,
            Rgba([r, g, b, alpha]),
        );
    }
}

/// Horizontal mask ending at column `right`.
///
/// Opaque at `right`, transparent `length` pixels left of it.
///
/// Column `right - i` gets alpha `255 - 255 * (i / length)^2`.
pub fn fade_out_columns(
    canvas: &mut RgbaImage,
    right: i64,
    top: i64,
    length: u32,
    height: u32,
    color: Rgba<u8>,
) {
    for step in 0..length {
        let t = f64::from(step) / f64::from(length);
        let alpha = (255.0 - 255.0 * t * t) as u8;
        let Rgba([r, g, b, _]) = color;
        blend_rect(
            canvas,
            right - i64::from(step),
            top,
            1,
            height,
            Rgba([r, g, b, alpha]),
        );
    }
}

/// Fills the canvas with a top-to-bottom two-stop gradient.
pub fn vertical_gradient(canvas: &mut RgbaImage, from: Rgba<u8>, to: Rgba<u8>) {
    let height = canvas.height().max(1);
    for (_, y, pixel) in canvas.enumerate_pixels_mut() {
        let t = f64::from(y) / f64::from(height);
        for channel in 0..4 {
            let a = f64::from(from.0[channel]);
            let b = f64::from(to.0[channel]);
            pixel.0[channel] = (a + (b - a) * t).round() as u8;
        }
    }
}

/// Blends an anti-aliased rounded rectangle.
pub fn fill_rounded_rect(
    canvas: &mut RgbaImage,
    origin: (f64, f64),
    size: (f64, f64),
    radius: f64,
    color: Rgba<u8>,
) {
    let (x0, y0) = origin;
    let (w, h) = size;
    let radius = radius.min(w / 2.0).min(h / 2.0).max(0.0);

    let min_x = x0.floor().max(0.0) as u32;
    let min_y = y0.floor().max(0.0) as u32;
    let max_x = ((x0 + w).ceil() as u32).min(canvas.width());
    let max_y = ((y0 + h).ceil() as u32).min(canvas.height());

    for py in min_y..max_y {
        for px in min_x..max_x {
            let cx = f64::from(px) + 0.5;
            let cy = f64::from(py) + 0.5;
            let coverage = rounded_rect_coverage(cx - x0, cy - y0, w, h, radius);
            if coverage > 0.0 {
                blend_pixel(canvas.get_pixel_mut(px, py), color, coverage as f32);
            }
        }
    }
}

/// Approximate coverage of a pixel centered at `(x, y)` relative to the rectangle's origin.
fn rounded_rect_coverage(x: f64, y: f64, w: f64, h: f64, r: f64) -> f64 {
    let edge = x.min(y).min(w - x).min(h - y);
    if edge <= -0.5 {
        return 0.0;
    }

    let corner_x = if x < r {
        Some(r)
    } else if x > w - r {
        Some(w - r)
    } else {
        None
    };
    let corner_y = if y < r {
        Some(r)
    } else if y > h - r {
        Some(h - r)
    } else {
        None
    };

    match (corner_x, corner_y) {
        (Some(cx), Some(cy)) => {
            let distance = ((x - cx).powi(2) + (y - cy).powi(2)).sqrt();
            (r - distance + 0.5).clamp(0.0, 1.0)
        }
        _ => (edge + 0.5).clamp(0.0, 1.0),
    }
}

/// Draws `src` with its top-left corner at `(x, y)`, alpha-blended.
pub fn overlay(canvas: &mut RgbaImage, src: &RgbaImage, x: i64, y: i64) {
    image::imageops::overlay(canvas, src, x, y);
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    #[test]
    fn test_blend_onto_transparent_keeps_source_color() {
        let mut dst = Rgba([0, 0, 0, 0]);
        blend_pixel(&mut dst, Rgba([10, 20, 30, 128]), 1.0);
        assert_eq!(&dst.0[..3], &[10, 20, 30]);
        assert_eq!(dst.0[3], 128);
    }

    #[test]
    fn test_half_coverage_mixes() {
        let mut dst = Rgba([0, 0, 0, 255]);
        blend_pixel(&mut dst, Rgba([200, 200, 200, 255]), 0.5);
        assert_eq!(dst, Rgba([100, 100, 100, 255]));
    }

    #[test]
    fn test_fade_in_band_grows_with_square() {
        let mut canvas = RgbaImage::from_pixel(4, 10, Rgba([255, 255, 255, 255]));
        fade_in_band(&mut canvas, 0, 10, Rgba([0, 0, 0, 255]));
        assert_eq!(canvas.get_pixel(0, 0), &Rgba([255, 255, 255, 255]));
        let mid = canvas.get_pixel(0, 5).0[0];
        let late = canvas.get_pixel(0, 9).0[0];
        assert!(late < mid);
        assert!(mid < 255);
    }

    #[test]
    fn test_rounded_rect_skips_corners() {
        let mut canvas = RgbaImage::from_pixel(40, 40, Rgba([0, 0, 0, 0]));
        fill_rounded_rect(&mut canvas, (0.0, 0.0), (40.0, 40.0), 10.0, RED);
        assert_eq!(canvas.get_pixel(0, 0).0[3], 0);
        assert_eq!(canvas.get_pixel(20, 20), &RED);
        assert_eq!(canvas.get_pixel(20, 0), &RED);
    }

    #[test]
    fn test_vertical_gradient_endpoints() {
        let mut canvas = RgbaImage::new(2, 100);
        vertical_gradient(&mut canvas, Rgba([0, 0, 0, 255]), Rgba([200, 100, 0, 255]));
        assert_eq!(canvas.get_pixel(0, 0), &Rgba([0, 0, 0, 255]));
        assert!(canvas.get_pixel(0, 99).0[0] >= 196);
    }

    #[test]
    fn test_fill_rect_clips_to_canvas() {
        let mut canvas = RgbaImage::new(5, 5);
        fill_rect(&mut canvas, 3, 3, 10, 10, RED);
        assert_eq!(canvas.get_pixel(4, 4), &RED);
        assert_eq!(canvas.get_pixel(2, 2).0[3], 0);
    }
}
