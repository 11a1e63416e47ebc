use image::{Rgba, RgbaImage};

use crate::model::Rect;

/// Copy all of `src` into `canvas` with its top-left corner at (dx, dy).
/// Pixels falling outside `canvas` are clipped. No blending: destination
/// pixels are replaced.
pub fn blit_rgba(src: &RgbaImage, canvas: &mut RgbaImage, dx: u32, dy: u32) {
    let (cw, ch) = canvas.dimensions();
    let (sw, sh) = src.dimensions();
    for yy in 0..sh {
        let ty = dy + yy;
        if ty >= ch {
            break;
        }
        for xx in 0..sw {
            let tx = dx + xx;
            if tx >= cw {
                break;
            }
            canvas.put_pixel(tx, ty, *src.get_pixel(xx, yy));
        }
    }
}

/// Fill `rect` of `canvas` with `color`, clipped to the canvas.
pub fn fill_rect(canvas: &mut RgbaImage, rect: Rect, color: Rgba<u8>) {
    let (cw, ch) = canvas.dimensions();
    let x2 = rect.x.saturating_add(rect.w).min(cw);
    let y2 = rect.y.saturating_add(rect.h).min(ch);
    for y in rect.y.min(ch)..y2 {
        for x in rect.x.min(cw)..x2 {
            canvas.put_pixel(x, y, color);
        }
    }
}

/// Grow `src` by the given margins. New area is filled with `fill`; the
/// original pixels keep their values and move by (`left`, `top`).
pub fn extend_canvas(
    src: &RgbaImage,
    left: u32,
    top: u32,
    right: u32,
    bottom: u32,
    fill: Rgba<u8>,
) -> RgbaImage {
    let (w, h) = src.dimensions();
    let mut canvas = RgbaImage::from_pixel(w + left + right, h + top + bottom, fill);
    blit_rgba(src, &mut canvas, left, top);
    canvas
}

/// Composite `img` over a solid `background` in place ("source over").
pub fn flatten_onto(img: &mut RgbaImage, background: Rgba<u8>) {
    let bg_a = background[3] as f32 / 255.0;
    for px in img.pixels_mut() {
        let a = px[3] as f32 / 255.0;
        if a >= 1.0 {
            continue;
        }
        let out_a = a + bg_a * (1.0 - a);
        if out_a <= 0.0 {
            *px = Rgba([0, 0, 0, 0]);
            continue;
        }
        for c in 0..3 {
            let v = (px[c] as f32 * a + background[c] as f32 * bg_a * (1.0 - a)) / out_a;
            px[c] = v.round().clamp(0.0, 255.0) as u8;
        }
        px[3] = (out_a * 255.0).round() as u8;
    }
}

/// Blend a single `color` into the pixel at (x, y) with `coverage` in 0.0..=1.0.
/// Out-of-bounds coordinates are ignored.
pub fn blend_pixel(canvas: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>, coverage: f32) {
    if x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as u32, y as u32);
    if x >= canvas.width() || y >= canvas.height() {
        return;
    }
    let a = coverage.clamp(0.0, 1.0) * (color[3] as f32 / 255.0);
    if a <= 0.0 {
        return;
    }
    let dst = canvas.get_pixel_mut(x, y);
    let dst_a = dst[3] as f32 / 255.0;
    let out_a = a + dst_a * (1.0 - a);
    for c in 0..3 {
        let v = (color[c] as f32 * a + dst[c] as f32 * dst_a * (1.0 - a)) / out_a;
        dst[c] = v.round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_a * 255.0).round() as u8;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extend_moves_content_and_fills_margin() {
        let src = RgbaImage::from_pixel(2, 1, Rgba([10, 20, 30, 255]));
        let out = extend_canvas(&src, 3, 1, 0, 2, Rgba([1, 1, 1, 255]));
        assert_eq!(out.dimensions(), (5, 4));
        assert_eq!(*out.get_pixel(0, 0), Rgba([1, 1, 1, 255]));
        assert_eq!(*out.get_pixel(3, 1), Rgba([10, 20, 30, 255]));
        assert_eq!(*out.get_pixel(4, 1), Rgba([10, 20, 30, 255]));
        assert_eq!(*out.get_pixel(4, 3), Rgba([1, 1, 1, 255]));
    }

    #[test]
    fn flatten_transparent_becomes_background() {
        let mut img = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 0]));
        flatten_onto(&mut img, Rgba([255, 255, 255, 255]));
        assert_eq!(*img.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn blit_clips_to_canvas() {
        let src = RgbaImage::from_pixel(4, 4, Rgba([9, 9, 9, 255]));
        let mut canvas = RgbaImage::new(3, 3);
        blit_rgba(&src, &mut canvas, 2, 2);
        assert_eq!(*canvas.get_pixel(2, 2), Rgba([9, 9, 9, 255]));
        assert_eq!(*canvas.get_pixel(1, 1), Rgba([0, 0, 0, 0]));
    }
}
