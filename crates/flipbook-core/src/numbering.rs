//! Frame number stamping.
//!
//! Numbers are drawn with a user-supplied TTF/OTF font through `ab_glyph`, or
//! with a small built-in 5x7 digit bitmap scaled to the requested height when
//! no font is configured.

use std::path::Path;

use ab_glyph::{point, Font, FontVec, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};

use crate::compositing::{blend_pixel, fill_rect};
use crate::error::{FlipbookError, Result};
use crate::model::Rect;

/// 5x7 bitmaps for '0'..='9'; each row uses the low 5 bits, MSB on the left.
const DIGITS: [[u8; 7]; 10] = [
    [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
    [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
    [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
    [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
    [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
    [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
    [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
    [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
    [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
    [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
];
const GLYPH_COLS: u32 = 5;
const GLYPH_ROWS: u32 = 7;

/// Draws text labels onto frames.
pub enum NumberStamp {
    Builtin,
    Font(FontVec),
}

impl NumberStamp {
    /// Loads `path` as a font, or falls back to the built-in digits when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            None => Ok(NumberStamp::Builtin),
            Some(p) => {
                let bytes = std::fs::read(p)?;
                let font = FontVec::try_from_vec(bytes)
                    .map_err(|e| FlipbookError::Font(format!("{}: {e}", p.display())))?;
                Ok(NumberStamp::Font(font))
            }
        }
    }

    /// Draws `text` with its top-left corner at (x, y), `size` pixels tall.
    pub fn draw(
        &self,
        canvas: &mut RgbaImage,
        text: &str,
        x: u32,
        y: u32,
        size: f32,
        color: Rgba<u8>,
    ) {
        match self {
            NumberStamp::Builtin => draw_builtin(canvas, text, x, y, size, color),
            NumberStamp::Font(font) => draw_font(font, canvas, text, x, y, size, color),
        }
    }
}

fn draw_builtin(canvas: &mut RgbaImage, text: &str, x: u32, y: u32, size: f32, color: Rgba<u8>) {
    // `as u32` saturates, so oversized text degrades to clipped blocks
    let cell = ((size / GLYPH_ROWS as f32).round() as u32).max(1);
    let advance = (GLYPH_COLS + 1).saturating_mul(cell);
    let mut caret = x;
    for ch in text.chars() {
        if caret >= canvas.width() {
            break;
        }
        if let Some(d) = ch.to_digit(10) {
            let bitmap = &DIGITS[d as usize];
            for (row, bits) in bitmap.iter().enumerate() {
                for col in 0..GLYPH_COLS {
                    if bits & (1 << (GLYPH_COLS - 1 - col)) != 0 {
                        let rect = Rect::new(
                            caret.saturating_add(col.saturating_mul(cell)),
                            y.saturating_add((row as u32).saturating_mul(cell)),
                            cell,
                            cell,
                        );
                        fill_rect(canvas, rect, color);
                    }
                }
            }
        }
        caret = caret.saturating_add(advance);
    }
}

fn draw_font(
    font: &FontVec,
    canvas: &mut RgbaImage,
    text: &str,
    x: u32,
    y: u32,
    size: f32,
    color: Rgba<u8>,
) {
    let scale = PxScale::from(size);
    let scaled = font.as_scaled(scale);
    let ascent = scaled.ascent();
    let mut caret = x as f32;
    let mut last = None;
    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = last {
            caret += scaled.kern(prev, id);
        }
        let glyph = id.with_scale_and_position(scale, point(caret, y as f32 + ascent));
        caret += scaled.h_advance(id);
        last = Some(id);
        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let px = bounds.min.x as i64 + gx as i64;
                let py = bounds.min.y as i64 + gy as i64;
                blend_pixel(canvas, px, py, color, coverage);
            });
        }
    }
}
