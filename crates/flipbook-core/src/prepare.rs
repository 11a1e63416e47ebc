use image::imageops::{self, FilterType};
use image::RgbaImage;
use tracing::{debug, instrument, warn};

use crate::config::FlipbookConfig;
use crate::error::{FlipbookError, Result};

/// Size a `w` x `h` frame is scaled to so it covers `base_w` x `base_h`.
///
/// The larger of the two axis factors wins; the other side is truncated and
/// kept at least one pixel.
pub fn cover_size(w: u32, h: u32, base_w: u32, base_h: u32) -> (u32, u32) {
    let (w64, h64) = (w.max(1) as u64, h.max(1) as u64);
    // base_w / w >= base_h / h, compared without floats
    if base_w as u64 * h64 >= base_h as u64 * w64 {
        let sh = (h64 * base_w as u64 / w64).max(1);
        (base_w, sh as u32)
    } else {
        let sw = (w64 * base_h as u64 / h64).max(1);
        (sw as u32, base_h)
    }
}

/// Scales one frame to cover the base area, then crops it from the top-left
/// corner to exactly `base_w` x `base_h`.
pub fn prepare_frame(frame: &RgbaImage, base_w: u32, base_h: u32) -> RgbaImage {
    let (w, h) = frame.dimensions();
    let (sw, sh) = cover_size(w, h, base_w, base_h);
    let scaled = if (sw, sh) == (w, h) {
        frame.clone()
    } else {
        imageops::resize(frame, sw, sh, FilterType::Lanczos3)
    };
    if (sw, sh) == (base_w, base_h) {
        return scaled;
    }
    let mut out = RgbaImage::new(base_w, base_h);
    crate::compositing::blit_rgba(&scaled, &mut out, 0, 0);
    out
}

/// Step 1: normalize every frame to the base frame size of `cfg`.
#[instrument(skip_all, fields(frames = frames.len()))]
pub fn prepare_frames(frames: &[RgbaImage], cfg: &FlipbookConfig) -> Result<Vec<RgbaImage>> {
    cfg.validate()?;
    if frames.is_empty() {
        return Err(FlipbookError::Empty);
    }
    let (base_w, base_h) = (cfg.base_width(), cfg.base_height());
    let (w, h) = frames[0].dimensions();
    // compare w/h against base_w/base_h without floats
    if (w as u64) * (base_h as u64) != (h as u64) * (base_w as u64) {
        let (sw, sh) = cover_size(w, h, base_w, base_h);
        warn!(
            src_w = w,
            src_h = h,
            base_w,
            base_h,
            cropped_x = sw.saturating_sub(base_w),
            cropped_y = sh.saturating_sub(base_h),
            "aspect ratio differs from the flip-book frame; content will be cropped"
        );
    }
    debug!(base_w, base_h, "preparing frames");
    Ok(frames
        .iter()
        .map(|f| prepare_frame(f, base_w, base_h))
        .collect())
}
