use image::{Rgba, RgbaImage};
use tracing::{debug, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::compositing::{extend_canvas, flatten_onto};
use crate::config::FlipbookConfig;
use crate::error::{FlipbookError, Result};
use crate::numbering::NumberStamp;
use crate::source::uniform_size;

/// Turns one prepared frame into a printable frame: glue margin on the left,
/// transparent pixels flattened onto the glue colour, cut margin all around,
/// and the 1-based frame number in the top-left corner.
pub fn template_frame(
    frame: &RgbaImage,
    frame_index: usize,
    cfg: &FlipbookConfig,
    stamp: &NumberStamp,
) -> RgbaImage {
    let glue = Rgba(cfg.glue_color);
    let mut glued = extend_canvas(frame, cfg.glue_margin, 0, 0, 0, glue);
    flatten_onto(&mut glued, glue);

    let cut = cfg.cut_margin;
    let mut out = extend_canvas(&glued, cut, cut, cut, cut, Rgba(cfg.cut_color));

    let (nx, ny) = cfg.number_offset;
    stamp.draw(
        &mut out,
        &(frame_index + 1).to_string(),
        nx,
        ny,
        cfg.number_size,
        Rgba(cfg.number_color),
    );
    out
}

/// Step 2: template every prepared frame.
///
/// All frames must already have the base size of `cfg` (see `prepare_frames`).
#[instrument(skip_all, fields(frames = frames.len()))]
pub fn template_frames(frames: &[RgbaImage], cfg: &FlipbookConfig) -> Result<Vec<RgbaImage>> {
    cfg.validate()?;
    let size = uniform_size(frames)?;
    let base = (cfg.base_width(), cfg.base_height());
    if size != base {
        return Err(FlipbookError::Configuration(format!(
            "frames are {}x{} but the template expects prepared {}x{} frames",
            size.0, size.1, base.0, base.1
        )));
    }
    let stamp = NumberStamp::load(cfg.number_font.as_deref())?;
    debug!(
        glue = cfg.glue_margin,
        cut = cfg.cut_margin,
        font = cfg.number_font.is_some(),
        "templating frames"
    );

    #[cfg(feature = "parallel")]
    let out: Vec<RgbaImage> = frames
        .par_iter()
        .enumerate()
        .map(|(i, f)| template_frame(f, i, cfg, &stamp))
        .collect();
    #[cfg(not(feature = "parallel"))]
    let out: Vec<RgbaImage> = frames
        .iter()
        .enumerate()
        .map(|(i, f)| template_frame(f, i, cfg, &stamp))
        .collect();

    Ok(out)
}
