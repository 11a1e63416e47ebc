use image::RgbaImage;
use tracing::{info, instrument};

use crate::config::FlipbookConfig;
use crate::error::Result;
use crate::generate::{GenerateOutput, generate_flipbook};
use crate::prepare::prepare_frames;
use crate::raster::OutputTarget;
use crate::template::template_frames;

#[instrument(skip_all)]
/// Runs prepare, template and generate back to back on in-memory frames.
///
/// Notes:
/// - The configuration is validated once up front; nothing is written if it is invalid.
/// - Intermediate frames are not written; only the print pages are.
pub fn build_flipbook(
    frames: &[RgbaImage],
    cfg: &FlipbookConfig,
    target: &OutputTarget,
    dry_run: bool,
) -> Result<GenerateOutput> {
    cfg.validate()?;
    let prepared = prepare_frames(frames, cfg)?;
    let templated = template_frames(&prepared, cfg)?;
    let out = generate_flipbook(&templated, cfg, target, dry_run)?;
    info!(
        frames = frames.len(),
        pages = out.files.len(),
        "flip-book generated"
    );
    Ok(out)
}
