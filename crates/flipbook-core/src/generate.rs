use std::path::PathBuf;

use image::RgbaImage;
use tracing::{debug, info, instrument};

use crate::config::FlipbookConfig;
use crate::error::{FlipbookError, Result};
use crate::model::PaginationPlan;
use crate::packer::{GridGeometry, PackEvent, PagePacker, plan_pages};
use crate::raster::{CellSize, ImageBackend, OutputTarget, RasterBackend};
use crate::source::uniform_size;

/// Result of a generation run: the plan that was followed and the files it produced.
#[derive(Debug, Clone)]
pub struct GenerateOutput {
    pub plan: PaginationPlan,
    /// One path per page, in page order.
    pub files: Vec<PathBuf>,
}

/// Packs `frame_count` frames into pages of `grid` and drives `backend` through
/// them: a fresh canvas per page, one placement per frame, one flush per page.
///
/// Returns the flushed paths in page order. A failing flush stops the run with
/// `FlipbookError::Export` carrying the page number; pages already flushed are
/// left as they are.
pub fn generate_pages<B: RasterBackend>(
    backend: &mut B,
    frame_count: usize,
    grid: GridGeometry,
    cell: CellSize,
    target: &OutputTarget,
) -> Result<Vec<PathBuf>> {
    let (page_w, page_h) = page_canvas_size(grid, cell)?;
    let mut files = Vec::with_capacity(grid.page_count(frame_count));
    let mut current: Option<B::Page> = None;

    for event in PagePacker::new(grid, frame_count) {
        match event {
            PackEvent::StartPage { page_index } => {
                debug!(page = page_index, page_w, page_h, "start page");
                current = Some(backend.create_page_canvas(page_w, page_h)?);
            }
            PackEvent::Place(a) => {
                let Some(page) = current.as_mut() else {
                    continue;
                };
                let content = backend.copy_frame_content(a.frame_index)?;
                backend.place_content(page, &content, a.slot, cell)?;
            }
            PackEvent::Flush { page_index } => {
                let Some(page) = current.take() else {
                    continue;
                };
                let path = backend
                    .flush_page(page, target, page_index)
                    .map_err(|e| match e {
                        FlipbookError::Export { .. } => e,
                        other => FlipbookError::Export {
                            page: page_index,
                            path: backend.page_path(target, page_index),
                            source: Box::new(other),
                        },
                    })?;
                info!(page = page_index, path = %path.display(), "wrote page");
                files.push(path);
            }
        }
    }
    Ok(files)
}

/// Pixel size of one print page before the print margin: `cols x rows` cells.
pub fn page_canvas_size(grid: GridGeometry, cell: CellSize) -> Result<(u32, u32)> {
    match (
        cell.width.checked_mul(grid.cols()),
        cell.height.checked_mul(grid.rows()),
    ) {
        (Some(w), Some(h)) => Ok((w, h)),
        _ => Err(FlipbookError::Configuration(format!(
            "a {}x{} grid of {}x{} cells does not fit in one page",
            grid.rows(),
            grid.cols(),
            cell.width,
            cell.height
        ))),
    }
}

/// Step 3: tile templated frames onto print pages and export them.
///
/// The cell size is the (shared) size of the frames. Zero frames produce no
/// pages and no files.
#[instrument(skip_all, fields(frames = frames.len()))]
pub fn generate_flipbook(
    frames: &[RgbaImage],
    cfg: &FlipbookConfig,
    target: &OutputTarget,
    dry_run: bool,
) -> Result<GenerateOutput> {
    cfg.validate()?;
    let grid = GridGeometry::new(cfg.grid_rows, cfg.grid_cols)?;
    let plan = plan_pages(frames.len(), cfg.grid_rows, cfg.grid_cols)?;
    if frames.is_empty() {
        return Ok(GenerateOutput {
            plan,
            files: Vec::new(),
        });
    }
    let (width, height) = uniform_size(frames)?;
    let cell = CellSize { width, height };
    let mut backend = ImageBackend::new(frames, cfg).dry_run(dry_run);
    let files = generate_pages(&mut backend, frames.len(), grid, cell, target)?;
    Ok(GenerateOutput { plan, files })
}
