//! Raster collaborator used by page generation.
//!
//! `generate_pages` only knows frame indices and page handles; everything that
//! touches pixels or files goes through a `RasterBackend`. `ImageBackend` is the
//! implementation on top of the `image` crate.

use std::path::PathBuf;

use image::{Rgba, RgbaImage};

use crate::compositing::{blit_rgba, extend_canvas};
use crate::config::FlipbookConfig;
use crate::error::{FlipbookError, Result};
use crate::export::{page_file_name, write_page};
use crate::model::PageSlot;

/// Pixel size of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellSize {
    pub width: u32,
    pub height: u32,
}

/// Where flushed pages go: `<output_dir>/<base_name>-fbook<N>.<ext>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    pub output_dir: PathBuf,
    pub base_name: String,
}

impl OutputTarget {
    pub fn new(output_dir: impl Into<PathBuf>, base_name: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            base_name: base_name.into(),
        }
    }
}

/// Operations page generation needs from a raster engine.
///
/// A page handle is created by `create_page_canvas`, filled through
/// `place_content`, and consumed by `flush_page`; no handle outlives its page.
pub trait RasterBackend {
    type Content;
    type Page;

    fn copy_frame_content(&mut self, frame_index: usize) -> Result<Self::Content>;
    fn create_page_canvas(&mut self, width: u32, height: u32) -> Result<Self::Page>;
    fn place_content(
        &mut self,
        page: &mut Self::Page,
        content: &Self::Content,
        slot: PageSlot,
        cell: CellSize,
    ) -> Result<()>;
    /// Path page `page_number` is (or would be) written to.
    fn page_path(&self, target: &OutputTarget, page_number: usize) -> PathBuf;
    /// Finalizes and writes `page`, returning the written path.
    fn flush_page(
        &mut self,
        page: Self::Page,
        target: &OutputTarget,
        page_number: usize,
    ) -> Result<PathBuf>;
}

/// `RasterBackend` over in-memory RGBA frames that writes pages to disk.
pub struct ImageBackend<'a> {
    frames: &'a [RgbaImage],
    background: Rgba<u8>,
    print_margin_factor: f64,
    cfg: &'a FlipbookConfig,
    dry_run: bool,
}

impl<'a> ImageBackend<'a> {
    pub fn new(frames: &'a [RgbaImage], cfg: &'a FlipbookConfig) -> Self {
        Self {
            frames,
            background: Rgba(cfg.page_background),
            print_margin_factor: cfg.print_margin_factor,
            cfg,
            dry_run: false,
        }
    }

    /// Render pages but skip writing files; `flush_page` still returns the
    /// path it would have written.
    pub fn dry_run(mut self, v: bool) -> Self {
        self.dry_run = v;
        self
    }

    /// Grows `page` by the print margin, keeping the content centered.
    pub fn add_print_margin(&self, page: &RgbaImage) -> Result<RgbaImage> {
        let (w, h) = page.dimensions();
        let (nw, nh) = print_margin_size(w, h, self.print_margin_factor)?;
        let left = ((self.print_margin_factor - 1.0) / 2.0 * w as f64) as u32;
        let top = ((self.print_margin_factor - 1.0) / 2.0 * h as f64) as u32;
        let right = nw.saturating_sub(w.saturating_add(left));
        let bottom = nh.saturating_sub(h.saturating_add(top));
        let left = left.min(nw - w);
        let top = top.min(nh - h);
        Ok(extend_canvas(page, left, top, right, bottom, self.background))
    }
}

/// Page size after adding the print margin: `floor(factor * w) x floor(factor * h)`.
///
/// Fails with `FlipbookError::Configuration` when the factor is below 1.0 or
/// the grown page no longer fits in `u32` pixels.
pub fn print_margin_size(w: u32, h: u32, factor: f64) -> Result<(u32, u32)> {
    let scale = |v: u32| {
        let grown = (factor * v as f64).floor();
        if grown.is_finite() && grown >= v as f64 && grown <= u32::MAX as f64 {
            Ok(grown as u32)
        } else {
            Err(FlipbookError::Configuration(format!(
                "print_margin_factor {} cannot grow a {}x{} page",
                factor, w, h
            )))
        }
    };
    Ok((scale(w)?, scale(h)?))
}

impl<'a> RasterBackend for ImageBackend<'a> {
    type Content = &'a RgbaImage;
    type Page = RgbaImage;

    fn copy_frame_content(&mut self, frame_index: usize) -> Result<Self::Content> {
        let frames: &'a [RgbaImage] = self.frames;
        frames.get(frame_index).ok_or_else(|| {
            FlipbookError::Configuration(format!(
                "frame {} requested but only {} frames are loaded",
                frame_index,
                frames.len()
            ))
        })
    }

    fn create_page_canvas(&mut self, width: u32, height: u32) -> Result<Self::Page> {
        Ok(RgbaImage::from_pixel(width, height, self.background))
    }

    fn place_content(
        &mut self,
        page: &mut Self::Page,
        content: &Self::Content,
        slot: PageSlot,
        cell: CellSize,
    ) -> Result<()> {
        let (x, y) = slot.origin(cell.width, cell.height);
        blit_rgba(content, page, x, y);
        Ok(())
    }

    fn page_path(&self, target: &OutputTarget, page_number: usize) -> PathBuf {
        target.output_dir.join(page_file_name(
            &target.base_name,
            page_number,
            self.cfg.output_format,
        ))
    }

    fn flush_page(
        &mut self,
        page: Self::Page,
        target: &OutputTarget,
        page_number: usize,
    ) -> Result<PathBuf> {
        let path = self.page_path(target, page_number);
        let finished = self.add_print_margin(&page)?;
        if !self.dry_run {
            write_page(&finished, &path, self.cfg).map_err(|e| FlipbookError::Export {
                page: page_number,
                path: path.clone(),
                source: Box::new(e),
            })?;
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn print_margin_matches_factor() {
        let cfg = FlipbookConfig::default();
        let frames: Vec<RgbaImage> = Vec::new();
        let backend = ImageBackend::new(&frames, &cfg);
        let page = RgbaImage::from_pixel(1800, 1200, Rgba([1, 2, 3, 255]));
        let out = backend.add_print_margin(&page).unwrap();
        assert_eq!(out.dimensions(), print_margin_size(1800, 1200, 1.02).unwrap());
        assert_eq!(out.dimensions(), (1836, 1224));
        // offsets: floor(0.01 * 1800) = 18, floor(0.01 * 1200) = 12
        assert_eq!(*out.get_pixel(17, 12), Rgba(cfg.page_background));
        assert_eq!(*out.get_pixel(18, 12), Rgba([1, 2, 3, 255]));
        assert_eq!(*out.get_pixel(18, 11), Rgba(cfg.page_background));
    }

    #[test]
    fn print_margin_that_overflows_is_rejected() {
        assert!(matches!(
            print_margin_size(u32::MAX / 2, 10, 3.0),
            Err(FlipbookError::Configuration(_))
        ));
        assert!(print_margin_size(100, 100, 1.0e12).is_err());
        assert!(print_margin_size(100, 100, f64::NAN).is_err());
        assert!(print_margin_size(100, 100, 0.5).is_err());
        assert_eq!(print_margin_size(100, 50, 1.0).unwrap(), (100, 50));
    }

    #[test]
    fn copy_out_of_range_frame_fails() {
        let cfg = FlipbookConfig::default();
        let frames = vec![RgbaImage::new(2, 2)];
        let mut backend = ImageBackend::new(&frames, &cfg);
        assert!(backend.copy_frame_content(0).is_ok());
        assert!(backend.copy_frame_content(1).is_err());
    }
}
