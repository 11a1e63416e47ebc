//! Core library for turning animations into printable flip-books.
//!
//! - Steps: `prepare_frames` (scale + crop to the base frame), `template_frames` (glue/cut margins + numbers),
//!   `generate_flipbook` (tile frames onto print pages and export)
//! - Packing: `PagePacker` maps frame indices to pages and row-major grid slots and signals page flushes
//! - Rendering goes through the `RasterBackend` trait; `ImageBackend` implements it on the `image` crate.
//!
//! Quick example:
//! ```ignore
//! use flipbook_core::prelude::*;
//! # fn main() -> anyhow::Result<()> {
//! let frames = load_frames(std::path::Path::new("cat.gif"))?;
//! let cfg = FlipbookConfig::default();
//! let out = build_flipbook(&frames, &cfg, &OutputTarget::new("out", "cat"), false)?;
//! println!("pages: {}", out.files.len());
//! # Ok(()) }
//! ```

pub mod compositing;
pub mod config;
pub mod error;
pub mod export;
pub mod generate;
pub mod model;
pub mod numbering;
pub mod packer;
pub mod pipeline;
pub mod prepare;
pub mod raster;
pub mod source;
pub mod template;

pub use config::*;
pub use error::*;
pub use export::*;
pub use generate::*;
pub use model::*;
pub use packer::*;
pub use pipeline::*;
pub use prepare::*;
pub use raster::*;
pub use source::*;
pub use template::*;

/// Convenience prelude for common types and functions.
/// Importing `flipbook_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::config::{FlipbookConfig, FlipbookConfigBuilder, OutputFormat};
    pub use crate::error::{FlipbookError, Result};
    pub use crate::model::{Assignment, Page, PageSlot, PaginationPlan, PlanStats};
    pub use crate::packer::{GridGeometry, PackEvent, PagePacker, plan_pages};
    pub use crate::raster::{CellSize, ImageBackend, OutputTarget, RasterBackend};
    pub use crate::{
        GenerateOutput, build_flipbook, generate_flipbook, generate_pages, load_frame_sequence,
        load_frames, prepare_frames, template_frames,
    };
}
