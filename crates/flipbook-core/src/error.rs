use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlipbookError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Invalid page dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("No frames to process")]
    Empty,
    #[error("Font error: {0}")]
    Font(String),
    #[error("Failed to write page {page} to {}: {source}", .path.display())]
    Export {
        page: usize,
        path: PathBuf,
        #[source]
        source: Box<FlipbookError>,
    },
}

impl FlipbookError {
    /// Page number attached to an export failure, if any.
    pub fn page(&self) -> Option<usize> {
        match self {
            FlipbookError::Export { page, .. } => Some(*page),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, FlipbookError>;
