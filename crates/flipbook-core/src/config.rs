use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Flip-book geometry and drawing configuration.
/// Key notes:
///   - `page_width`/`page_height` are the size of one templated frame (glue + cut margins included)
///   - the printable base area is what remains after `glue_margin` (left) and `cut_margin` (all sides)
///   - `grid_rows` x `grid_cols` frames are tiled onto each exported print page
///     Encoding of exported pages.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Lossy JPEG (flattened, no alpha). Matches the classic `-fbookN.jpg` output.
    Jpeg,
    /// Lossless PNG.
    Png,
}

impl OutputFormat {
    /// File extension without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlipbookConfig {
    /// Width of one templated frame in pixels (glue + cut margins included).
    pub page_width: u32,
    /// Height of one templated frame in pixels (cut margins included).
    pub page_height: u32,
    /// Binding margin added on the left of every frame.
    pub glue_margin: u32,
    /// Trimming margin added on every side of every frame.
    pub cut_margin: u32,
    /// Frames per print page, vertically.
    pub grid_rows: u32,
    /// Frames per print page, horizontally.
    pub grid_cols: u32,
    /// Print page is grown by this factor (centered) before export.
    pub print_margin_factor: f64,

    #[serde(default = "default_glue_color")]
    pub glue_color: [u8; 4],
    #[serde(default = "default_cut_color")]
    pub cut_color: [u8; 4],
    #[serde(default = "default_number_color")]
    pub number_color: [u8; 4],
    /// Pixel height of the frame numbers.
    #[serde(default = "default_number_size")]
    pub number_size: f32,
    /// Top-left position of the frame numbers within a templated frame.
    #[serde(default = "default_number_offset")]
    pub number_offset: (u32, u32),
    /// TTF/OTF font for the frame numbers. None => built-in digits.
    #[serde(default)]
    pub number_font: Option<PathBuf>,
    /// Fill for empty grid cells and the print margin.
    #[serde(default = "default_page_background")]
    pub page_background: [u8; 4],

    #[serde(default = "default_output_format")]
    pub output_format: OutputFormat,
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

impl Default for FlipbookConfig {
    fn default() -> Self {
        Self {
            page_width: 900,
            page_height: 400,
            glue_margin: 300,
            cut_margin: 8,
            grid_rows: 3,
            grid_cols: 2,
            print_margin_factor: 1.02,
            glue_color: default_glue_color(),
            cut_color: default_cut_color(),
            number_color: default_number_color(),
            number_size: default_number_size(),
            number_offset: default_number_offset(),
            number_font: None,
            page_background: default_page_background(),
            output_format: default_output_format(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

/// Upper bound for `print_margin_factor`; the print margin is a thin border,
/// not a rescale.
pub const MAX_PRINT_MARGIN_FACTOR: f64 = 4.0;

impl FlipbookConfig {
    /// Width of the frame content before any margin is added.
    pub fn base_width(&self) -> u32 {
        self.page_width
            .saturating_sub(self.glue_margin)
            .saturating_sub(self.cut_margin.saturating_mul(2))
    }

    /// Height of the frame content before any margin is added.
    pub fn base_height(&self) -> u32 {
        self.page_height
            .saturating_sub(self.cut_margin.saturating_mul(2))
    }

    /// Frames per print page.
    pub fn grid_capacity(&self) -> u32 {
        self.grid_rows.saturating_mul(self.grid_cols)
    }

    /// Validates the configuration parameters.
    ///
    /// Returns an error if:
    /// - The grid has zero rows or columns
    /// - Page dimensions are zero
    /// - Glue/cut margins leave no room for frame content
    /// - The print margin factor or JPEG quality is out of range
    /// - Frame numbers would be taller than the frame content
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::FlipbookError;

        if self.grid_rows == 0 || self.grid_cols == 0 {
            return Err(FlipbookError::Configuration(format!(
                "grid must have at least one row and one column (got {}x{})",
                self.grid_rows, self.grid_cols
            )));
        }

        if self.page_width == 0 || self.page_height == 0 {
            return Err(FlipbookError::InvalidDimensions {
                width: self.page_width,
                height: self.page_height,
            });
        }

        let horizontal = self
            .glue_margin
            .saturating_add(self.cut_margin.saturating_mul(2));
        if horizontal >= self.page_width {
            return Err(FlipbookError::Configuration(format!(
                "glue_margin ({}) + cut_margin ({}) * 2 leaves no content width in page_width {}",
                self.glue_margin, self.cut_margin, self.page_width
            )));
        }
        if self.cut_margin.saturating_mul(2) >= self.page_height {
            return Err(FlipbookError::Configuration(format!(
                "cut_margin ({}) * 2 leaves no content height in page_height {}",
                self.cut_margin, self.page_height
            )));
        }

        if !(1.0..=MAX_PRINT_MARGIN_FACTOR).contains(&self.print_margin_factor) {
            return Err(FlipbookError::Configuration(format!(
                "print_margin_factor must be within 1.0..={} (got {})",
                MAX_PRINT_MARGIN_FACTOR, self.print_margin_factor
            )));
        }

        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(FlipbookError::Configuration(format!(
                "jpeg_quality must be within 1..=100 (got {})",
                self.jpeg_quality
            )));
        }

        if !(self.number_size.is_finite() && self.number_size > 0.0) {
            return Err(FlipbookError::Configuration(format!(
                "number_size must be positive (got {})",
                self.number_size
            )));
        }
        if self.number_size > self.base_height() as f32 {
            return Err(FlipbookError::Configuration(format!(
                "number_size ({}) exceeds the frame content height {}",
                self.number_size,
                self.base_height()
            )));
        }

        Ok(())
    }
}

fn default_glue_color() -> [u8; 4] {
    [255, 255, 255, 255]
}
fn default_cut_color() -> [u8; 4] {
    [0, 0, 0, 255]
}
fn default_number_color() -> [u8; 4] {
    [255, 0, 0, 255]
}
fn default_number_size() -> f32 {
    40.0
}
fn default_number_offset() -> (u32, u32) {
    (20, 20)
}
fn default_page_background() -> [u8; 4] {
    [155, 155, 155, 255]
}
fn default_output_format() -> OutputFormat {
    OutputFormat::Jpeg
}
fn default_jpeg_quality() -> u8 {
    90
}

/// Builder for `FlipbookConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct FlipbookConfigBuilder {
    cfg: FlipbookConfig,
}

impl FlipbookConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: FlipbookConfig::default(),
        }
    }
    pub fn with_page_dimensions(mut self, w: u32, h: u32) -> Self {
        self.cfg.page_width = w;
        self.cfg.page_height = h;
        self
    }
    pub fn glue_margin(mut self, v: u32) -> Self {
        self.cfg.glue_margin = v;
        self
    }
    pub fn cut_margin(mut self, v: u32) -> Self {
        self.cfg.cut_margin = v;
        self
    }
    pub fn grid(mut self, rows: u32, cols: u32) -> Self {
        self.cfg.grid_rows = rows;
        self.cfg.grid_cols = cols;
        self
    }
    pub fn print_margin_factor(mut self, v: f64) -> Self {
        self.cfg.print_margin_factor = v;
        self
    }
    pub fn glue_color(mut self, v: [u8; 4]) -> Self {
        self.cfg.glue_color = v;
        self
    }
    pub fn cut_color(mut self, v: [u8; 4]) -> Self {
        self.cfg.cut_color = v;
        self
    }
    pub fn number_color(mut self, v: [u8; 4]) -> Self {
        self.cfg.number_color = v;
        self
    }
    pub fn number_size(mut self, v: f32) -> Self {
        self.cfg.number_size = v;
        self
    }
    pub fn number_offset(mut self, x: u32, y: u32) -> Self {
        self.cfg.number_offset = (x, y);
        self
    }
    pub fn number_font(mut self, v: Option<PathBuf>) -> Self {
        self.cfg.number_font = v;
        self
    }
    pub fn page_background(mut self, v: [u8; 4]) -> Self {
        self.cfg.page_background = v;
        self
    }
    pub fn output_format(mut self, v: OutputFormat) -> Self {
        self.cfg.output_format = v;
        self
    }
    pub fn jpeg_quality(mut self, v: u8) -> Self {
        self.cfg.jpeg_quality = v;
        self
    }
    pub fn build(self) -> FlipbookConfig {
        self.cfg
    }
}

impl FlipbookConfig {
    /// Create a fluent builder for `FlipbookConfig`.
    pub fn builder() -> FlipbookConfigBuilder {
        FlipbookConfigBuilder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_base_area_is_three_by_two() {
        let cfg = FlipbookConfig::default();
        assert_eq!(cfg.base_width(), 576);
        assert_eq!(cfg.base_height(), 384);
        assert_eq!(cfg.base_width() * 2, cfg.base_height() * 3);
        assert_eq!(cfg.grid_capacity(), 6);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn output_format_parses_aliases() {
        assert_eq!("JPG".parse::<OutputFormat>(), Ok(OutputFormat::Jpeg));
        assert_eq!("jpeg".parse::<OutputFormat>(), Ok(OutputFormat::Jpeg));
        assert_eq!("png".parse::<OutputFormat>(), Ok(OutputFormat::Png));
        assert!("webp".parse::<OutputFormat>().is_err());
    }
}
