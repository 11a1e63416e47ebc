use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, Rgba, RgbaImage};
use serde_json::{Value, json};

use crate::compositing::flatten_onto;
use crate::config::{FlipbookConfig, OutputFormat};
use crate::error::Result;
use crate::model::PaginationPlan;

/// File name of print page `page_number`: `<base>-fbook<N>.<ext>`.
pub fn page_file_name(base_name: &str, page_number: usize, format: OutputFormat) -> String {
    format!("{}-fbook{}.{}", base_name, page_number, format.extension())
}

/// Encodes a finished page to `path` in the configured format.
///
/// JPEG pages are flattened onto the page background first since the format
/// carries no alpha. The buffered writer is flushed before returning so a
/// failed final write is reported instead of lost on drop.
pub fn write_page(page: &RgbaImage, path: &Path, cfg: &FlipbookConfig) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    match cfg.output_format {
        OutputFormat::Jpeg => {
            let mut flat = page.clone();
            flatten_onto(&mut flat, Rgba(cfg.page_background));
            let rgb = DynamicImage::ImageRgba8(flat).to_rgb8();
            let encoder = JpegEncoder::new_with_quality(&mut writer, cfg.jpeg_quality);
            encoder.write_image(
                rgb.as_raw(),
                rgb.width(),
                rgb.height(),
                ExtendedColorType::Rgb8,
            )?;
        }
        OutputFormat::Png => {
            let encoder = PngEncoder::new(&mut writer);
            encoder.write_image(
                page.as_raw(),
                page.width(),
                page.height(),
                ExtendedColorType::Rgba8,
            )?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Serialize a pagination plan as `{ grid, frameCount, pages, stats }`.
/// Each page lists its frames with slot coordinates and, when `file_names`
/// has an entry for the page, the file it was written to.
pub fn plan_to_json(plan: &PaginationPlan, file_names: &[String]) -> Value {
    let pages_val = plan
        .pages
        .iter()
        .map(|p| {
            let frames_val: Vec<Value> = p
                .assignments
                .iter()
                .map(|a| {
                    json!({
                        "frame": a.frame_index,
                        "row": a.slot.row,
                        "col": a.slot.col,
                    })
                })
                .collect();
            let mut page = json!({
                "id": p.id,
                "frames": frames_val,
            });
            if let Some(name) = file_names.get(p.id) {
                page["file"] = json!(name);
            }
            page
        })
        .collect::<Vec<_>>();
    json!({
        "grid": {"rows": plan.rows, "cols": plan.cols},
        "frameCount": plan.frame_count,
        "pages": pages_val,
        "stats": plan.stats(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packer::plan_pages;

    #[test]
    fn file_names_count_from_zero() {
        assert_eq!(page_file_name("cat", 0, OutputFormat::Jpeg), "cat-fbook0.jpg");
        assert_eq!(page_file_name("cat", 12, OutputFormat::Png), "cat-fbook12.png");
    }

    #[test]
    fn manifest_lists_pages_and_files() {
        let plan = plan_pages(5, 2, 2).unwrap();
        let names = vec!["a-fbook0.jpg".to_string(), "a-fbook1.jpg".to_string()];
        let v = plan_to_json(&plan, &names);
        assert_eq!(v["frameCount"], 5);
        assert_eq!(v["pages"].as_array().unwrap().len(), 2);
        assert_eq!(v["pages"][1]["file"], "a-fbook1.jpg");
        assert_eq!(v["pages"][1]["frames"][0]["frame"], 4);
        assert_eq!(v["stats"]["empty_slots"], 3);
    }

    #[test]
    fn png_page_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.png");
        let cfg = FlipbookConfig::builder()
            .output_format(OutputFormat::Png)
            .build();
        let page = RgbaImage::from_pixel(5, 3, Rgba([10, 20, 30, 255]));
        write_page(&page, &path, &cfg).unwrap();
        let back = image::open(&path).unwrap().to_rgba8();
        assert_eq!(back, page);
    }

    #[cfg(unix)]
    #[test]
    fn write_to_full_device_is_an_error() {
        let page = RgbaImage::from_pixel(16, 16, Rgba([200, 10, 10, 255]));
        let full = Path::new("/dev/full");
        if !full.exists() {
            return;
        }
        for format in [OutputFormat::Jpeg, OutputFormat::Png] {
            let cfg = FlipbookConfig::builder().output_format(format).build();
            assert!(
                write_page(&page, full, &cfg).is_err(),
                "{format:?} write to a full device succeeded"
            );
        }
    }
}
