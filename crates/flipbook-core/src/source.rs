use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use image::codecs::gif::GifDecoder;
use image::codecs::png::PngDecoder;
use image::{AnimationDecoder, ImageFormat, ImageReader, RgbaImage};
use tracing::{debug, instrument};

use crate::error::{FlipbookError, Result};

/// Decodes every animation frame of `path` as RGBA.
///
/// - GIF and APNG frames come out fully composited (disposal methods applied by the decoder).
/// - Any other format the `image` crate reads is a single-frame animation.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load_frames(path: &Path) -> Result<Vec<RgbaImage>> {
    let format = ImageReader::open(path)?.with_guessed_format()?.format();
    let frames: Vec<RgbaImage> = match format {
        Some(ImageFormat::Gif) => {
            let decoder = GifDecoder::new(BufReader::new(File::open(path)?))?;
            decoder
                .into_frames()
                .collect_frames()?
                .into_iter()
                .map(|f| f.into_buffer())
                .collect()
        }
        Some(ImageFormat::Png) => {
            let decoder = PngDecoder::new(BufReader::new(File::open(path)?))?;
            if decoder.is_apng()? {
                decoder
                    .apng()?
                    .into_frames()
                    .collect_frames()?
                    .into_iter()
                    .map(|f| f.into_buffer())
                    .collect()
            } else {
                vec![load_still(path)?]
            }
        }
        _ => vec![load_still(path)?],
    };
    if frames.is_empty() {
        return Err(FlipbookError::Empty);
    }
    debug!(frames = frames.len(), ?format, "decoded animation");
    Ok(frames)
}

/// Decodes one still image per path, in the given order.
pub fn load_frame_sequence(paths: &[PathBuf]) -> Result<Vec<RgbaImage>> {
    if paths.is_empty() {
        return Err(FlipbookError::Empty);
    }
    paths.iter().map(|p| load_still(p)).collect()
}

fn load_still(path: &Path) -> Result<RgbaImage> {
    let img = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    Ok(img.to_rgba8())
}

/// Checks that every frame has the same size and returns it.
pub fn uniform_size(frames: &[RgbaImage]) -> Result<(u32, u32)> {
    let first = frames.first().ok_or(FlipbookError::Empty)?.dimensions();
    if let Some((idx, f)) = frames
        .iter()
        .enumerate()
        .find(|(_, f)| f.dimensions() != first)
    {
        return Err(FlipbookError::Configuration(format!(
            "frame {} is {}x{} but frame 0 is {}x{}; all frames must share one size",
            idx,
            f.width(),
            f.height(),
            first.0,
            first.1
        )));
    }
    Ok(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn uniform_size_reports_mismatch() {
        let frames = vec![RgbaImage::new(4, 4), RgbaImage::new(4, 4), RgbaImage::new(3, 4)];
        let err = uniform_size(&frames).unwrap_err();
        assert!(err.to_string().contains("frame 2"));
    }

    #[test]
    fn gif_frames_round_trip_through_decoder() {
        use image::codecs::gif::GifEncoder;
        use image::{Delay, Frame};

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("anim.gif");
        {
            let file = File::create(&path).unwrap();
            let mut enc = GifEncoder::new(file);
            for shade in [0u8, 128, 255] {
                let buf = RgbaImage::from_pixel(6, 4, Rgba([shade, shade, shade, 255]));
                enc.encode_frame(Frame::from_parts(buf, 0, 0, Delay::from_numer_denom_ms(100, 1)))
                    .unwrap();
            }
        }
        let frames = load_frames(&path).unwrap();
        assert_eq!(frames.len(), 3);
        assert!(frames.iter().all(|f| f.dimensions() == (6, 4)));
    }
}
