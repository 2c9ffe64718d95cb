//! Reduced variants for standard resolution reports
//!
//! A report with "high resolution" turned off embeds a smaller JPEG of each
//! photo instead of the original upload. The variant is made once, while the
//! photo is being ingested:
//! - decode the upload
//! - shrink it so the longest edge fits `max_edge` (never upscale)
//! - re-encode as JPEG

use image::{codecs::jpeg::JpegEncoder, imageops::FilterType, ImageReader};
use std::io::Cursor;

/// Longest edge of a reduced variant, in pixels
pub const REDUCED_MAX_EDGE: u32 = 1280;

/// JPEG quality of reduced variants
const REDUCED_JPEG_QUALITY: u8 = 85;

/// Read the pixel dimensions of an encoded image without decoding it fully
pub fn probe_dimensions(bytes: &[u8]) -> Result<(u32, u32), String> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| format!("Failed to read image header: {}", e))?
        .into_dimensions()
        .map_err(|e| format!("Failed to read image dimensions: {}", e))
}

/// Produce the reduced JPEG variant of an encoded image
pub fn reduce(bytes: &[u8], max_edge: u32) -> Result<Vec<u8>, String> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| format!("Failed to decode image: {}", e))?;

    // Resize maintaining aspect ratio, only when larger than the target
    let resized = if img.width() > max_edge || img.height() > max_edge {
        img.resize(max_edge, max_edge, FilterType::Lanczos3)
    } else {
        img
    };

    // JPEG has no alpha channel
    let rgb = resized.to_rgb8();

    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, REDUCED_JPEG_QUALITY)
        .encode_image(&rgb)
        .map_err(|e| format!("Failed to encode reduced JPEG: {}", e))?;

    tracing::debug!(
        from = bytes.len(),
        to = out.len(),
        width = rgb.width(),
        height = rgb.height(),
        "Reduced image"
    );

    Ok(out)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};

    /// Encode a solid-colour PNG of the given size
    pub(crate) fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([180, 40, 40, 255]));
        let mut out = Vec::new();
        img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn test_probe_dimensions() {
        assert_eq!(probe_dimensions(&png(40, 24)).unwrap(), (40, 24));
        assert!(probe_dimensions(b"garbage").is_err());
    }

    #[test]
    fn test_reduce_shrinks_longest_edge() {
        let reduced = reduce(&png(400, 200), 100).unwrap();
        assert_eq!(image::guess_format(&reduced).unwrap(), ImageFormat::Jpeg);
        assert_eq!(probe_dimensions(&reduced).unwrap(), (100, 50));
    }

    #[test]
    fn test_reduce_never_upscales() {
        let reduced = reduce(&png(30, 20), 100).unwrap();
        assert_eq!(probe_dimensions(&reduced).unwrap(), (30, 20));
    }

    #[test]
    fn test_reduce_rejects_corrupt_input() {
        let err = reduce(&[0xFF, 0xD8, 0xFF, 0x00], 100).unwrap_err();
        assert!(err.starts_with("Failed to decode image"));
    }
}
