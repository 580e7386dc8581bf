//! PNG encoding for captured frames
//!
//! Screenshots hold bottom-up RGBA8 rows straight from the renderer. The
//! encoders here flip them into a conventional top-down image and compress
//! the result as PNG.
//!
//! # Examples
//!
//! ```
//! use framegrab::{
//!     capture::{NamingScheme, Screenshot, ScreenshotAppState},
//!     error::CaptureResult,
//!     host::headless::HeadlessApp,
//!     util::encode::encode_png,
//! };
//!
//! let mut app = HeadlessApp::new(32, 16);
//! let state = ScreenshotAppState::new().with_handler(
//!     |shot: Screenshot, _naming: &NamingScheme| -> CaptureResult<()> {
//!         let png = encode_png(&shot)?;
//!         assert_eq!(&png[1..4], b"PNG");
//!         Ok(())
//!     },
//! );
//!
//! app.attach_state(Box::new(state.clone()));
//! state.take_screenshot();
//! app.update(0.016).unwrap();
//! ```

use std::io::Cursor;

use image::{
    ImageEncoder,
    codecs::png::{CompressionType, FilterType, PngEncoder},
};

use crate::{
    capture::Screenshot,
    error::{CaptureError, CaptureResult},
};

/// Quality used when none is configured
pub const DEFAULT_QUALITY: u8 = 80;

/// Maps a quality value (0-100) to a PNG compression type
///
/// PNG is lossless, so quality only trades encoding speed for file size:
/// - 0-33: Fast compression (faster encoding, larger files)
/// - 34-66: Default compression (balanced)
/// - 67-100: Best compression (slower encoding, smaller files)
///
/// # Examples
///
/// ```
/// use image::codecs::png::CompressionType;
/// use framegrab::util::encode::compression_type_from_quality;
///
/// assert!(matches!(compression_type_from_quality(20), CompressionType::Fast));
/// assert!(matches!(compression_type_from_quality(50), CompressionType::Default));
/// assert!(matches!(compression_type_from_quality(90), CompressionType::Best));
/// ```
pub fn compression_type_from_quality(quality: u8) -> CompressionType {
    match quality {
        0..=33 => CompressionType::Fast,
        34..=66 => CompressionType::Default,
        _ => CompressionType::Best,
    }
}

/// Encodes a screenshot as PNG with default compression
pub fn encode_png(screenshot: &Screenshot) -> CaptureResult<Vec<u8>> {
    encode_png_with_compression(screenshot, CompressionType::Default)
}

/// Encodes a screenshot as PNG with the given compression level
///
/// # Errors
///
/// - [`CaptureError::ImageError`] when the pixel buffer does not match the
///   frame dimensions
/// - [`CaptureError::EncodingFailed`] for empty frames or encoder failures
pub fn encode_png_with_compression(
    screenshot: &Screenshot,
    compression: CompressionType,
) -> CaptureResult<Vec<u8>> {
    let (width, height) = (screenshot.width(), screenshot.height());
    if width == 0 || height == 0 {
        return Err(CaptureError::EncodingFailed {
            format: "png".to_string(),
            reason: format!("frame has no pixels ({width}x{height})"),
        });
    }

    let rgba = screenshot.to_rgba_image()?;
    let mut output = Vec::new();

    // Adaptive filter picks the best filter per scanline
    let encoder =
        PngEncoder::new_with_quality(Cursor::new(&mut output), compression, FilterType::Adaptive);

    encoder
        .write_image(rgba.as_raw(), width, height, image::ExtendedColorType::Rgba8)
        .map_err(|e| CaptureError::EncodingFailed {
            format: "png".to_string(),
            reason: e.to_string(),
        })?;

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

    /// Two-row frame: bottom row red, top row blue
    fn two_tone(width: u32) -> Screenshot {
        let mut buffer = Vec::new();
        for _ in 0..width {
            buffer.extend_from_slice(&[255, 0, 0, 255]);
        }
        for _ in 0..width {
            buffer.extend_from_slice(&[0, 0, 255, 255]);
        }
        Screenshot::new(buffer, width, 2, 1)
    }

    #[test]
    fn test_compression_type_from_quality() {
        assert!(matches!(compression_type_from_quality(0), CompressionType::Fast));
        assert!(matches!(compression_type_from_quality(33), CompressionType::Fast));
        assert!(matches!(compression_type_from_quality(34), CompressionType::Default));
        assert!(matches!(compression_type_from_quality(66), CompressionType::Default));
        assert!(matches!(compression_type_from_quality(67), CompressionType::Best));
        assert!(matches!(
            compression_type_from_quality(DEFAULT_QUALITY),
            CompressionType::Best
        ));
        assert!(matches!(compression_type_from_quality(255), CompressionType::Best));
    }

    #[test]
    fn test_encode_png_signature() {
        let bytes = encode_png(&two_tone(16)).unwrap();
        assert_eq!(&bytes[0..8], &PNG_SIGNATURE);
    }

    #[test]
    fn test_encode_png_is_top_down() {
        let bytes = encode_png(&two_tone(4)).unwrap();

        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (4, 2));
        assert_eq!(decoded.get_pixel(0, 0).0, [0, 0, 255, 255]);
        assert_eq!(decoded.get_pixel(3, 1).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_encode_png_compression_levels_decode_identically() {
        let shot = two_tone(64);

        let fast = encode_png_with_compression(&shot, CompressionType::Fast).unwrap();
        let best = encode_png_with_compression(&shot, CompressionType::Best).unwrap();

        let fast_img = image::load_from_memory(&fast).unwrap().to_rgba8();
        let best_img = image::load_from_memory(&best).unwrap().to_rgba8();
        assert_eq!(fast_img.as_raw(), best_img.as_raw());
    }

    #[test]
    fn test_encode_png_empty_frame() {
        let shot = Screenshot::new(Vec::new(), 0, 0, 1);
        assert!(matches!(
            encode_png(&shot),
            Err(CaptureError::EncodingFailed { .. })
        ));
    }

    #[test]
    fn test_encode_png_mismatched_buffer() {
        let shot = Screenshot::new(vec![0; 8], 4, 4, 1);
        assert!(matches!(encode_png(&shot), Err(CaptureError::ImageError(_))));
    }
}
