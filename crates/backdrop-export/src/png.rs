//! PNG serializer.
//!
//! Encodes an RGBA8 buffer losslessly so cleared alpha survives.

use backdrop_pipeline::RgbaImage;
use image::ImageEncoder;
use image::codecs::png::PngEncoder;

/// Errors that can occur while serializing an image.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The encoder rejected the image.
    #[error("failed to encode PNG: {0}")]
    Encode(#[from] image::ImageError),
}

/// Encode an RGBA image as PNG bytes.
///
/// # Errors
///
/// Returns [`ExportError::Encode`] if the encoder fails.
pub fn to_png(image: &RgbaImage) -> Result<Vec<u8>, ExportError> {
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf).write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ExtendedColorType::Rgba8,
    )?;
    Ok(buf)
}
