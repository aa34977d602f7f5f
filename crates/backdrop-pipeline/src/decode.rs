//! Image decoding to RGBA.
//!
//! Accepts raw image bytes (PNG, JPEG, BMP, WebP) and produces an 8-bit
//! RGBA buffer. Formats without an alpha channel come out fully opaque.

use image::RgbaImage;

use crate::types::{Dimensions, PipelineError};

/// Decode raw image bytes and convert to RGBA8.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
/// Returns [`PipelineError::InvalidDimensions`] if the decoded image
/// has zero width or height.
pub fn decode_rgba(bytes: &[u8]) -> Result<RgbaImage, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    Dimensions::of(&rgba).validate()?;
    Ok(rgba)
}
