//! backdrop-pipeline: Pure background removal (sans-IO).
//!
//! Makes the plain background of a raster image transparent through:
//! decode -> reference color (override or corner average) ->
//! border flood fill that clears alpha.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! byte slices and pixel buffers and returns structured data. All
//! filesystem interaction lives in the `backdrop` binary.

pub mod background;
pub mod decode;
pub mod diagnostics;
pub mod flood;
pub mod types;

pub use flood::FillStats;
pub use types::{
    Dimensions, PipelineError, ProcessResult, ReferenceSource, RemovalConfig, Rgb, RgbaImage,
    Tolerance,
};

/// Remove the background of an already-decoded image in place.
///
/// Resolves the reference color (the configured override, or the
/// average of the four corners) and then clears the alpha of every
/// border-connected pixel within tolerance of it.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidDimensions`] for zero-area images.
/// The image is left untouched on error.
pub fn remove_background(
    image: &mut RgbaImage,
    config: &RemovalConfig,
) -> Result<(Rgb, ReferenceSource, FillStats), PipelineError> {
    let (reference, source) = background::resolve_reference(image, config.background)?;
    let stats = flood::clear_border_background(image, reference, config.tolerance)?;
    Ok((reference, source, stats))
}

/// Run the full pipeline on encoded image bytes.
///
/// Takes raw image bytes (PNG, JPEG, BMP, WebP) and a configuration,
/// and returns the decoded image with its background made transparent.
///
/// # Pipeline steps
///
/// 1. Decode image and convert to RGBA8
/// 2. Resolve the reference color (override or corner average)
/// 3. Border flood fill, clearing alpha of background pixels
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `image_bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image format is unrecognized.
/// Returns [`PipelineError::InvalidDimensions`] for zero-area images.
pub fn process(image_bytes: &[u8], config: &RemovalConfig) -> Result<ProcessResult, PipelineError> {
    let mut image = decode::decode_rgba(image_bytes)?;
    let (reference, source, stats) = remove_background(&mut image, config)?;
    Ok(ProcessResult {
        image,
        reference,
        source,
        stats,
    })
}
