//! Reference background color estimation.
//!
//! The reference color is either supplied by the caller or estimated
//! from the four corner pixels of the image. Both paths produce a single
//! [`Rgb`] used uniformly by the flood fill.

use image::RgbaImage;

use crate::types::{Dimensions, PipelineError, ReferenceSource, Rgb};

/// Estimate the background color as the average of the four corners.
///
/// Samples `(0, 0)`, `(w-1, 0)`, `(0, h-1)` and `(w-1, h-1)` and
/// averages each channel independently with floor division. On images
/// one pixel wide or tall some corners coincide and are counted twice.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidDimensions`] for zero-area images.
pub fn estimate_background(image: &RgbaImage) -> Result<Rgb, PipelineError> {
    let Dimensions { width, height } = Dimensions::of(image).validate()?;
    let (right, bottom) = (width - 1, height - 1);

    let corners = [
        image.get_pixel(0, 0),
        image.get_pixel(right, 0),
        image.get_pixel(0, bottom),
        image.get_pixel(right, bottom),
    ];

    let mut sums = [0u16; 3];
    for pixel in corners {
        for (sum, &value) in sums.iter_mut().zip(&pixel.0[..3]) {
            *sum += u16::from(value);
        }
    }

    // Four u8 samples sum to at most 1020, so the quotient fits in a u8.
    let [r, g, b] = sums.map(|sum| u8::try_from(sum / 4).unwrap_or(u8::MAX));
    Ok(Rgb::new(r, g, b))
}

/// Pick the reference color for a run.
///
/// An explicit `background` bypasses estimation entirely. Dimensions are
/// validated on both paths so callers see the same failure either way.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidDimensions`] for zero-area images.
pub fn resolve_reference(
    image: &RgbaImage,
    background: Option<Rgb>,
) -> Result<(Rgb, ReferenceSource), PipelineError> {
    match background {
        Some(color) => {
            Dimensions::of(image).validate()?;
            Ok((color, ReferenceSource::Override))
        }
        None => Ok((estimate_background(image)?, ReferenceSource::CornerAverage)),
    }
}
