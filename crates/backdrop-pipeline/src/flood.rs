//! Border flood fill: make border-connected background transparent.
//!
//! Seeds a breadth-first traversal from every border pixel that is
//! within tolerance of the reference color, then expands through
//! 4-connected neighbors that are also within tolerance. Every visited
//! pixel has its alpha set to 0. Red, green and blue are never written.
//!
//! Background-colored regions that do not touch the border through a
//! chain of similar pixels are left opaque.
//!
//! The similarity test reads only RGB, and the fill writes only alpha,
//! so the set of cleared pixels does not depend on traversal order.

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::types::{Dimensions, PipelineError, Rgb, Tolerance};

/// Bytes per RGBA8 pixel.
const CHANNELS: usize = 4;

/// Offset of the alpha byte within a pixel.
const ALPHA: usize = 3;

/// Alpha value written to background pixels.
pub const TRANSPARENT: u8 = 0;

/// Counts collected from one flood fill.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillStats {
    /// Border pixels within tolerance that seeded the traversal.
    pub seeds: u64,
    /// Pixels classified as background and given alpha 0, seeds
    /// included. Pixels that were already transparent are counted too.
    pub cleared: u64,
    /// Total pixels in the image.
    pub total: u64,
}

impl FillStats {
    /// Fraction of the image classified as background, in `0.0..=1.0`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn cleared_fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.cleared as f64 / self.total as f64
        }
    }
}

/// Clear the alpha of every border-connected pixel similar to `reference`.
///
/// Mutates `image` in place. Output has identical dimensions and RGB
/// values; only alpha differs, and only for cleared pixels.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidDimensions`] for zero-area images.
/// Validation happens before any pixel is touched.
pub fn clear_border_background(
    image: &mut RgbaImage,
    reference: Rgb,
    tolerance: Tolerance,
) -> Result<FillStats, PipelineError> {
    let dimensions = Dimensions::of(image).validate()?;
    let width = dimensions.width as usize;
    let height = dimensions.height as usize;
    let len = width * height;

    let pixels: &mut [u8] = image;

    let mut visited = vec![false; len];

    // Each pixel is pushed at most once, so a single allocation with a
    // read cursor serves as the FIFO without ever growing or wrapping.
    let mut queue: Vec<usize> = Vec::with_capacity(len);

    for index in border_indices(width, height) {
        if !visited[index] && is_similar(pixels, index, reference, tolerance) {
            visited[index] = true;
            queue.push(index);
        }
    }
    let seeds = queue.len();

    let mut head = 0;
    while let Some(&index) = queue.get(head) {
        head += 1;
        pixels[index * CHANNELS + ALPHA] = TRANSPARENT;

        let (x, y) = (index % width, index / width);
        let neighbors = [
            (x > 0).then(|| index - 1),
            (x + 1 < width).then(|| index + 1),
            (y > 0).then(|| index - width),
            (y + 1 < height).then(|| index + width),
        ];

        for neighbor in neighbors.into_iter().flatten() {
            if !visited[neighbor] && is_similar(pixels, neighbor, reference, tolerance) {
                visited[neighbor] = true;
                queue.push(neighbor);
            }
        }
    }

    Ok(FillStats {
        seeds: seeds as u64,
        cleared: queue.len() as u64,
        total: dimensions.pixel_count(),
    })
}

/// RGB-only similarity test for the pixel at flat `index`.
fn is_similar(pixels: &[u8], index: usize, reference: Rgb, tolerance: Tolerance) -> bool {
    let offset = index * CHANNELS;
    let color = Rgb::new(pixels[offset], pixels[offset + 1], pixels[offset + 2]);
    tolerance.accepts(color.distance_squared(reference))
}

/// Flat row-major indices of every border pixel, each exactly once.
///
/// Order: top row, bottom row, then the left and right columns
/// excluding the corners already covered by the rows.
pub fn border_indices(width: usize, height: usize) -> impl Iterator<Item = usize> {
    let bottom = (height > 1).then(|| (height - 1) * width);
    let top_and_bottom =
        (0..width).flat_map(move |x| std::iter::once(x).chain(bottom.map(|row| row + x)));

    let inner_rows = 1..height.saturating_sub(1);
    let sides = inner_rows.flat_map(move |y| {
        let left = y * width;
        std::iter::once(left).chain((width > 1).then(|| left + width - 1))
    });

    top_and_bottom.chain(sides)
}
