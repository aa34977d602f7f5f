//! Shared types for the backdrop pipeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::flood::FillStats;

/// Re-export `RgbaImage` so downstream crates can reference the
/// pixel buffer without depending on `image` directly.
pub use image::RgbaImage;

/// An opaque RGB color, used as the reference background color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RgbRepr")]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb {
    /// Create a new color.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build a color from wide integers, rejecting any channel outside `0..=255`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidColorComponent`] naming the first
    /// offending channel.
    pub fn try_from_components(r: i64, g: i64, b: i64) -> Result<Self, PipelineError> {
        Ok(Self {
            r: channel("red", r)?,
            g: channel("green", g)?,
            b: channel("blue", b)?,
        })
    }

    /// Squared Euclidean distance to another color in RGB space.
    ///
    /// Kept squared so comparisons stay exact in integer arithmetic.
    #[must_use]
    pub const fn distance_squared(self, other: Self) -> u32 {
        let dr = self.r.abs_diff(other.r) as u32;
        let dg = self.g.abs_diff(other.g) as u32;
        let db = self.b.abs_diff(other.b) as u32;
        dr * dr + dg * dg + db * db
    }

    /// The RGB part of an RGBA pixel. Alpha is ignored.
    #[must_use]
    pub const fn from_rgba(pixel: &image::Rgba<u8>) -> Self {
        Self::new(pixel.0[0], pixel.0[1], pixel.0[2])
    }
}

/// Wide-integer form of [`Rgb`] so out-of-range channels reach
/// [`Rgb::try_from_components`] instead of failing inside serde.
#[derive(Deserialize)]
struct RgbRepr {
    r: i64,
    g: i64,
    b: i64,
}

impl TryFrom<RgbRepr> for Rgb {
    type Error = PipelineError;

    fn try_from(repr: RgbRepr) -> Result<Self, Self::Error> {
        Self::try_from_components(repr.r, repr.g, repr.b)
    }
}

fn channel(name: &'static str, value: i64) -> Result<u8, PipelineError> {
    u8::try_from(value).map_err(|_| PipelineError::InvalidColorComponent {
        channel: name,
        value,
    })
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.r, self.g, self.b)
    }
}

/// Parses `"r,g,b"`, e.g. `"240, 240, 240"`.
impl FromStr for Rgb {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').collect();
        let &[r, g, b] = parts.as_slice() else {
            return Err(PipelineError::InvalidColorSyntax(format!(
                "expected 'r,g,b', got '{s}'"
            )));
        };

        let parse = |part: &str| {
            part.trim().parse::<i64>().map_err(|e| {
                PipelineError::InvalidColorSyntax(format!("invalid component '{}': {e}", part.trim()))
            })
        };

        Self::try_from_components(parse(r)?, parse(g)?, parse(b)?)
    }
}

/// Color distance budget in `0..=255`.
///
/// A pixel is background-similar when its squared RGB distance to the
/// reference color is at most `tolerance²` (inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Tolerance(u8);

impl Tolerance {
    /// Tolerance used when none is given.
    pub const DEFAULT: Self = Self(35);

    /// Wrap an already-bounded value.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Validate a wide integer tolerance.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidTolerance`] if `value` is outside `0..=255`.
    pub fn try_new(value: i64) -> Result<Self, PipelineError> {
        u8::try_from(value)
            .map(Self)
            .map_err(|_| PipelineError::InvalidTolerance(value))
    }

    /// The raw tolerance value.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// `tolerance²`, the bound on squared color distance.
    #[must_use]
    pub const fn squared(self) -> u32 {
        let t = self.0 as u32;
        t * t
    }

    /// Whether a squared distance falls within this tolerance (inclusive).
    #[must_use]
    pub const fn accepts(self, distance_squared: u32) -> bool {
        distance_squared <= self.squared()
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<i64> for Tolerance {
    type Error = PipelineError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::try_new(value)
    }
}

impl From<Tolerance> for i64 {
    fn from(t: Tolerance) -> Self {
        Self::from(t.0)
    }
}

impl fmt::Display for Tolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Dimensions of an image buffer.
    #[must_use]
    pub fn of(image: &RgbaImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }

    /// Reject zero-area images.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidDimensions`] if either side is zero.
    pub fn validate(self) -> Result<Self, PipelineError> {
        if self.width == 0 || self.height == 0 {
            return Err(PipelineError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        Ok(self)
    }

    /// Total number of pixels.
    #[must_use]
    pub const fn pixel_count(self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Configuration for a background removal run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemovalConfig {
    /// Maximum color distance from the reference for a pixel to count
    /// as background.
    pub tolerance: Tolerance,

    /// Explicit reference color. When `None`, the reference is the
    /// average of the four corner pixels.
    pub background: Option<Rgb>,
}

impl RemovalConfig {
    /// Default tolerance, exposed for CLI defaults.
    pub const DEFAULT_TOLERANCE: u8 = Tolerance::DEFAULT.get();
}

impl Default for RemovalConfig {
    fn default() -> Self {
        Self {
            tolerance: Tolerance::DEFAULT,
            background: None,
        }
    }
}

/// Where the reference color came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferenceSource {
    /// Supplied explicitly by the caller.
    Override,
    /// Averaged from the four corner pixels.
    CornerAverage,
}

impl fmt::Display for ReferenceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Override => f.write_str("override"),
            Self::CornerAverage => f.write_str("corner average"),
        }
    }
}

/// Result of running the full pipeline on encoded image bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessResult {
    /// The decoded image with background alpha cleared.
    pub image: RgbaImage,

    /// Reference color the fill compared against.
    pub reference: Rgb,

    /// Whether the reference was supplied or estimated.
    pub source: ReferenceSource,

    /// Counts from the flood fill.
    pub stats: FillStats,
}

impl ProcessResult {
    /// Dimensions of the output image.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::of(&self.image)
    }
}

/// Errors that can occur during background removal.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The image data could not be decoded.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input byte slice was empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// The image has zero width or height.
    #[error("invalid image dimensions {width}x{height}: both must be at least 1")]
    InvalidDimensions {
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },

    /// Tolerance outside `0..=255`.
    #[error("tolerance must be in range 0..255, got {0}")]
    InvalidTolerance(i64),

    /// A reference color channel outside `0..=255`.
    #[error("{channel} component must be between 0 and 255, got {value}")]
    InvalidColorComponent {
        /// Channel name (`red`, `green`, or `blue`).
        channel: &'static str,
        /// The rejected value.
        value: i64,
    },

    /// Reference color text not in `r,g,b` form.
    #[error("invalid RGB color: {0}")]
    InvalidColorSyntax(String),

    /// A configuration document could not be parsed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
