//! Run diagnostics: timing and counts for each stage.
//!
//! [`process_with_diagnostics`] runs the same steps as
//! [`process`](crate::process) while recording per-stage durations and
//! metrics. Time is read through the [`Clock`] trait so this crate stays
//! free of platform time sources; callers supply one.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::flood::FillStats;
use crate::types::{
    Dimensions, PipelineError, ProcessResult, ReferenceSource, RemovalConfig, Rgb,
};
use crate::{background, decode, flood};

/// Source of timestamps for stage timing.
pub trait Clock {
    /// Opaque point in time.
    type Instant;

    /// Current time.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected from a single run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemovalDiagnostics {
    /// Stage 1: decoding to RGBA.
    pub decode: StageDiagnostics,
    /// Stage 2: corner-average estimation (`None` when the reference
    /// color was supplied).
    pub estimate: Option<StageDiagnostics>,
    /// Stage 3: border flood fill.
    pub fill: StageDiagnostics,
    /// Total wall-clock duration of the run (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary of the run.
    pub summary: RemovalSummary,
}

/// Diagnostics for a single stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Decoding metrics.
    Decode {
        /// Size of the input image bytes.
        input_bytes: usize,
        /// Decoded image width in pixels.
        width: u32,
        /// Decoded image height in pixels.
        height: u32,
    },
    /// Corner-average estimation metrics.
    Estimate {
        /// The estimated reference color.
        reference: Rgb,
    },
    /// Flood fill metrics.
    Fill {
        /// Tolerance used for the similarity test.
        tolerance: u8,
        /// Counts from the traversal.
        stats: FillStats,
    },
}

/// High-level summary of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemovalSummary {
    /// Image width in pixels.
    pub image_width: u32,
    /// Image height in pixels.
    pub image_height: u32,
    /// Total pixel count.
    pub pixel_count: u64,
    /// Reference color used by the fill.
    pub reference: Rgb,
    /// Where the reference color came from.
    pub source: ReferenceSource,
    /// Pixels classified as background.
    pub cleared_pixels: u64,
}

/// Run the full pipeline, collecting diagnostics.
///
/// # Errors
///
/// Same as [`process`](crate::process).
pub fn process_with_diagnostics<C: Clock>(
    image_bytes: &[u8],
    config: &RemovalConfig,
    clock: &C,
) -> Result<(ProcessResult, RemovalDiagnostics), PipelineError> {
    let run_start = clock.now();

    let start = clock.now();
    let mut image = decode::decode_rgba(image_bytes)?;
    let dimensions = Dimensions::of(&image);
    let decode = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::Decode {
            input_bytes: image_bytes.len(),
            width: dimensions.width,
            height: dimensions.height,
        },
    };

    let (reference, source, estimate) = if let Some(color) = config.background {
        (color, ReferenceSource::Override, None)
    } else {
        let start = clock.now();
        let reference = background::estimate_background(&image)?;
        let stage = StageDiagnostics {
            duration: clock.elapsed(&start),
            metrics: StageMetrics::Estimate { reference },
        };
        (reference, ReferenceSource::CornerAverage, Some(stage))
    };

    let start = clock.now();
    let stats = flood::clear_border_background(&mut image, reference, config.tolerance)?;
    let fill = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::Fill {
            tolerance: config.tolerance.get(),
            stats,
        },
    };

    let diagnostics = RemovalDiagnostics {
        decode,
        estimate,
        fill,
        total_duration: clock.elapsed(&run_start),
        summary: RemovalSummary {
            image_width: dimensions.width,
            image_height: dimensions.height,
            pixel_count: dimensions.pixel_count(),
            reference,
            source,
            cleared_pixels: stats.cleared,
        },
    };

    let result = ProcessResult {
        image,
        reference,
        source,
        stats,
    };

    Ok((result, diagnostics))
}

impl RemovalDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Background Removal Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Image: {}x{} ({} pixels)",
            self.summary.image_width, self.summary.image_height, self.summary.pixel_count,
        ));
        lines.push(format!(
            "Reference: {} ({})",
            self.summary.reference, self.summary.source
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);

        let mut stages = vec![("Decode", &self.decode)];
        if let Some(ref estimate) = self.estimate {
            stages.push(("Estimate", estimate));
        }
        stages.push(("Fill", &self.fill));

        for (name, diag) in &stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Decode {
            input_bytes,
            width,
            height,
        } => format!("{input_bytes} bytes -> {width}x{height}"),
        StageMetrics::Estimate { reference } => format!("corners -> {reference}"),
        StageMetrics::Fill { tolerance, stats } => format!(
            "tol={tolerance} seeds={} cleared={}/{} ({:.1}%)",
            stats.seeds,
            stats.cleared,
            stats.total,
            stats.cleared_fraction() * 100.0,
        ),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::Cell;

    use image::{Rgba, RgbaImage};

    use super::*;
    use crate::types::Tolerance;

    /// Clock that advances one millisecond per reading.
    struct StepClock(Cell<u64>);

    impl Clock for StepClock {
        type Instant = u64;

        fn now(&self) -> u64 {
            let t = self.0.get();
            self.0.set(t + 1);
            t
        }

        fn elapsed(&self, since: &u64) -> Duration {
            Duration::from_millis(self.0.get() - since)
        }
    }

    fn framed_png() -> Vec<u8> {
        let img = RgbaImage::from_fn(6, 4, |x, y| {
            if (2..4).contains(&x) && (1..3).contains(&y) {
                Rgba([20, 30, 40, 255])
            } else {
                Rgba([250, 250, 250, 255])
            }
        });
        let mut buf = std::io::Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn duration_ms_converts_correctly() {
        let d = Duration::from_millis(1234);
        let ms = duration_ms(d);
        assert!((ms - 1234.0).abs() < 0.01);
    }

    #[test]
    fn diagnostics_match_plain_process() {
        let png = framed_png();
        let config = RemovalConfig::default();
        let clock = StepClock(Cell::new(0));

        let (result, diag) = process_with_diagnostics(&png, &config, &clock).unwrap();
        let plain = crate::process(&png, &config).unwrap();

        assert_eq!(result, plain);
        assert_eq!(diag.summary.cleared_pixels, 20);
        assert_eq!(diag.summary.reference, Rgb::new(250, 250, 250));
        assert_eq!(diag.summary.source, ReferenceSource::CornerAverage);
        assert!(diag.estimate.is_some());
        assert!(diag.total_duration >= diag.fill.duration);
    }

    #[test]
    fn override_skips_estimate_stage() {
        let config = RemovalConfig {
            tolerance: Tolerance::new(5),
            background: Some(Rgb::new(250, 250, 250)),
        };
        let clock = StepClock(Cell::new(0));
        let (_, diag) = process_with_diagnostics(&framed_png(), &config, &clock).unwrap();
        assert!(diag.estimate.is_none());
        assert_eq!(diag.summary.source, ReferenceSource::Override);
        assert!(!diag.report().contains("Estimate"));
    }

    #[test]
    fn errors_propagate() {
        let clock = StepClock(Cell::new(0));
        let result = process_with_diagnostics(&[], &RemovalConfig::default(), &clock);
        assert!(matches!(result, Err(PipelineError::EmptyInput)));
    }

    #[test]
    fn report_mentions_stages() {
        let clock = StepClock(Cell::new(0));
        let (_, diag) =
            process_with_diagnostics(&framed_png(), &RemovalConfig::default(), &clock).unwrap();
        let report = diag.report();
        assert!(report.contains("Background Removal Report"));
        assert!(report.contains("Decode"));
        assert!(report.contains("Estimate"));
        assert!(report.contains("cleared=20/24"));
        assert!(report.contains("250,250,250 (corner average)"));
    }

    #[test]
    fn diagnostics_serialize_durations_as_seconds() {
        let clock = StepClock(Cell::new(0));
        let (_, diag) =
            process_with_diagnostics(&framed_png(), &RemovalConfig::default(), &clock).unwrap();
        let json = serde_json::to_value(&diag).unwrap();
        assert!(json["total_duration"].is_f64());
        assert!(json["fill"]["duration"].is_f64());
        assert_eq!(json["summary"]["cleared_pixels"], 20);
    }
}
