//! backdrop: remove a plain background and export a transparent PNG.
//!
//! Reads an image, makes every border-connected pixel close to the
//! background color transparent, and writes the result as PNG.
//!
//! # Usage
//!
//! ```text
//! backdrop input.jpg output.png
//! backdrop input.jpg output.png --tolerance 45
//! backdrop input.jpg output.png --background-rgb 240,240,240
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use backdrop_pipeline::diagnostics::{self, Clock};
use backdrop_pipeline::{RemovalConfig, Rgb, Tolerance};
use clap::Parser;

/// Remove a plain background from an image and export a transparent PNG.
///
/// Pixels connected to the image border whose color is within the
/// tolerance of the background color become fully transparent.
#[derive(Parser)]
#[command(name = "backdrop", version)]
struct Cli {
    /// Input image path (PNG, JPEG, BMP, WebP).
    input: PathBuf,

    /// Output PNG path. Missing parent directories are created.
    output: PathBuf,

    /// Color tolerance (0-255). Higher values remove more background.
    #[arg(long, default_value_t = RemovalConfig::DEFAULT_TOLERANCE)]
    tolerance: u8,

    /// Force the background color instead of averaging the corners,
    /// in the form r,g,b (e.g. 240,240,240).
    #[arg(long, value_name = "R,G,B", value_parser = parse_rgb)]
    background_rgb: Option<Rgb>,

    /// Full removal config as a JSON string.
    ///
    /// When provided, `--tolerance` and `--background-rgb` are ignored.
    /// The JSON must be a valid `RemovalConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,

    /// Print diagnostics as JSON on stdout instead of a report.
    #[arg(long)]
    json: bool,
}

fn parse_rgb(s: &str) -> Result<Rgb, String> {
    s.parse().map_err(|e: backdrop_pipeline::PipelineError| e.to_string())
}

/// Build a [`RemovalConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and the
/// individual flags are ignored.
fn config_from_cli(cli: &Cli) -> Result<RemovalConfig, backdrop_pipeline::PipelineError> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json)
            .map_err(|e| backdrop_pipeline::PipelineError::InvalidConfig(e.to_string()));
    }

    Ok(RemovalConfig {
        tolerance: Tolerance::new(cli.tolerance),
        background: cli.background_rgb,
    })
}

/// Write `bytes` to `path`, creating parent directories first.
fn write_output(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let image_bytes = match std::fs::read(&cli.input) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error reading {}: {e}", cli.input.display());
            return ExitCode::FAILURE;
        }
    };

    eprintln!(
        "Image: {} ({} bytes)",
        cli.input.display(),
        image_bytes.len(),
    );
    eprintln!("Tolerance: {}", config.tolerance);
    if let Some(color) = config.background {
        eprintln!("Background override: {color}");
    }

    let (result, diagnostics) =
        match diagnostics::process_with_diagnostics(&image_bytes, &config, &StdClock) {
            Ok(output) => output,
            Err(e) => {
                eprintln!("Pipeline error: {e}");
                return ExitCode::FAILURE;
            }
        };

    if cli.json {
        match serde_json::to_string_pretty(&diagnostics) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing diagnostics: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        println!("{}", diagnostics.report());
    }

    let png = match backdrop_export::to_png(&result.image) {
        Ok(png) => png,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = write_output(&cli.output, &png) {
        eprintln!("Error writing {}: {e}", cli.output.display());
        return ExitCode::FAILURE;
    }

    eprintln!(
        "PNG written to {} ({} bytes, {} of {} pixels classified background)",
        cli.output.display(),
        png.len(),
        result.stats.cleared,
        result.stats.total,
    );

    ExitCode::SUCCESS
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("backdrop").chain(args.iter().copied()))
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let cli = parse(&["in.jpg", "out.png"]).unwrap();
        let config = config_from_cli(&cli).unwrap();
        assert_eq!(config, RemovalConfig::default());
        assert!(!cli.json);
    }

    #[test]
    fn tolerance_and_background_flags() {
        let cli = parse(&[
            "in.jpg",
            "out.png",
            "--tolerance",
            "45",
            "--background-rgb",
            "240, 240, 240",
        ])
        .unwrap();
        let config = config_from_cli(&cli).unwrap();
        assert_eq!(config.tolerance, Tolerance::new(45));
        assert_eq!(config.background, Some(Rgb::new(240, 240, 240)));
    }

    #[test]
    fn tolerance_out_of_range_is_rejected() {
        assert!(parse(&["in.jpg", "out.png", "--tolerance", "256"]).is_err());
        assert!(parse(&["in.jpg", "out.png", "--tolerance", "-1"]).is_err());
    }

    #[test]
    fn malformed_background_is_rejected() {
        assert!(parse(&["in.jpg", "out.png", "--background-rgb", "1,2"]).is_err());
        assert!(parse(&["in.jpg", "out.png", "--background-rgb", "1,2,999"]).is_err());
    }

    #[test]
    fn config_json_overrides_flags() {
        let cli = parse(&[
            "in.jpg",
            "out.png",
            "--tolerance",
            "5",
            "--config-json",
            r#"{"tolerance": 60}"#,
        ])
        .unwrap();
        let config = config_from_cli(&cli).unwrap();
        assert_eq!(config.tolerance, Tolerance::new(60));
        assert_eq!(config.background, None);
    }

    #[test]
    fn bad_config_json_is_reported() {
        let cli = parse(&["in.jpg", "out.png", "--config-json", "{"]).unwrap();
        assert!(matches!(
            config_from_cli(&cli),
            Err(backdrop_pipeline::PipelineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn config_json_background_out_of_range_names_the_channel() {
        let cli = parse(&[
            "in.jpg",
            "out.png",
            "--config-json",
            r#"{"background": {"r": 300, "g": 0, "b": 0}}"#,
        ])
        .unwrap();
        let err = config_from_cli(&cli).unwrap_err().to_string();
        assert!(
            err.contains("red component must be between 0 and 255, got 300"),
            "unexpected message: {err}"
        );
    }

    #[test]
    fn write_output_creates_parent_directories() {
        let root = std::env::temp_dir().join(format!("backdrop-cli-{}", std::process::id()));
        let path = root.join("nested/dir/out.png");
        write_output(&path, b"png").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"png");
        std::fs::remove_dir_all(&root).unwrap();
    }
}
