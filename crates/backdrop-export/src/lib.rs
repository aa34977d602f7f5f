//! backdrop-export: Pure format serializers (sans-IO)
//!
//! Converts processed images into output formats. Currently supports PNG,
//! which keeps the alpha channel the pipeline writes.

pub mod png;

pub use png::{ExportError, to_png};
