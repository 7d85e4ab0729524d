//! Image compression in pure Rust, behind a swappable trait.
//!
//! | Step | Crate / function |
//! |---|---|
//! | **Sniff** | `image::guess_format` |
//! | **Orientation** | decoder EXIF tag or explicit override, `apply_orientation` |
//! | **Resize** | Lanczos3 via `DynamicImage::resize_exact` |
//! | **Encode** | JPEG (quality), PNG, WebP (lossless) |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension, size and ratio math (unit testable)
//! - **Options**: [`CompressionOptions`] and the clamped [`QualityHint`]
//! - **Backend**: [`Compressor`] trait + [`CancelToken`] + [`CompressError`]
//! - **Rust backend**: [`RustCompressor`], the production implementation

pub mod backend;
mod calculations;
mod options;
pub mod rust_backend;

pub use backend::{CancelToken, CompressError, Compressor};
pub use calculations::{compression_ratio, fit_within, round2};
pub use options::{CompressionOptions, QualityHint};
pub use rust_backend::RustCompressor;
