//! Option types for a compression call.
//!
//! These structs describe *what* the caller wants, not *how* it is achieved.
//! They are the interface between the [`session`](crate::session) (which
//! decides when to compress) and a [`Compressor`](super::Compressor) (which
//! does the pixel work).
//!
//! ## Types
//!
//! - [`CompressionOptions`]: target size plus the optional knobs a compressor understands.
//! - [`QualityHint`]: lossy encoder quality (0–1). Clamped on construction.

use serde::{Deserialize, Serialize};

/// Encoder quality hint in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityHint(f32);

impl QualityHint {
    pub fn new(value: f32) -> Self {
        if value.is_nan() {
            return Self::default();
        }
        Self(value.clamp(0.0, 1.0))
    }

    pub fn value(self) -> f32 {
        self.0
    }

    /// Quality on the 1–100 scale used by the JPEG encoder.
    pub fn as_percent(self) -> u8 {
        ((self.0 * 100.0).round() as u8).max(1)
    }
}

impl Default for QualityHint {
    fn default() -> Self {
        Self(1.0)
    }
}

/// Options passed to a single compression call.
///
/// Only `max_size_mb` is required; every `None` means "compressor default".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressionOptions {
    /// Upper bound on the output size, in megabytes (1 MB = 1024 * 1024 bytes).
    pub max_size_mb: f64,
    /// Bound on the longer edge of the output, in pixels.
    pub max_width_or_height: Option<u32>,
    /// Allow the pixel work to run on a background worker thread.
    pub use_web_worker: Option<bool>,
    /// Cap on quality-search iterations.
    pub max_iteration: Option<u32>,
    /// EXIF orientation (1–8) that overrides whatever the file declares.
    pub exif_orientation: Option<u8>,
    /// Output MIME type, e.g. `image/webp`.
    pub file_type: Option<String>,
    pub quality: Option<QualityHint>,
}

impl CompressionOptions {
    pub fn new(max_size_mb: f64) -> Self {
        Self {
            max_size_mb,
            max_width_or_height: None,
            use_web_worker: None,
            max_iteration: None,
            exif_orientation: None,
            file_type: None,
            quality: None,
        }
    }

    pub fn with_max_width_or_height(mut self, px: u32) -> Self {
        self.max_width_or_height = Some(px);
        self
    }

    pub fn with_quality(mut self, quality: f32) -> Self {
        self.quality = Some(QualityHint::new(quality));
        self
    }

    pub fn with_file_type(mut self, mime: impl Into<String>) -> Self {
        self.file_type = Some(mime.into());
        self
    }

    pub fn with_web_worker(mut self, enabled: bool) -> Self {
        self.use_web_worker = Some(enabled);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_unit_range() {
        assert_eq!(QualityHint::new(-0.5).value(), 0.0);
        assert_eq!(QualityHint::new(0.42).value(), 0.42);
        assert_eq!(QualityHint::new(3.0).value(), 1.0);
    }

    #[test]
    fn quality_nan_falls_back_to_default() {
        assert_eq!(QualityHint::new(f32::NAN), QualityHint::default());
    }

    #[test]
    fn quality_percent_never_zero() {
        assert_eq!(QualityHint::new(0.0).as_percent(), 1);
        assert_eq!(QualityHint::new(0.8).as_percent(), 80);
        assert_eq!(QualityHint::default().as_percent(), 100);
    }

    #[test]
    fn builder_sets_optional_fields() {
        let opts = CompressionOptions::new(1.5)
            .with_max_width_or_height(1024)
            .with_quality(0.7)
            .with_file_type("image/webp")
            .with_web_worker(false);
        assert_eq!(opts.max_size_mb, 1.5);
        assert_eq!(opts.max_width_or_height, Some(1024));
        assert_eq!(opts.quality.map(QualityHint::value), Some(0.7));
        assert_eq!(opts.file_type.as_deref(), Some("image/webp"));
        assert_eq!(opts.use_web_worker, Some(false));
        assert_eq!(opts.max_iteration, None);
    }
}
