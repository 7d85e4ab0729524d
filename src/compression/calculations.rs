//! Pure calculation functions for compression.
//!
//! All functions here are pure and testable without any I/O or images.

/// Factor applied to both dimensions and quality on every search iteration.
pub const SHRINK_STEP: f64 = 0.95;

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Percentage size reduction from `original` to `compressed` bytes.
///
/// Not clamped: an output larger than its source yields a negative ratio.
/// A zero-byte original has no meaningful reduction and yields `0.0`.
///
/// # Examples
/// ```
/// # use imgshrink::compression::compression_ratio;
/// assert_eq!(compression_ratio(5_000_000, 1_250_000), 75.0);
/// assert_eq!(compression_ratio(1000, 1500), -50.0);
/// ```
pub fn compression_ratio(original: u64, compressed: u64) -> f64 {
    if original == 0 {
        return 0.0;
    }
    let original = original as f64;
    round2((original - compressed as f64) / original * 100.0)
}

/// Convert a megabyte budget to bytes (1 MB = 1024 * 1024).
///
/// Non-finite or non-positive budgets mean "no size limit".
pub fn max_size_bytes(max_size_mb: f64) -> u64 {
    if !max_size_mb.is_finite() || max_size_mb <= 0.0 {
        return u64::MAX;
    }
    (max_size_mb * 1024.0 * 1024.0) as u64
}

/// Fit `(width, height)` so the longer edge is at most `max_edge`.
///
/// Returns the source dimensions unchanged when they already fit. Never
/// returns a zero dimension.
///
/// # Examples
/// ```
/// # use imgshrink::compression::fit_within;
/// assert_eq!(fit_within((4000, 3000), 1920), (1920, 1440));
/// assert_eq!(fit_within((800, 600), 1920), (800, 600));
/// ```
pub fn fit_within(source: (u32, u32), max_edge: u32) -> (u32, u32) {
    let (w, h) = source;
    let longer = w.max(h);
    if longer <= max_edge || max_edge == 0 {
        return source;
    }
    let ratio = max_edge as f64 / longer as f64;
    if w >= h {
        (max_edge, ((h as f64 * ratio).round() as u32).max(1))
    } else {
        (((w as f64 * ratio).round() as u32).max(1), max_edge)
    }
}

/// Shrink dimensions by one search step, keeping both at least 1px.
pub fn shrink_dimensions(dims: (u32, u32)) -> (u32, u32) {
    let (w, h) = dims;
    (
        ((w as f64 * SHRINK_STEP).round() as u32).max(1),
        ((h as f64 * SHRINK_STEP).round() as u32).max(1),
    )
}

/// Lower a quality hint by one search step.
pub fn next_quality(quality: f32) -> f32 {
    (quality as f64 * SHRINK_STEP) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // compression_ratio tests
    // =========================================================================

    #[test]
    fn ratio_quarter_size() {
        assert_eq!(compression_ratio(5_000_000, 1_250_000), 75.0);
    }

    #[test]
    fn ratio_rounds_to_two_decimals() {
        // (3 - 2) / 3 * 100 = 33.333...
        assert_eq!(compression_ratio(3, 2), 33.33);
        // (3 - 1) / 3 * 100 = 66.666...
        assert_eq!(compression_ratio(3, 1), 66.67);
    }

    #[test]
    fn ratio_negative_when_output_grew() {
        assert_eq!(compression_ratio(1000, 1500), -50.0);
    }

    #[test]
    fn ratio_zero_original_is_zero() {
        assert_eq!(compression_ratio(0, 10), 0.0);
    }

    #[test]
    fn ratio_identical_sizes_is_zero() {
        assert_eq!(compression_ratio(2048, 2048), 0.0);
    }

    // =========================================================================
    // max_size_bytes tests
    // =========================================================================

    #[test]
    fn max_size_uses_binary_megabytes() {
        assert_eq!(max_size_bytes(1.0), 1_048_576);
        assert_eq!(max_size_bytes(0.5), 524_288);
    }

    #[test]
    fn max_size_unbounded_for_invalid_budgets() {
        assert_eq!(max_size_bytes(f64::INFINITY), u64::MAX);
        assert_eq!(max_size_bytes(0.0), u64::MAX);
        assert_eq!(max_size_bytes(-1.0), u64::MAX);
    }

    // =========================================================================
    // fit_within tests
    // =========================================================================

    #[test]
    fn fit_landscape() {
        assert_eq!(fit_within((4000, 3000), 1920), (1920, 1440));
    }

    #[test]
    fn fit_portrait() {
        assert_eq!(fit_within((3000, 4000), 1000), (750, 1000));
    }

    #[test]
    fn fit_already_small_is_unchanged() {
        assert_eq!(fit_within((800, 600), 1920), (800, 600));
    }

    #[test]
    fn fit_extreme_aspect_never_zero() {
        assert_eq!(fit_within((10000, 1), 100), (100, 1));
    }

    // =========================================================================
    // search step tests
    // =========================================================================

    #[test]
    fn shrink_steps_five_percent() {
        assert_eq!(shrink_dimensions((1000, 800)), (950, 760));
    }

    #[test]
    fn shrink_keeps_one_pixel() {
        assert_eq!(shrink_dimensions((1, 1)), (1, 1));
    }

    #[test]
    fn quality_steps_down() {
        let q = next_quality(0.8);
        assert!((q - 0.76).abs() < 1e-6);
    }
}
