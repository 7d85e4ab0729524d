//! Human-readable byte sizes.

const UNITS: &[&str] = &["Bytes", "KB", "MB", "GB"];

/// Format a byte count with base-1024 units.
///
/// Picks the largest unit that keeps the number at least 1 (capped at GB),
/// rounds to two decimals and drops trailing zeros.
///
/// ```
/// # use imgshrink::format::format_file_size;
/// assert_eq!(format_file_size(0), "0 Bytes");
/// assert_eq!(format_file_size(1536), "1.5 KB");
/// assert_eq!(format_file_size(1_048_576), "1 MB");
/// ```
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut unit = 0;
    let mut scale = 1u64;
    while unit + 1 < UNITS.len() && bytes >= scale * 1024 {
        scale *= 1024;
        unit += 1;
    }
    let mut value = ((bytes as f64 / scale as f64) * 100.0).round() / 100.0;
    // 1023.999 KB rounds up to 1024 KB; carry it into MB
    if value >= 1024.0 && unit + 1 < UNITS.len() {
        value = ((value / 1024.0) * 100.0).round() / 100.0;
        unit += 1;
    }
    format!("{} {}", value, UNITS[unit])
}

/// Format a 0–1 quality hint as a whole percentage.
pub fn format_quality(quality: f32) -> String {
    format!("{}%", (quality * 100.0).round() as i64)
}

/// Format a compression ratio, signed when the output grew.
pub fn format_ratio(ratio: f64) -> String {
    format!("{ratio:.2}%")
}
