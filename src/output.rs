//! Terminal rendering of the workbench.
//!
//! # Output Format
//!
//! ```text
//! Original: holiday.jpg
//!     Size: 3.2 MB
//!     Preview: file:///tmp/imgshrink-x/preview-0001.jpg
//! Compressed: holiday.jpg
//!     Size: 812.4 KB
//!     Reduced by: 75.21%
//!     Preview: file:///tmp/imgshrink-x/preview-0002.jpg
//!     Download: compressed_holiday.jpg
//! Settings
//!     Max size: 1 MB
//!     Max dimension: 1920px
//!     Quality: 80%
//! ```
//!
//! While a compression runs the compressed block is replaced by
//! `Compressing...`; a failure adds an `Error:` banner above the settings.
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure.

use crate::format::{format_file_size, format_quality, format_ratio};
use crate::types::ImageFile;
use crate::workbench::{Controls, Intake, Stage, WorkbenchView};

const IDLE_HINT: &str = "Drop an image here or type its path";

fn indent(line: impl AsRef<str>) -> String {
    format!("    {}", line.as_ref())
}

fn file_block(label: &str, file: &ImageFile) -> Vec<String> {
    vec![
        format!("{label}: {}", file.name),
        indent(format!("Size: {}", format_file_size(file.size()))),
    ]
}

/// The three range controls.
pub fn format_controls(controls: &Controls) -> Vec<String> {
    vec![
        "Settings".to_string(),
        indent(format!("Max size: {} MB", controls.max_size_mb())),
        indent(format!("Max dimension: {}px", controls.max_dimension())),
        indent(format!("Quality: {}", format_quality(controls.quality()))),
    ]
}

/// Before/after panels, error banner and settings.
pub fn format_panel(view: &WorkbenchView) -> Vec<String> {
    let mut lines = Vec::new();
    let state = &view.state;

    if view.drag_active {
        lines.push("Release to drop".to_string());
    }

    match (&view.stage, &state.original_image) {
        (Stage::Idle, _) | (_, None) => lines.push(IDLE_HINT.to_string()),
        (_, Some(original)) => {
            lines.extend(file_block("Original", original));
            if let Some(url) = &view.original_preview {
                lines.push(indent(format!("Preview: {url}")));
            }
        }
    }

    if state.is_compressing {
        lines.push("Compressing...".to_string());
    } else if let (Some(compressed), Some(url)) = (&state.compressed_image, &view.compressed_preview) {
        lines.extend(file_block("Compressed", compressed));
        lines.push(indent(format!(
            "Reduced by: {}",
            format_ratio(state.compression_ratio)
        )));
        lines.push(indent(format!("Preview: {url}")));
        if let Some(name) = &view.download_name {
            lines.push(indent(format!("Download: {name}")));
        }
    }

    if !state.error_message.is_empty() {
        lines.push(format!("Error: {}", state.error_message));
    }

    lines.extend(format_controls(&view.controls));
    lines
}

pub fn print_panel(view: &WorkbenchView) {
    for line in format_panel(view) {
        println!("{line}");
    }
}

/// One line per handled pick or drop.
pub fn format_intake(name: &str, outcome: Intake) -> String {
    match outcome {
        Intake::Accepted => format!("Accepted {name}"),
        Intake::Rejected => format!("Rejected {name}"),
    }
}

/// Commands understood by the interactive session.
pub fn format_session_help() -> Vec<String> {
    [
        "Commands",
        "    <path>            drop a file (quotes and file:// are fine)",
        "    size <mb>         max output size, 0.1-10",
        "    dimension <px>    longest edge, 100-4096",
        "    quality <0-1>     encoder quality hint",
        "    recompress        compress again with the current settings",
        "    download          save the result",
        "    cancel            stop the running compression",
        "    reset             clear everything",
        "    status            show the panels",
        "    quit",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

pub fn print_session_help() {
    for line in format_session_help() {
        println!("{line}");
    }
}
