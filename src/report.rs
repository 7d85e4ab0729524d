//! HTML rendering of the workbench panel.
//!
//! `compress --report <FILE>` writes a standalone page showing the drop
//! zone, the three range controls, before/after panels and a download link.
//! The page is a static snapshot: its controls show the values used. Preview
//! URLs die with the run, so [`write_report`] copies both images into a
//! `<stem>_files/` directory next to the page and points at those instead.
//!
//! Uses [maud](https://maud.lambda.xyz/) for compile-time HTML templating.

use crate::format::{format_file_size, format_quality, format_ratio};
use crate::preview::PreviewUrl;
use crate::types::ImageFile;
use crate::workbench::{Controls, DIMENSION_RANGE, QUALITY_RANGE, SIZE_MB_RANGE, WorkbenchView};
use maud::{DOCTYPE, Markup, html};
use std::path::Path;

const CSS: &str = include_str!("../static/report.css");

fn base_document(title: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style { (CSS) }
            }
            body {
                (content)
            }
        }
    }
}

fn drop_zone(drag_active: bool) -> Markup {
    html! {
        div.drop-zone.drag-active[drag_active] {
            p { "Drag and drop an image here, or click to choose one" }
            input type="file" accept="image/*" hidden;
        }
    }
}

fn render_controls(controls: &Controls) -> Markup {
    let (size_min, size_max, size_step) = SIZE_MB_RANGE;
    let (dim_min, dim_max, dim_step) = DIMENSION_RANGE;
    let (q_min, q_max, q_step) = QUALITY_RANGE;
    html! {
        section.controls {
            label {
                "Max size: " (controls.max_size_mb()) " MB"
                input type="range" name="max_size_mb"
                    min=(size_min) max=(size_max) step=(size_step)
                    value=(controls.max_size_mb());
            }
            label {
                "Max dimension: " (controls.max_dimension()) "px"
                input type="range" name="max_dimension"
                    min=(dim_min) max=(dim_max) step=(dim_step)
                    value=(controls.max_dimension());
            }
            label {
                "Quality: " (format_quality(controls.quality()))
                input type="range" name="quality"
                    min=(q_min) max=(q_max) step=(q_step)
                    value=(controls.quality());
            }
        }
    }
}

fn file_panel(heading: &str, file: &ImageFile, src: &str, extra: Markup) -> Markup {
    html! {
        div.panel {
            h2 { (heading) }
            img src=(src) alt=(file.name);
            dl {
                dt { "Name" } dd { (file.name) }
                dt { "Size" } dd { (format_file_size(file.size())) }
                (extra)
            }
        }
    }
}

/// The full page for one workbench snapshot.
pub fn render_report(view: &WorkbenchView) -> Markup {
    let state = &view.state;
    let original = state
        .original_image
        .as_ref()
        .zip(view.original_preview.as_ref());
    let compressed = state
        .compressed_image
        .as_ref()
        .zip(view.compressed_preview.as_ref());

    let content = html! {
        h1 { "Image Compressor" }
        (drop_zone(view.drag_active))
        (render_controls(&view.controls))
        @if !state.error_message.is_empty() {
            p.error role="alert" { (state.error_message) }
        }
        section.panels {
            @if let Some((file, url)) = original {
                (file_panel("Original", file, url.as_str(), html! {}))
            }
            @if state.is_compressing {
                div.panel { p { "Compressing..." } }
            } @else if let Some((file, url)) = compressed {
                (file_panel("Compressed", file, url.as_str(), html! {
                    dt { "Reduced by" } dd { (format_ratio(state.compression_ratio)) }
                }))
            }
        }
        @if let (Some((_, url)), Some(name)) = (compressed, &view.download_name) {
            @if !state.is_compressing {
                a.download href=(url.as_str()) download=(name) { "Download " (name) }
            }
        }
    };
    base_document("Image Compressor", content)
}

/// Copy `file` into the assets directory and return its page-relative link.
fn write_asset(
    dir: &Path,
    assets: &str,
    prefix: &str,
    file: &ImageFile,
) -> std::io::Result<PreviewUrl> {
    let name = format!("{prefix}-{}", file.name);
    std::fs::create_dir_all(dir.join(assets))?;
    std::fs::write(dir.join(assets).join(&name), file.bytes())?;
    Ok(PreviewUrl::new(format!("{assets}/{name}")))
}

/// Render the page to `path`, with its images alongside.
pub fn write_report(view: &WorkbenchView, path: &Path) -> std::io::Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    std::fs::create_dir_all(dir)?;
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "report".to_string());
    let assets = format!("{stem}_files");

    let mut snapshot = view.clone();
    if let (Some(file), Some(_)) = (&view.state.original_image, &view.original_preview) {
        snapshot.original_preview = Some(write_asset(dir, &assets, "original", file)?);
    }
    if let (Some(file), Some(_)) = (&view.state.compressed_image, &view.compressed_preview) {
        snapshot.compressed_preview = Some(write_asset(dir, &assets, "compressed", file)?);
    }
    std::fs::write(path, render_report(&snapshot).into_string())
}
