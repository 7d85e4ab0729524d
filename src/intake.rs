//! Turning user-picked files into [`ImageFile`]s.
//!
//! A picked or dropped path is read into memory and given a MIME type the
//! way a browser would give a `File` one: content sniffing first (`infer`),
//! then the file extension. Acceptance is a separate, pure step
//! ([`validate`]) so the workbench can reject a file before any preview
//! resource exists.

use crate::types::ImageFile;
use std::path::Path;
use thiserror::Error;

/// MIME type for content nothing recognizes.
pub const UNKNOWN_MIME: &str = "application/octet-stream";

#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("{name} is not an image ({mime_type})")]
    NotAnImage { name: String, mime_type: String },
}

/// Extension → MIME fallback for content `infer` does not recognize.
const EXTENSION_TYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("webp", "image/webp"),
    ("gif", "image/gif"),
    ("bmp", "image/bmp"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
    ("svg", "image/svg+xml"),
    ("txt", "text/plain"),
    ("md", "text/markdown"),
    ("html", "text/html"),
    ("json", "application/json"),
    ("pdf", "application/pdf"),
];

/// Best-effort MIME type for a named blob.
pub fn detect_mime_type(name: &str, bytes: &[u8]) -> String {
    if let Some(kind) = infer::get(bytes) {
        return kind.mime_type().to_string();
    }
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    ext.and_then(|ext| {
        EXTENSION_TYPES
            .iter()
            .find(|(known, _)| *known == ext)
            .map(|(_, mime)| mime.to_string())
    })
    .unwrap_or_else(|| UNKNOWN_MIME.to_string())
}

/// Read a file from disk as an [`ImageFile`] (not yet validated).
pub fn read_file(path: &Path) -> Result<ImageFile, IntakeError> {
    let bytes = std::fs::read(path).map_err(|source| IntakeError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let mime_type = detect_mime_type(&name, &bytes);
    Ok(ImageFile::new(name, mime_type, bytes))
}

/// Accept only files whose MIME type starts with `image/`.
pub fn validate(file: &ImageFile) -> Result<(), IntakeError> {
    if file.is_image() {
        Ok(())
    } else {
        Err(IntakeError::NotAnImage {
            name: file.name.clone(),
            mime_type: file.mime_type.clone(),
        })
    }
}

/// Strip the quoting terminals add when a file is dragged onto them.
///
/// ```text
/// '/home/me/My Photo.jpg'   →  /home/me/My Photo.jpg
/// /home/me/My\ Photo.jpg    →  /home/me/My Photo.jpg
/// file:///home/me/cat.png   →  /home/me/cat.png
/// ```
pub fn parse_dropped_path(raw: &str) -> String {
    let trimmed = raw.trim();
    let unquoted = ['\'', '"']
        .iter()
        .find_map(|q| {
            trimmed
                .strip_prefix(*q)
                .and_then(|s| s.strip_suffix(*q))
        })
        .unwrap_or(trimmed);
    let path = unquoted.strip_prefix("file://").unwrap_or(unquoted);
    path.replace("\\ ", " ")
}
