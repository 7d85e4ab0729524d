//! Host platform boundary: preview resources, downloads and user notices.
//!
//! A preview URL is a host-owned reference to an in-memory blob. The host
//! does not reclaim it on its own, so whoever creates one must revoke it.
//! The [`Platform`] trait keeps that boundary explicit; the workbench is the
//! only code that creates or revokes URLs.
//!
//! [`FsPlatform`] is the native host: previews are files in a private temp
//! directory (handed out as `file://` URLs), downloads are copies into a
//! download directory, and notices go to stderr.

use crate::types::ImageFile;
use log::{debug, warn};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tempfile::TempDir;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unknown preview URL: {0}")]
    UnknownUrl(String),
}

/// Opaque handle to a live preview resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PreviewUrl(String);

impl PreviewUrl {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PreviewUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything the workbench needs from its host.
pub trait Platform {
    /// Make `file` addressable as an image source.
    fn create_preview_url(&self, file: &ImageFile) -> Result<PreviewUrl, PlatformError>;

    /// Release a preview. Revoking an unknown or already revoked URL is a no-op.
    fn revoke_preview_url(&self, url: &PreviewUrl);

    /// Save the blob behind `url` under `file_name`. Returns where it went.
    fn download(&self, url: &PreviewUrl, file_name: &str) -> Result<String, PlatformError>;

    /// Blocking, user-visible notice.
    fn alert(&self, message: &str);
}

/// Native host backed by a temp directory.
pub struct FsPlatform {
    previews: TempDir,
    download_dir: PathBuf,
    next_id: AtomicU64,
    live: Mutex<HashMap<PreviewUrl, PathBuf>>,
}

impl FsPlatform {
    pub fn new(download_dir: impl Into<PathBuf>) -> Result<Self, PlatformError> {
        Ok(Self {
            previews: tempfile::Builder::new().prefix("imgshrink-").tempdir()?,
            download_dir: download_dir.into(),
            next_id: AtomicU64::new(1),
            live: Mutex::new(HashMap::new()),
        })
    }

    /// Directory holding live preview files.
    pub fn preview_dir(&self) -> &Path {
        self.previews.path()
    }

    /// Number of previews created and not yet revoked.
    pub fn live_previews(&self) -> usize {
        self.live.lock().map(|m| m.len()).unwrap_or(0)
    }

    fn path_for(&self, url: &PreviewUrl) -> Option<PathBuf> {
        self.live.lock().ok()?.get(url).cloned()
    }
}

impl Platform for FsPlatform {
    fn create_preview_url(&self, file: &ImageFile) -> Result<PreviewUrl, PlatformError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let ext = Path::new(&file.name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("bin");
        let path = self.previews.path().join(format!("preview-{id:04}.{ext}"));
        std::fs::write(&path, file.bytes())?;

        let url = PreviewUrl::new(format!("file://{}", path.display()));
        debug!("created preview {url}");
        if let Ok(mut live) = self.live.lock() {
            live.insert(url.clone(), path);
        }
        Ok(url)
    }

    fn revoke_preview_url(&self, url: &PreviewUrl) {
        let removed = self.live.lock().ok().and_then(|mut live| live.remove(url));
        if let Some(path) = removed {
            debug!("revoked preview {url}");
            if let Err(e) = std::fs::remove_file(&path) {
                warn!("could not delete preview {}: {e}", path.display());
            }
        }
    }

    fn download(&self, url: &PreviewUrl, file_name: &str) -> Result<String, PlatformError> {
        let source = self
            .path_for(url)
            .ok_or_else(|| PlatformError::UnknownUrl(url.to_string()))?;
        std::fs::create_dir_all(&self.download_dir)?;
        let target = self.download_dir.join(file_name);
        std::fs::copy(&source, &target)?;
        Ok(target.display().to_string())
    }

    fn alert(&self, message: &str) {
        eprintln!("! {message}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob(name: &str) -> ImageFile {
        ImageFile::new(name, "image/png", vec![1, 2, 3, 4])
    }

    #[test]
    fn create_writes_preview_file() {
        let downloads = TempDir::new().unwrap();
        let platform = FsPlatform::new(downloads.path()).unwrap();

        let url = platform.create_preview_url(&blob("cat.png")).unwrap();
        assert!(url.as_str().starts_with("file://"));
        assert!(url.as_str().ends_with(".png"));
        assert_eq!(platform.live_previews(), 1);

        let path = url.as_str().trim_start_matches("file://");
        assert_eq!(std::fs::read(path).unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn urls_are_unique_per_call() {
        let downloads = TempDir::new().unwrap();
        let platform = FsPlatform::new(downloads.path()).unwrap();
        let a = platform.create_preview_url(&blob("a.png")).unwrap();
        let b = platform.create_preview_url(&blob("a.png")).unwrap();
        assert_ne!(a, b);
        assert_eq!(platform.live_previews(), 2);
    }

    #[test]
    fn revoke_deletes_and_is_idempotent() {
        let downloads = TempDir::new().unwrap();
        let platform = FsPlatform::new(downloads.path()).unwrap();
        let url = platform.create_preview_url(&blob("a.png")).unwrap();
        let path = PathBuf::from(url.as_str().trim_start_matches("file://"));

        platform.revoke_preview_url(&url);
        assert!(!path.exists());
        assert_eq!(platform.live_previews(), 0);

        platform.revoke_preview_url(&url);
        platform.revoke_preview_url(&PreviewUrl::new("file:///never/made.png"));
        assert_eq!(platform.live_previews(), 0);
    }

    #[test]
    fn download_copies_into_download_dir() {
        let downloads = TempDir::new().unwrap();
        let target_dir = downloads.path().join("out");
        let platform = FsPlatform::new(&target_dir).unwrap();
        let url = platform.create_preview_url(&blob("a.png")).unwrap();

        let saved = platform.download(&url, "compressed_a.png").unwrap();
        assert_eq!(PathBuf::from(&saved), target_dir.join("compressed_a.png"));
        assert_eq!(std::fs::read(saved).unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn download_of_revoked_url_fails() {
        let downloads = TempDir::new().unwrap();
        let platform = FsPlatform::new(downloads.path()).unwrap();
        let url = platform.create_preview_url(&blob("a.png")).unwrap();
        platform.revoke_preview_url(&url);
        let err = platform.download(&url, "x.png").unwrap_err();
        assert!(matches!(err, PlatformError::UnknownUrl(_)));
    }
}
