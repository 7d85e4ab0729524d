//! Shared test utilities for the imgshrink test suite.
//!
//! Provides synthetic image fixtures and a [`RecordingPlatform`] that logs
//! every host call, so workbench tests can assert on preview lifecycles
//! without touching the filesystem.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let platform = RecordingPlatform::new();
//! let mut bench = Workbench::new(MockCompressor::new(), platform);
//! bench.select_file(image_file("cat.jpg", 1000)).await.unwrap();
//!
//! assert_eq!(bench.platform().live_count(), 2);
//! assert!(bench.platform().max_live() <= 2);
//! ```

use crate::preview::{Platform, PlatformError, PreviewUrl};
use crate::types::ImageFile;
use image::{ImageEncoder, RgbImage};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

// =========================================================================
// Image fixtures
// =========================================================================

fn encode_jpeg(name: &str, img: &RgbImage, quality: u8) -> ImageFile {
    let mut bytes = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut bytes, quality)
        .write_image(
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgb8,
        )
        .unwrap();
    ImageFile::new(name, "image/jpeg", bytes)
}

/// A smooth gradient JPEG. Compresses well.
pub fn gradient_jpeg(name: &str, width: u32, height: u32) -> ImageFile {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    encode_jpeg(name, &img, 90)
}

/// Deterministic noise JPEG. Compresses badly, so it exercises size search.
pub fn noise_jpeg(name: &str, width: u32, height: u32) -> ImageFile {
    let mut seed: u32 = 0x2545_f491;
    let mut next = move || {
        seed ^= seed << 13;
        seed ^= seed >> 17;
        seed ^= seed << 5;
        (seed & 0xff) as u8
    };
    let img = RgbImage::from_fn(width, height, |_, _| image::Rgb([next(), next(), next()]));
    encode_jpeg(name, &img, 95)
}

/// An `image/jpeg` blob of `size` filler bytes (for mock compressors).
pub fn image_file(name: &str, size: usize) -> ImageFile {
    ImageFile::new(name, "image/jpeg", vec![0xAB; size])
}

pub fn text_file(name: &str) -> ImageFile {
    ImageFile::new(name, "text/plain", b"not a picture".to_vec())
}

// =========================================================================
// Recording platform
// =========================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum PlatformOp {
    /// Preview created for the file with this name.
    Create(String),
    Revoke(PreviewUrl),
    Download(PreviewUrl, String),
    Alert(String),
}

#[derive(Default)]
pub struct PlatformLog {
    ops: Vec<PlatformOp>,
    live: HashSet<PreviewUrl>,
    max_live: usize,
    next_id: u32,
    fail_next_create: Option<String>,
}

/// Host stand-in that records calls and tracks live previews.
#[derive(Default)]
pub struct RecordingPlatform {
    log: Arc<Mutex<PlatformLog>>,
}

impl RecordingPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle that survives the platform being dropped with its owner.
    pub fn shared_log(&self) -> Arc<Mutex<PlatformLog>> {
        Arc::clone(&self.log)
    }

    pub fn live_in(log: &Arc<Mutex<PlatformLog>>) -> usize {
        log.lock().unwrap().live.len()
    }

    pub fn ops(&self) -> Vec<PlatformOp> {
        self.log.lock().unwrap().ops.clone()
    }

    pub fn live_count(&self) -> usize {
        Self::live_in(&self.log)
    }

    /// Highest number of simultaneously live previews seen.
    pub fn max_live(&self) -> usize {
        self.log.lock().unwrap().max_live
    }

    /// Make the next `create_preview_url` fail with an IO error.
    pub fn fail_next_create(&self, reason: &str) {
        self.log.lock().unwrap().fail_next_create = Some(reason.to_string());
    }

    pub fn created_count(&self) -> usize {
        self.ops()
            .iter()
            .filter(|op| matches!(op, PlatformOp::Create(_)))
            .count()
    }
}

impl Platform for RecordingPlatform {
    fn create_preview_url(&self, file: &ImageFile) -> Result<PreviewUrl, PlatformError> {
        let mut log = self.log.lock().unwrap();
        if let Some(reason) = log.fail_next_create.take() {
            return Err(PlatformError::Io(std::io::Error::other(reason)));
        }
        log.next_id += 1;
        let url = PreviewUrl::new(format!("blob:test/{}", log.next_id));
        log.ops.push(PlatformOp::Create(file.name.clone()));
        log.live.insert(url.clone());
        log.max_live = log.max_live.max(log.live.len());
        Ok(url)
    }

    fn revoke_preview_url(&self, url: &PreviewUrl) {
        let mut log = self.log.lock().unwrap();
        log.ops.push(PlatformOp::Revoke(url.clone()));
        log.live.remove(url);
    }

    fn download(&self, url: &PreviewUrl, file_name: &str) -> Result<String, PlatformError> {
        let mut log = self.log.lock().unwrap();
        if !log.live.contains(url) {
            return Err(PlatformError::UnknownUrl(url.to_string()));
        }
        log.ops
            .push(PlatformOp::Download(url.clone(), file_name.to_string()));
        Ok(file_name.to_string())
    }

    fn alert(&self, message: &str) {
        self.log
            .lock()
            .unwrap()
            .ops
            .push(PlatformOp::Alert(message.to_string()));
    }
}
