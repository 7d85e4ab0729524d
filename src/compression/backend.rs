//! Compressor trait and shared types.
//!
//! The [`Compressor`] trait is the boundary to whatever actually shrinks an
//! image. The session treats it as an opaque async capability: hand it a
//! file and options, get back a (usually) smaller file or a failure with a
//! human-readable description.
//!
//! The production implementation is
//! [`RustCompressor`](super::rust_backend::RustCompressor), in pure Rust,
//! built on the `image` crate.

use super::options::CompressionOptions;
use crate::types::ImageFile;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompressError {
    #[error("Unsupported image type: {0}")]
    UnsupportedType(String),
    #[error("Failed to decode {name}: {reason}")]
    Decode { name: String, reason: String },
    #[error("Failed to encode {format}: {reason}")]
    Encode { format: String, reason: String },
    #[error("Compression was cancelled")]
    Cancelled,
    #[error("Compression worker failed: {0}")]
    Worker(String),
    /// Failure reported by a compressor with whatever description it has,
    /// possibly none.
    #[error("{0}")]
    Other(String),
}

/// Cooperative cancellation signal shared between a caller and a compressor.
///
/// Compressors check it between units of work; nothing is interrupted
/// preemptively.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once the token has fired.
    pub fn check(&self) -> Result<(), CompressError> {
        if self.is_cancelled() {
            Err(CompressError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Trait for image compressors.
///
/// Implementations must be shareable across tasks: the session holds one in
/// an `Arc` and may hand it to a blocking worker.
#[async_trait]
pub trait Compressor: Send + Sync {
    /// Compress `file` according to `options`.
    ///
    /// Returns the compressed file; its size may exceed the source if the
    /// options force a re-encode.
    async fn compress(
        &self,
        file: ImageFile,
        options: CompressionOptions,
        cancel: CancelToken,
    ) -> Result<ImageFile, CompressError>;
}
