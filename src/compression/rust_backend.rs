//! Pure Rust compressor with no system libraries and no browser.
//!
//! ## Crate mapping
//!
//! | Step | Crate / function |
//! |---|---|
//! | Sniff input (JPEG, PNG, TIFF, WebP, GIF, BMP) | `image::guess_format` |
//! | Budget check from the header | `ImageReader::into_dimensions` |
//! | Decode + EXIF orientation | `ImageReader::into_decoder`, `ImageDecoder::orientation` |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Encode → JPEG | `JpegEncoder::new_with_quality` |
//! | Encode → PNG | `PngEncoder` (best compression, adaptive filter) |
//! | Encode → WebP | `WebPEncoder::new_lossless` (quality hint is ignored) |
//!
//! ## Size search
//!
//! After the first encode, while the output exceeds the byte budget and the
//! iteration cap is not reached, both dimensions (and, for JPEG, the quality)
//! are scaled by [`SHRINK_STEP`](super::calculations::SHRINK_STEP) and the
//! image is re-encoded. The cancel token is checked before each iteration.

use super::backend::{CancelToken, CompressError, Compressor};
use super::calculations::{fit_within, max_size_bytes, next_quality, shrink_dimensions};
use super::options::{CompressionOptions, QualityHint};
use crate::types::ImageFile;
use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{ColorType, DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use log::debug;
use std::io::Cursor;
use std::path::Path;

/// Iteration cap when the caller does not set one.
pub const DEFAULT_MAX_ITERATION: u32 = 10;

/// Formats the encoder side can produce. Anything else is written as PNG.
const ENCODABLE: &[ImageFormat] = &[ImageFormat::Jpeg, ImageFormat::Png, ImageFormat::WebP];

/// Pure Rust compressor using the `image` crate.
///
/// See the [module docs](self) for the crate-to-step mapping.
pub struct RustCompressor;

impl RustCompressor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustCompressor {
    fn default() -> Self {
        Self::new()
    }
}

/// Pick the output format: the requested MIME type if given, else the input's.
pub fn output_format(input: ImageFormat, requested: Option<&str>) -> ImageFormat {
    let wanted = requested
        .and_then(ImageFormat::from_mime_type)
        .unwrap_or(input);
    if ENCODABLE.contains(&wanted) {
        wanted
    } else {
        ImageFormat::Png
    }
}

/// Keep the file stem; swap the extension only when the format changed.
fn output_name(name: &str, format: ImageFormat, type_changed: bool) -> String {
    if !type_changed {
        return name.to_string();
    }
    let ext = format.extensions_str().first().copied().unwrap_or("img");
    Path::new(name).with_extension(ext).to_string_lossy().into_owned()
}

/// Width and height from the header alone, without decoding pixels.
fn read_dimensions(file: &ImageFile) -> Result<(u32, u32), CompressError> {
    let fail = |reason: String| CompressError::Decode {
        name: file.name.clone(),
        reason,
    };
    ImageReader::new(Cursor::new(file.bytes()))
        .with_guessed_format()
        .map_err(|e| fail(e.to_string()))?
        .into_dimensions()
        .map_err(|e| fail(e.to_string()))
}

/// Decode the file and bring it upright.
fn decode(file: &ImageFile, orientation_override: Option<u8>) -> Result<DynamicImage, CompressError> {
    let fail = |reason: String| CompressError::Decode {
        name: file.name.clone(),
        reason,
    };
    let reader = ImageReader::new(Cursor::new(file.bytes()))
        .with_guessed_format()
        .map_err(|e| fail(e.to_string()))?;
    let mut decoder = reader.into_decoder().map_err(|e| fail(e.to_string()))?;
    let declared = decoder.orientation().unwrap_or(Orientation::NoTransforms);
    let mut img = DynamicImage::from_decoder(decoder).map_err(|e| fail(e.to_string()))?;

    let orientation = orientation_override
        .and_then(Orientation::from_exif)
        .unwrap_or(declared);
    img.apply_orientation(orientation);
    Ok(img)
}

/// Encode to bytes in the given format.
fn encode(
    img: &DynamicImage,
    format: ImageFormat,
    quality: QualityHint,
) -> Result<Vec<u8>, CompressError> {
    let fail = |e: image::ImageError| CompressError::Encode {
        format: format!("{format:?}"),
        reason: e.to_string(),
    };
    let mut out = Vec::new();
    match format {
        ImageFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            let encoder = JpegEncoder::new_with_quality(&mut out, quality.as_percent());
            rgb.write_with_encoder(encoder).map_err(fail)?;
        }
        ImageFormat::WebP => {
            let rgba = DynamicImage::ImageRgba8(img.to_rgba8());
            rgba.write_with_encoder(WebPEncoder::new_lossless(&mut out))
                .map_err(fail)?;
        }
        _ => {
            let encoder =
                PngEncoder::new_with_quality(&mut out, CompressionType::Best, PngFilter::Adaptive);
            match img.color() {
                ColorType::Rgb32F | ColorType::Rgba32F => DynamicImage::ImageRgba8(img.to_rgba8())
                    .write_with_encoder(encoder)
                    .map_err(fail)?,
                _ => img.write_with_encoder(encoder).map_err(fail)?,
            }
        }
    }
    Ok(out)
}

/// The whole compression, synchronously. Runs on a blocking worker when
/// `use_web_worker` is on.
fn compress_blocking(
    file: ImageFile,
    options: &CompressionOptions,
    cancel: &CancelToken,
) -> Result<ImageFile, CompressError> {
    cancel.check()?;

    let input_format = image::guess_format(file.bytes())
        .map_err(|_| CompressError::UnsupportedType(file.mime_type.clone()))?;
    let target = output_format(input_format, options.file_type.as_deref());
    let type_changed = target != input_format;
    let max_bytes = max_size_bytes(options.max_size_mb);

    // rotation never changes the longer edge, so header dimensions decide the fit
    let fits = |dims: (u32, u32)| {
        options
            .max_width_or_height
            .is_none_or(|edge| fit_within(dims, edge) == dims)
    };
    if file.size() <= max_bytes
        && !type_changed
        && options.quality.is_none()
        && options.exif_orientation.is_none()
        && fits(read_dimensions(&file)?)
    {
        debug!("{} already within budget, returning it unchanged", file.name);
        return Ok(file);
    }

    let mut img = decode(&file, options.exif_orientation)?;
    let source_dims = (img.width(), img.height());
    let mut dims = options
        .max_width_or_height
        .map(|edge| fit_within(source_dims, edge))
        .unwrap_or(source_dims);
    let needs_resize = !fits(source_dims);

    if needs_resize {
        img = img.resize_exact(dims.0, dims.1, FilterType::Lanczos3);
    }
    let mut quality = options.quality.unwrap_or_default();
    let mut encoded = encode(&img, target, quality)?;

    let max_iteration = options.max_iteration.unwrap_or(DEFAULT_MAX_ITERATION);
    let mut iteration = 0;
    while encoded.len() as u64 > max_bytes && iteration < max_iteration {
        cancel.check()?;
        iteration += 1;
        dims = shrink_dimensions(dims);
        if target == ImageFormat::Jpeg {
            quality = QualityHint::new(next_quality(quality.value()));
        }
        let shrunk = img.resize_exact(dims.0, dims.1, FilterType::Lanczos3);
        encoded = encode(&shrunk, target, quality)?;
        debug!(
            "{}: iteration {iteration} → {}x{} q{:.2}, {} bytes",
            file.name,
            dims.0,
            dims.1,
            quality.value(),
            encoded.len()
        );
    }

    if !type_changed && encoded.len() as u64 > file.size() {
        debug!("{}: re-encode grew the file, keeping the source", file.name);
        return Ok(file);
    }

    Ok(ImageFile::new(
        output_name(&file.name, target, type_changed),
        target.to_mime_type(),
        encoded,
    ))
}

#[async_trait]
impl Compressor for RustCompressor {
    async fn compress(
        &self,
        file: ImageFile,
        options: CompressionOptions,
        cancel: CancelToken,
    ) -> Result<ImageFile, CompressError> {
        if options.use_web_worker.unwrap_or(true) {
            tokio::task::spawn_blocking(move || compress_blocking(file, &options, &cancel))
                .await
                .map_err(|e| CompressError::Worker(e.to_string()))?
        } else {
            compress_blocking(file, &options, &cancel)
        }
    }
}
