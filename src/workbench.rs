//! The intake and presentation component.
//!
//! A [`Workbench`] takes a candidate image from the user (picker or drop),
//! owns the preview resources for it, drives a [`CompressionSession`] and
//! hands the result to the host for download.
//!
//! ## Stages
//!
//! ```text
//! Idle ──accept──▶ HasOriginal ──compress ok──▶ HasResult
//!                     ▲    ▲                      │   │
//!                     │    └───── accept ─────────┘   │ recompress ok
//!                     └─ compress failed (stays) ◀────┘ (stays)
//! ```
//!
//! A failure never returns to `Idle`; the session's error message is an
//! overlay on whatever stage is current.
//!
//! ## Preview discipline
//!
//! At most one original and one compressed preview are alive. Accepting a
//! file revokes both before creating the new original preview; a successful
//! (re)compression revokes the old compressed preview before creating the
//! new one; dropping the workbench revokes whatever is left.
//!
//! Methods that compress take `&mut self`, so one workbench can never run
//! two compressions at once. The session's own in-flight guard covers
//! sessions shared some other way.

use crate::compression::{CompressionOptions, Compressor, QualityHint};
use crate::dragdrop::{DragEvent, DropSubscription, DropSurface};
use crate::intake;
use crate::preview::{Platform, PlatformError, PreviewUrl};
use crate::session::{CancelHandle, CompressionSession, SessionError, SessionState};
use crate::types::ImageFile;
use log::{debug, info, warn};
use serde::Serialize;
use thiserror::Error;

/// Prefix put in front of the original name when downloading a result.
pub const DOWNLOAD_PREFIX: &str = "compressed_";

#[derive(Error, Debug)]
pub enum WorkbenchError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Idle,
    HasOriginal,
    HasResult,
}

/// What happened to a picked or dropped item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intake {
    /// Not an image; the user was told and nothing changed.
    Rejected,
    /// Accepted and compressed.
    Accepted,
}

/// Range control bounds: (min, max, step).
pub const SIZE_MB_RANGE: (f64, f64, f64) = (0.1, 10.0, 0.1);
pub const DIMENSION_RANGE: (u32, u32, u32) = (100, 4096, 1);
pub const QUALITY_RANGE: (f32, f32, f32) = (0.1, 1.0, 0.05);

fn snap(value: f64, (min, max, step): (f64, f64, f64)) -> f64 {
    let snapped = ((value - min) / step).round() * step + min;
    // drop float noise such as 1.2000000000000002
    (snapped.clamp(min, max) * 1000.0).round() / 1000.0
}

/// Values of the three range controls.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Controls {
    max_size_mb: f64,
    max_dimension: u32,
    quality: f32,
}

impl Controls {
    pub fn new(max_size_mb: f64, max_dimension: u32, quality: f32) -> Self {
        let mut controls = Self::default();
        controls.set_max_size_mb(max_size_mb);
        controls.set_max_dimension(max_dimension);
        controls.set_quality(quality);
        controls
    }

    pub fn max_size_mb(&self) -> f64 {
        self.max_size_mb
    }

    pub fn max_dimension(&self) -> u32 {
        self.max_dimension
    }

    pub fn quality(&self) -> f32 {
        self.quality
    }

    pub fn set_max_size_mb(&mut self, mb: f64) {
        if mb.is_finite() {
            self.max_size_mb = snap(mb, SIZE_MB_RANGE);
        }
    }

    pub fn set_max_dimension(&mut self, px: u32) {
        let (min, max, _) = DIMENSION_RANGE;
        self.max_dimension = px.clamp(min, max);
    }

    pub fn set_quality(&mut self, quality: f32) {
        if quality.is_finite() {
            let (min, max, step) = QUALITY_RANGE;
            self.quality = snap(quality as f64, (min as f64, max as f64, step as f64)) as f32;
        }
    }
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            max_size_mb: 1.0,
            max_dimension: 1920,
            quality: 0.8,
        }
    }
}

/// Everything a renderer needs, detached from the workbench.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkbenchView {
    pub stage: Stage,
    pub state: SessionState,
    pub controls: Controls,
    pub original_preview: Option<PreviewUrl>,
    pub compressed_preview: Option<PreviewUrl>,
    pub download_name: Option<String>,
    pub drag_active: bool,
}

/// Picker/drop intake, preview lifecycle and download around one session.
pub struct Workbench<C: Compressor, P: Platform> {
    session: CompressionSession<C>,
    platform: P,
    controls: Controls,
    /// Options the controls do not cover (worker use, iteration cap, output type).
    base_options: CompressionOptions,
    download_prefix: String,
    original: Option<ImageFile>,
    original_preview: Option<PreviewUrl>,
    compressed_preview: Option<PreviewUrl>,
    drag_active: bool,
    subscription: Option<DropSubscription>,
}

impl<C: Compressor, P: Platform> Workbench<C, P> {
    pub fn new(compressor: C, platform: P) -> Self {
        Self {
            session: CompressionSession::new(compressor),
            platform,
            controls: Controls::default(),
            base_options: CompressionOptions::new(Controls::default().max_size_mb),
            download_prefix: DOWNLOAD_PREFIX.to_string(),
            original: None,
            original_preview: None,
            compressed_preview: None,
            drag_active: false,
            subscription: None,
        }
    }

    pub fn with_controls(mut self, controls: Controls) -> Self {
        self.controls = controls;
        self
    }

    pub fn with_base_options(mut self, options: CompressionOptions) -> Self {
        self.base_options = options;
        self
    }

    pub fn with_download_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.download_prefix = prefix.into();
        self
    }

    // ------------------------------------------------------------------
    // Observable state
    // ------------------------------------------------------------------

    pub fn stage(&self) -> Stage {
        match (&self.original, &self.compressed_preview) {
            (None, _) => Stage::Idle,
            (Some(_), None) => Stage::HasOriginal,
            (Some(_), Some(_)) => Stage::HasResult,
        }
    }

    pub fn session(&self) -> &CompressionSession<C> {
        &self.session
    }

    pub fn snapshot(&self) -> SessionState {
        self.session.snapshot()
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn controls(&self) -> &Controls {
        &self.controls
    }

    pub fn controls_mut(&mut self) -> &mut Controls {
        &mut self.controls
    }

    /// The file currently shown as "before".
    pub fn original(&self) -> Option<&ImageFile> {
        self.original.as_ref()
    }

    pub fn original_preview(&self) -> Option<&PreviewUrl> {
        self.original_preview.as_ref()
    }

    pub fn compressed_preview(&self) -> Option<&PreviewUrl> {
        self.compressed_preview.as_ref()
    }

    /// Purely visual; never affects whether a drop is accepted.
    pub fn drag_active(&self) -> bool {
        self.drag_active
    }

    /// Options for the next compression: base options plus the controls.
    pub fn options(&self) -> CompressionOptions {
        CompressionOptions {
            max_size_mb: self.controls.max_size_mb,
            max_width_or_height: Some(self.controls.max_dimension),
            quality: Some(QualityHint::new(self.controls.quality)),
            ..self.base_options.clone()
        }
    }

    pub fn view(&self) -> WorkbenchView {
        WorkbenchView {
            stage: self.stage(),
            state: self.snapshot(),
            controls: self.controls,
            original_preview: self.original_preview.clone(),
            compressed_preview: self.compressed_preview.clone(),
            download_name: self.download_name(),
            drag_active: self.drag_active,
        }
    }

    /// Name a download of the current result gets.
    pub fn download_name(&self) -> Option<String> {
        self.original
            .as_ref()
            .map(|f| format!("{}{}", self.download_prefix, f.name))
    }

    // ------------------------------------------------------------------
    // Intake
    // ------------------------------------------------------------------

    /// Take a file from the picker. Valid images are compressed right away.
    pub async fn select_file(&mut self, file: ImageFile) -> Result<Intake, WorkbenchError> {
        if let Err(e) = intake::validate(&file) {
            info!("rejected {}: {e}", file.name);
            self.platform
                .alert(&format!("{} is not an image file. Please choose an image.", file.name));
            return Ok(Intake::Rejected);
        }

        self.release_previews();
        let url = match self.platform.create_preview_url(&file) {
            Ok(url) => url,
            Err(e) => {
                // previous previews are already revoked; fall back to Idle
                warn!("no preview for {}: {e}", file.name);
                self.session.reset();
                self.original = None;
                return Err(e.into());
            }
        };
        self.original_preview = Some(url);
        self.original = Some(file.clone());
        debug!("accepted {}", file.name);

        self.run_compression(file).await?;
        Ok(Intake::Accepted)
    }

    /// Compress the current original again with the current controls.
    ///
    /// Does nothing when no file has been accepted.
    pub async fn recompress(&mut self) -> Result<(), WorkbenchError> {
        match self.original.clone() {
            Some(file) => self.run_compression(file).await,
            None => Ok(()),
        }
    }

    async fn run_compression(&mut self, file: ImageFile) -> Result<(), WorkbenchError> {
        let compressed = self.session.compress(file, self.options()).await?;
        if let Some(url) = self.compressed_preview.take() {
            self.platform.revoke_preview_url(&url);
        }
        match self.platform.create_preview_url(&compressed) {
            Ok(url) => {
                self.compressed_preview = Some(url);
                Ok(())
            }
            Err(e) => {
                let err = WorkbenchError::from(e);
                warn!("no preview for compressed {}: {err}", compressed.name);
                self.session.discard_result(&err.to_string());
                Err(err)
            }
        }
    }

    /// Hand the current result to the host as a download.
    ///
    /// Returns where it was saved, or `None` (without touching the host)
    /// when there is no result.
    pub fn download(&self) -> Result<Option<String>, WorkbenchError> {
        let (Some(url), Some(name)) = (&self.compressed_preview, self.download_name()) else {
            return Ok(None);
        };
        if self.session.snapshot().compressed_image.is_none() {
            return Ok(None);
        }
        let saved = self.platform.download(url, &name)?;
        info!("downloaded {name} to {saved}");
        Ok(Some(saved))
    }

    /// Signal the in-flight compression, if any, to stop.
    pub fn cancel(&self) -> bool {
        self.session.cancel()
    }

    /// A cancel switch usable while a compressing method holds `&mut self`.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.session.cancel_handle()
    }

    /// Back to `Idle`: clears the session and releases every preview.
    pub fn reset(&mut self) {
        self.session.reset();
        self.release_previews();
        self.original = None;
    }

    fn release_previews(&mut self) {
        for url in [self.original_preview.take(), self.compressed_preview.take()]
            .into_iter()
            .flatten()
        {
            self.platform.revoke_preview_url(&url);
        }
    }

    // ------------------------------------------------------------------
    // Drag and drop
    // ------------------------------------------------------------------

    /// Start listening to `surface`. Replaces any previous subscription.
    pub fn activate(&mut self, surface: &DropSurface) {
        self.subscription = Some(surface.subscribe());
    }

    /// Stop listening. Also happens when the workbench is dropped.
    pub fn deactivate(&mut self) {
        self.subscription = None;
    }

    pub fn is_active(&self) -> bool {
        self.subscription.is_some()
    }

    /// React to one drag event. Drops go through the picker path.
    pub async fn handle_drag(&mut self, event: DragEvent) -> Result<Option<Intake>, WorkbenchError> {
        match event {
            DragEvent::Enter | DragEvent::Over => {
                self.drag_active = true;
                Ok(None)
            }
            DragEvent::Leave => {
                self.drag_active = false;
                Ok(None)
            }
            DragEvent::Drop(files) => {
                self.drag_active = false;
                match files.into_iter().next() {
                    Some(file) => self.select_file(file).await.map(Some),
                    None => Ok(None),
                }
            }
        }
    }

    /// Handle every event already delivered to the subscription.
    ///
    /// Stops at the first error; later events stay queued.
    pub async fn process_pending(&mut self) -> Result<Vec<Intake>, WorkbenchError> {
        let mut outcomes = Vec::new();
        while let Some(event) = self.subscription.as_mut().and_then(|s| s.try_recv()) {
            if let Some(outcome) = self.handle_drag(event).await? {
                outcomes.push(outcome);
            }
        }
        Ok(outcomes)
    }
}

impl<C: Compressor, P: Platform> Drop for Workbench<C, P> {
    fn drop(&mut self) {
        self.release_previews();
    }
}
