//! Compression session: the observable state around one compressor call.
//!
//! A [`CompressionSession`] owns five observable fields ([`SessionState`])
//! and mediates calls to a [`Compressor`]:
//!
//! ```text
//! compress(file, options)
//!   acquire in-flight slot      (reject with Busy if taken)
//!   is_compressing = true
//!   error_message  = ""
//!   original_image = file
//!   await compressor
//!     ok  → compression_ratio, compressed_image
//!     err → error_message
//!   is_compressing = false      (guard drop, every exit path)
//! ```
//!
//! ## Overlapping calls
//!
//! Only one compression may be outstanding per session. A second call while
//! one is in flight fails immediately with [`SessionError::Busy`] and leaves
//! the state untouched; the first call carries on.
//!
//! ## Reset and cancellation
//!
//! [`reset`](CompressionSession::reset) clears the observable fields but does
//! not stop an in-flight call: when that call settles it still writes its
//! result. [`cancel`](CompressionSession::cancel) is the only way to stop one.
//!
//! State lives behind a `std::sync::Mutex` that is never held across an
//! `.await`, so `reset`, `cancel` and `snapshot` can run while a compression
//! is suspended.

use crate::compression::{CancelToken, CompressError, CompressionOptions, Compressor, compression_ratio};
use crate::types::ImageFile;
use log::{debug, info, warn};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Shown when a failure carries no description of its own.
pub const GENERIC_FAILURE: &str = "Compression failed";

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("A compression is already in progress")]
    Busy,
    #[error(transparent)]
    Compression(#[from] CompressError),
}

/// The observable fields of a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionState {
    /// File passed to the most recent `compress` call.
    pub original_image: Option<ImageFile>,
    /// Output of the most recent successful compression.
    pub compressed_image: Option<ImageFile>,
    /// True while a compression is in flight.
    pub is_compressing: bool,
    /// Percentage size reduction of the last success. Kept after a failure.
    pub compression_ratio: f64,
    /// Description of the last failure; empty when the last call succeeded.
    pub error_message: String,
}

/// Wraps a [`Compressor`] and exposes its lifecycle as [`SessionState`].
pub struct CompressionSession<C: Compressor> {
    compressor: Arc<C>,
    state: Mutex<SessionState>,
    in_flight: AtomicBool,
    cancel: Arc<Mutex<Option<CancelToken>>>,
}

/// Cancels whatever compression is in flight on the session it came from.
///
/// Detached from the session borrow, so it can be used while the session is
/// busy inside a `compress` call.
#[derive(Clone)]
pub struct CancelHandle(Arc<Mutex<Option<CancelToken>>>);

impl CancelHandle {
    /// Returns false if nothing was running.
    pub fn cancel(&self) -> bool {
        match self.0.lock().unwrap_or_else(|e| e.into_inner()).as_ref() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }
}

/// Holds the in-flight slot; releasing it clears the busy flag.
struct InFlight<'a, C: Compressor> {
    session: &'a CompressionSession<C>,
}

impl<C: Compressor> Drop for InFlight<'_, C> {
    fn drop(&mut self) {
        let session = self.session;
        session.lock_state().is_compressing = false;
        *session.lock_cancel() = None;
        session.in_flight.store(false, Ordering::SeqCst);
    }
}

impl<C: Compressor> CompressionSession<C> {
    pub fn new(compressor: C) -> Self {
        Self::with_shared(Arc::new(compressor))
    }

    pub fn with_shared(compressor: Arc<C>) -> Self {
        Self {
            compressor,
            state: Mutex::new(SessionState::default()),
            in_flight: AtomicBool::new(false),
            cancel: Arc::new(Mutex::new(None)),
        }
    }

    /// Poisoning only means another holder panicked mid-update; the fields
    /// are plain values, so keep going with whatever is there.
    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_cancel(&self) -> MutexGuard<'_, Option<CancelToken>> {
        self.cancel.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn acquire(&self) -> Option<InFlight<'_, C>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| InFlight { session: self })
    }

    /// Compress `file`, recording progress and outcome in the session state.
    pub async fn compress(
        &self,
        file: ImageFile,
        options: CompressionOptions,
    ) -> Result<ImageFile, SessionError> {
        let Some(_slot) = self.acquire() else {
            warn!("rejected {}: another compression is in flight", file.name);
            return Err(SessionError::Busy);
        };

        let token = CancelToken::new();
        *self.lock_cancel() = Some(token.clone());
        let original_size = file.size();
        {
            let mut state = self.lock_state();
            state.is_compressing = true;
            state.error_message.clear();
            state.original_image = Some(file.clone());
        }
        debug!("compressing {} ({} bytes)", file.name, original_size);

        let name = file.name.clone();
        match self.compressor.compress(file, options, token).await {
            Ok(compressed) => {
                let ratio = compression_ratio(original_size, compressed.size());
                info!(
                    "compressed {name}: {original_size} → {} bytes ({ratio}%)",
                    compressed.size()
                );
                let mut state = self.lock_state();
                state.compression_ratio = ratio;
                state.compressed_image = Some(compressed.clone());
                Ok(compressed)
            }
            Err(err) => {
                let message = describe(&err);
                warn!("compressing {name} failed: {message}");
                self.lock_state().error_message = message;
                Err(err.into())
            }
        }
    }

    /// Return every observable field to its initial value.
    ///
    /// Does not cancel an in-flight compression.
    pub fn reset(&self) {
        *self.lock_state() = SessionState::default();
    }

    /// Forget the stored result and show `message`. The original stays.
    pub fn discard_result(&self, message: &str) {
        let mut state = self.lock_state();
        state.compressed_image = None;
        state.compression_ratio = 0.0;
        state.error_message = message.to_string();
    }

    /// Signal the in-flight compression to stop. Returns false if none was running.
    pub fn cancel(&self) -> bool {
        self.cancel_handle().cancel()
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle(Arc::clone(&self.cancel))
    }

    pub fn compressor(&self) -> &C {
        &self.compressor
    }

    pub fn snapshot(&self) -> SessionState {
        self.lock_state().clone()
    }

    pub fn is_compressing(&self) -> bool {
        self.lock_state().is_compressing
    }

    pub fn error_message(&self) -> String {
        self.lock_state().error_message.clone()
    }
}

/// The failure's own description, or [`GENERIC_FAILURE`] if it has none.
fn describe(err: &CompressError) -> String {
    let text = err.to_string();
    if text.trim().is_empty() {
        GENERIC_FAILURE.to_string()
    } else {
        text
    }
}
