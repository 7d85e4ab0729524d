//! # imgshrink
//!
//! Pick or drop an image, get a smaller one back. Every accepted image is
//! scaled down to a size budget and a maximum edge length, re-encoded, and
//! shown next to the original with the bytes saved.
//!
//! # Architecture: Session Inside a Workbench
//!
//! ```text
//! path / drop ──▶ intake ──▶ Workbench ──▶ CompressionSession ──▶ Compressor
//!                              │  ▲                                  │
//!                              │  └──────── SessionState ◀───────────┘
//!                              ▼
//!                           Platform  (preview URLs, downloads, alerts)
//! ```
//!
//! - The **compressor** is a trait; [`compression::RustCompressor`] is the
//!   pure-Rust implementation and tests swap in a mock.
//! - The **session** turns one compressor call into observable state
//!   (in-flight flag, result, ratio, error) and refuses overlapping calls.
//! - The **workbench** owns everything the user sees: the accepted file,
//!   its preview resources, the range controls, drag state, downloads.
//! - The **platform** is the host boundary. [`preview::FsPlatform`] backs
//!   previews with temp files so the CLI can show real `file://` links.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`compression`] | Compressor trait, options, size search, pure-Rust backend |
//! | [`session`] | Observable state wrapper around one compressor |
//! | [`workbench`] | Intake, preview lifecycle, controls, download, drag handling |
//! | [`intake`] | Reading picked/dropped paths and image validation |
//! | [`preview`] | Host platform trait and the temp-file implementation |
//! | [`dragdrop`] | Drag events and scoped subscriptions |
//! | [`types`] | [`types::ImageFile`], the in-memory named blob |
//! | [`format`] | Human-readable byte sizes and percentages |
//! | [`config`] | `imgshrink.toml` loading, validation, and merging |
//! | [`output`] | Terminal rendering of the panels |
//! | [`report`] | HTML rendering of the panels using Maud |
//!
//! # Design Decisions
//!
//! ## One Compression at a Time
//!
//! A session rejects a second `compress` while one is in flight rather than
//! queueing or racing it. The workbench's compressing methods take
//! `&mut self`, so within one workbench the compiler already enforces this.
//!
//! ## Explicit Resource Ownership
//!
//! Preview URLs are created and revoked only by the workbench, and a drop
//! subscription unsubscribes itself when dropped. Nothing relies on the host
//! to clean up.

pub mod compression;
pub mod config;
pub mod dragdrop;
pub mod format;
pub mod intake;
pub mod output;
pub mod preview;
pub mod report;
pub mod session;
pub mod types;
pub mod workbench;

#[cfg(test)]
pub(crate) mod test_helpers;
