// SPDX-License-Identifier: MPL-2.0

//! Drive Recorder - a dash-cam recording pipeline
//!
//! Frames from a live capture source are stamped with a telemetry overlay
//! (time, position, speed) and written to an MP4 or Matroska file, with
//! optional audio. Still images can be taken at any time.
//!
//! # Architecture
//!
//! - [`backends`]: Capture sources (GStreamer devices, synthetic test pattern)
//! - [`media`]: Overlay compositing and encoder selection
//! - [`pipelines`]: Recording session, container writers and still images
//! - [`telemetry`]: Latest speed and position shared with the overlay
//! - [`config`]: User configuration handling
//! - [`storage`]: Output naming and the recordings directory
//!
//! # Example
//!
//! ```ignore
//! let session = RecordingSession::new(SessionContext {
//!     backend: Arc::new(GstContainerBackend::new()),
//!     config: ConfigHandle::new(Config::load()?),
//!     telemetry: TelemetryHandle::default(),
//!     still: None,
//! });
//! session.start()?;
//! // hand FrameSourceAdapter::new(session.clone()) to a capture source
//! let summary = session.stop()?;
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod media;
pub mod pipelines;
pub mod storage;
pub mod telemetry;

// Re-export commonly used types
pub use config::{Config, ConfigHandle, RecordingConfig};
pub use constants::BitratePreset;
pub use errors::{AppError, AppResult, CaptureError, PhotoError, RecordingError};
pub use pipelines::photo::{PhotoPipeline, StillImagePath};
pub use pipelines::video::{
    FrameSourceAdapter, RecordingSession, RecordingSummary, SessionContext, SessionState,
    StartInfo,
};
pub use telemetry::{TelemetryHandle, TelemetrySnapshot};
