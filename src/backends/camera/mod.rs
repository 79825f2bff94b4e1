// SPDX-License-Identifier: MPL-2.0

//! Capture source abstraction
//!
//! ```text
//! ┌─────────────────────┐
//! │   CaptureSource     │  ← test pattern or GStreamer default device
//! └──────────┬──────────┘
//!            │ delivery threads (video, audio)
//!            ▼
//! ┌─────────────────────┐
//! │     FrameSink       │  ← FrameSourceAdapter in the recorder
//! └─────────────────────┘
//! ```
//!
//! Sources call the sink from their own threads, one frame per call. Video and
//! audio may arrive concurrently.

pub mod frame_loop;
#[cfg(feature = "gstreamer")]
pub mod gst_source;
pub mod test_pattern;
pub mod types;

pub use types::*;

use crate::errors::CaptureError;
use std::sync::Arc;

/// Receiver of captured frames
pub trait FrameSink: Send + Sync {
    /// Handle one video frame to completion
    fn on_video_frame(&self, frame: VideoFrame);

    /// Handle one audio buffer to completion
    fn on_audio_frame(&self, frame: AudioFrame);
}

/// A device or synthetic generator that emits frames
pub trait CaptureSource: Send + Sync {
    /// Begin delivering frames to `sink`
    fn start(&self, sink: Arc<dyn FrameSink>) -> Result<(), CaptureError>;

    /// Stop delivery; returns once no further sink calls will be made
    fn stop(&self);

    /// Most recent complete video frame, for still images
    fn capture_still(&self) -> Result<VideoFrame, CaptureError>;

    /// Whether the source also produces audio
    fn has_audio(&self) -> bool;
}
