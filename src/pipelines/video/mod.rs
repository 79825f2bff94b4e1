// SPDX-License-Identifier: MPL-2.0

//! Video recording pipeline
//!
//! - [`session`]: the recording state machine and frame admission
//! - [`track`]: per-track ordering and finishing on top of a writer
//! - [`writer`]: the container writer interface
//! - [`clip`]: holds audio back so it never outlasts the video
//! - [`frame_source`]: capture callbacks into the session
//! - [`muxer`]: GStreamer writer with hardware encoder selection

pub mod clip;
pub mod frame_source;
#[cfg(feature = "gstreamer")]
pub mod muxer;
pub mod session;
pub mod track;
pub mod writer;

pub use frame_source::{FrameSourceAdapter, SourceStats};
#[cfg(feature = "gstreamer")]
pub use muxer::GstContainerBackend;
pub use session::{
    DropReason, RecordingSession, RecordingStats, RecordingSummary, SessionContext, SessionState,
    StartInfo, SubmitOutcome, TrackStats,
};
pub use writer::{ContainerBackend, ContainerWriter, Sample, TrackId, TrackSpec};
