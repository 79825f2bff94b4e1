// SPDX-License-Identifier: MPL-2.0

//! Media encoder selection and configuration
//!
//! - Hardware encoder priority (HEVC and H.264) with software fallbacks
//! - AAC audio for MP4, Opus for Matroska
//! - Encoder detection for diagnostics (`gstreamer` feature)

pub mod audio;
#[cfg(feature = "gstreamer")]
pub mod detection;
pub mod video;

pub use audio::{AudioChannels, AudioCodec};
pub use video::{ContainerFormat, VideoCodec};

#[cfg(feature = "gstreamer")]
pub use detection::log_available_encoders;
