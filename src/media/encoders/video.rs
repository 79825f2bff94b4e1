// SPDX-License-Identifier: MPL-2.0

//! Video encoder selection with hardware acceleration priority
//!
//! Codec and container identifiers are always available so a
//! [`crate::config::RecordingConfig`] can name them; element creation
//! needs the `gstreamer` feature.

use serde::{Deserialize, Serialize};

#[cfg(feature = "gstreamer")]
use crate::constants::BitratePreset;
#[cfg(feature = "gstreamer")]
use crate::errors::RecordingError;
#[cfg(feature = "gstreamer")]
use gstreamer as gst;
#[cfg(feature = "gstreamer")]
use gstreamer::prelude::*;
#[cfg(feature = "gstreamer")]
use tracing::{debug, info};

/// Video codec types in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VideoCodec {
    /// H.264 (best compatibility, default)
    #[default]
    H264,
    /// HEVC/H.265 (better compression)
    HEVC,
}

impl VideoCodec {
    /// Parser element placed between encoder and muxer
    pub fn parser_name(&self) -> &'static str {
        match self {
            VideoCodec::H264 => "h264parse",
            VideoCodec::HEVC => "h265parse",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            VideoCodec::H264 => "H.264",
            VideoCodec::HEVC => "H.265",
        }
    }
}

/// Container formats for recordings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ContainerFormat {
    /// MP4 container (default)
    #[default]
    MP4,
    /// Matroska container (survives a missing finalize better)
    Matroska,
}

impl ContainerFormat {
    pub const ALL: [ContainerFormat; 2] = [ContainerFormat::MP4, ContainerFormat::Matroska];

    pub fn extension(&self) -> &'static str {
        match self {
            ContainerFormat::MP4 => "mp4",
            ContainerFormat::Matroska => "mkv",
        }
    }

    /// Get muxer element name
    pub fn muxer_name(&self) -> &'static str {
        match self {
            ContainerFormat::MP4 => "mp4mux",
            ContainerFormat::Matroska => "matroskamux",
        }
    }

    /// Recognize a recording by its file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.extension().eq_ignore_ascii_case(ext))
    }
}

/// Information about an available encoder
#[cfg(feature = "gstreamer")]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderInfo {
    /// GStreamer element name
    pub element_name: &'static str,
    pub display_name: &'static str,
    pub codec: VideoCodec,
    pub is_hardware: bool,
}

/// Candidate encoders, best first
#[cfg(feature = "gstreamer")]
const ENCODER_SPECS: [(&str, &str, VideoCodec, bool); 12] = [
    ("vah265enc", "VA-API H.265 (HW)", VideoCodec::HEVC, true),
    ("vaapih265enc", "VA-API H.265 (HW)", VideoCodec::HEVC, true),
    ("nvh265enc", "NVIDIA H.265 (HW)", VideoCodec::HEVC, true),
    ("v4l2h265enc", "V4L2 H.265 (HW)", VideoCodec::HEVC, true),
    ("x265enc", "x265 H.265 (SW)", VideoCodec::HEVC, false),
    ("vah264enc", "VA-API H.264 (HW)", VideoCodec::H264, true),
    ("vaapih264enc", "VA-API H.264 (HW)", VideoCodec::H264, true),
    ("nvh264enc", "NVIDIA H.264 (HW)", VideoCodec::H264, true),
    ("v4l2h264enc", "V4L2 H.264 (HW)", VideoCodec::H264, true),
    ("qsvh264enc", "Intel QSV H.264 (HW)", VideoCodec::H264, true),
    ("x264enc", "x264 H.264 (SW)", VideoCodec::H264, false),
    ("openh264enc", "OpenH264 H.264 (SW)", VideoCodec::H264, false),
];

/// Enumerate available video encoders, best first
#[cfg(feature = "gstreamer")]
pub fn enumerate_video_encoders() -> Vec<EncoderInfo> {
    let _ = gst::init();

    ENCODER_SPECS
        .iter()
        .filter(|(element_name, ..)| gst::ElementFactory::find(element_name).is_some())
        .map(|&(element_name, display_name, codec, is_hardware)| EncoderInfo {
            element_name,
            display_name,
            codec,
            is_hardware,
        })
        .collect()
}

/// Create the best available encoder for `codec`
///
/// Hardware encoders are tried first, software last.
#[cfg(feature = "gstreamer")]
pub fn select_video_encoder(
    codec: VideoCodec,
    bitrate_kbps: u32,
    preset: BitratePreset,
) -> Result<gst::Element, RecordingError> {
    gst::init().map_err(|e| RecordingError::StartFailed(format!("GStreamer init: {}", e)))?;

    for (element_name, _, candidate, is_hardware) in ENCODER_SPECS.iter() {
        if *candidate != codec {
            continue;
        }
        if let Ok(encoder) = gst::ElementFactory::make(element_name).build() {
            info!(
                encoder = %element_name,
                codec = ?codec,
                hardware = is_hardware,
                "Selected video encoder"
            );
            configure_video_encoder(&encoder, element_name, bitrate_kbps, preset);
            return Ok(encoder);
        }
    }

    Err(RecordingError::EncoderNotAvailable(format!(
        "no {} encoder installed (try gstreamer1-plugins-ugly for x264enc)",
        codec.display_name()
    )))
}

/// Configure encoder for real-time capture at the given bitrate
#[cfg(feature = "gstreamer")]
fn configure_video_encoder(
    encoder: &gst::Element,
    encoder_name: &str,
    bitrate: u32,
    preset: BitratePreset,
) {
    match encoder_name {
        "x264enc" | "x265enc" => {
            let speed = match preset {
                BitratePreset::Low => "ultrafast",
                BitratePreset::Medium => "superfast",
                BitratePreset::High => "veryfast",
            };
            encoder.set_property_from_str("speed-preset", speed);
            encoder.set_property_from_str("tune", "zerolatency");
            encoder.set_property("bitrate", bitrate);
            debug!(encoder = encoder_name, speed, bitrate, "Configured software encoder");
        }

        "vaapih264enc" | "vaapih265enc" => {
            encoder.set_property("rate-control", 2); // CBR
            encoder.set_property("bitrate", bitrate);
            debug!("Configured VA-API encoder: bitrate={} kbps", bitrate);
        }

        "vah264enc" | "vah265enc" => {
            encoder.set_property_from_str("rate-control", "cbr");
            encoder.set_property("bitrate", bitrate);
            debug!("Configured VA encoder: bitrate={} kbps", bitrate);
        }

        "nvh264enc" | "nvh265enc" => {
            encoder.set_property("bitrate", bitrate);
            encoder.set_property_from_str("rc-mode", "cbr");
            debug!("Configured NVIDIA encoder: bitrate={} kbps", bitrate);
        }

        "qsvh264enc" => {
            encoder.set_property("bitrate", bitrate);
        }

        "openh264enc" => {
            encoder.set_property_from_str("rate-control", "bitrate");
            encoder.set_property("bitrate", bitrate * 1000); // bits per second
            encoder.set_property_from_str("usage-type", "camera");
            debug!("Configured openh264enc: bitrate={} bps", bitrate * 1000);
        }

        // V4L2 encoders expose little configuration
        _ => debug!(encoder = encoder_name, "Using encoder defaults"),
    }
}
