// SPDX-License-Identifier: MPL-2.0

//! Audio encoder selection
//!
//! MP4 recordings carry AAC (mono, 44.1 kHz, 128 kbps by default);
//! Matroska recordings prefer Opus and fall back to AAC.

use crate::media::encoders::ContainerFormat;

#[cfg(feature = "gstreamer")]
use crate::errors::RecordingError;
#[cfg(feature = "gstreamer")]
use gstreamer as gst;
#[cfg(feature = "gstreamer")]
use gstreamer::prelude::*;
#[cfg(feature = "gstreamer")]
use tracing::{debug, info};

/// Audio codec types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCodec {
    /// AAC (required by MP4 players)
    AAC,
    /// Opus
    Opus,
}

impl AudioCodec {
    /// Preferred codec for a container
    pub fn for_container(container: ContainerFormat) -> Self {
        match container {
            ContainerFormat::MP4 => AudioCodec::AAC,
            ContainerFormat::Matroska => AudioCodec::Opus,
        }
    }

    /// Get audio caps string for this codec
    pub fn caps_string(&self) -> &'static str {
        match self {
            AudioCodec::Opus => "audio/x-opus",
            AudioCodec::AAC => "audio/mpeg,mpegversion=4",
        }
    }

    /// Encoder elements to try, best first
    pub fn encoder_candidates(&self) -> &'static [&'static str] {
        match self {
            AudioCodec::AAC => &["fdkaacenc", "avenc_aac", "faac", "voaacenc"],
            AudioCodec::Opus => &["opusenc"],
        }
    }
}

/// Audio channel configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioChannels {
    Mono,
    Stereo,
    /// Multi-channel (more than 2)
    MultiChannel(u32),
}

impl AudioChannels {
    pub fn count(&self) -> u32 {
        match self {
            AudioChannels::Mono => 1,
            AudioChannels::Stereo => 2,
            AudioChannels::MultiChannel(n) => *n,
        }
    }

    pub fn from_count(count: u32) -> Self {
        match count {
            1 => AudioChannels::Mono,
            2 => AudioChannels::Stereo,
            n => AudioChannels::MultiChannel(n),
        }
    }
}

/// Create an encoder for `codec`
///
/// When the container allows it (Matroska) and no Opus encoder is installed,
/// AAC is used instead. The returned codec is the one actually selected.
#[cfg(feature = "gstreamer")]
pub fn select_audio_encoder(
    codec: AudioCodec,
    container: ContainerFormat,
    channels: AudioChannels,
    bitrate_bps: i32,
) -> Result<(gst::Element, AudioCodec), RecordingError> {
    gst::init().map_err(|e| RecordingError::StartFailed(format!("GStreamer init: {}", e)))?;

    let mut order = vec![codec];
    if container == ContainerFormat::Matroska && codec == AudioCodec::Opus {
        order.push(AudioCodec::AAC);
    }

    for candidate in order {
        for encoder_name in candidate.encoder_candidates() {
            if let Ok(encoder) = gst::ElementFactory::make(encoder_name).build() {
                info!(
                    codec = ?candidate,
                    encoder = %encoder_name,
                    channels = channels.count(),
                    "Selected audio encoder"
                );
                configure_audio_encoder(&encoder, encoder_name, channels, bitrate_bps);
                return Ok((encoder, candidate));
            }
        }
    }

    Err(RecordingError::EncoderNotAvailable(format!(
        "no {:?} audio encoder installed (gstreamer1-plugins-bad provides avenc_aac)",
        codec
    )))
}

#[cfg(feature = "gstreamer")]
fn configure_audio_encoder(
    encoder: &gst::Element,
    encoder_name: &str,
    channels: AudioChannels,
    bitrate: i32,
) {
    match encoder_name {
        "opusenc" => {
            encoder.set_property("bitrate", bitrate);
            // Cabin microphones pick up mostly speech
            let audio_type = match channels {
                AudioChannels::Mono => "voice",
                AudioChannels::Stereo | AudioChannels::MultiChannel(_) => "generic",
            };
            encoder.set_property_from_str("audio-type", audio_type);
            debug!("Configured opusenc: bitrate={} bps, audio-type={}", bitrate, audio_type);
        }

        "faac" => {
            // kbps
            encoder.set_property("bitrate", bitrate / 1000);
            debug!("Configured faac: bitrate={} kbps", bitrate / 1000);
        }

        "avenc_aac" | "voaacenc" | "fdkaacenc" => {
            encoder.set_property("bitrate", bitrate);
            debug!("Configured {}: bitrate={} bps", encoder_name, bitrate);
        }

        _ => {
            debug!("Unknown audio encoder type, using default configuration");
        }
    }
}
