// SPDX-License-Identifier: MPL-2.0

//! Container writer interface
//!
//! A recording session talks to its output file only through
//! [`ContainerWriter`]. The GStreamer implementation lives in
//! [`super::muxer`]; tests provide in-memory writers.

use crate::backends::camera::{Frame, MediaKind};
use crate::config::RecordingConfig;
use crate::constants::BitratePreset;
use crate::errors::RecordingError;
use crate::media::encoders::{AudioCodec, VideoCodec};
use std::path::Path;
use std::time::Duration;

/// Handle for a track inside one writer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrackId(pub usize);

/// What a track carries and how to encode it
#[derive(Debug, Clone, PartialEq)]
pub enum TrackSpec {
    Video {
        width: u32,
        height: u32,
        frame_rate: u32,
        codec: VideoCodec,
        bitrate_kbps: u32,
        preset: BitratePreset,
    },
    Audio {
        sample_rate: u32,
        channels: u32,
        codec: AudioCodec,
        bitrate_bps: i32,
    },
}

impl TrackSpec {
    pub fn video(config: &RecordingConfig) -> Self {
        TrackSpec::Video {
            width: config.width,
            height: config.height,
            frame_rate: config.frame_rate,
            codec: config.video_codec,
            bitrate_kbps: config.video_bitrate_kbps,
            preset: config.bitrate_preset,
        }
    }

    pub fn audio(config: &RecordingConfig) -> Self {
        TrackSpec::Audio {
            sample_rate: config.audio_sample_rate,
            channels: config.audio_channels,
            codec: config.audio_codec,
            bitrate_bps: config.audio_bitrate_bps,
        }
    }

    pub fn kind(&self) -> MediaKind {
        match self {
            TrackSpec::Video { .. } => MediaKind::Video,
            TrackSpec::Audio { .. } => MediaKind::Audio,
        }
    }
}

/// One frame with its presentation time in the container
#[derive(Debug, Clone)]
pub struct Sample {
    /// Relative to the first video frame, never negative
    pub pts: Duration,
    pub duration: Duration,
    pub frame: Frame,
}

/// An open output file accepting samples on one or more tracks
///
/// Calls are serialized by the owner; implementations need not be `Sync`.
pub trait ContainerWriter: Send {
    /// Declare a track; only valid before [`ContainerWriter::start_writing`]
    fn add_track(&mut self, spec: &TrackSpec) -> Result<TrackId, RecordingError>;

    /// Returns once the writer accepts samples
    fn start_writing(&mut self) -> Result<(), RecordingError>;

    /// Whether `track` can take another sample without queuing unboundedly
    fn is_ready_for_more_data(&self, track: TrackId) -> bool;

    fn append(&mut self, track: TrackId, sample: Sample) -> Result<(), RecordingError>;

    /// No further samples will arrive on `track`
    fn mark_finished(&mut self, track: TrackId);

    /// Close the file with its duration ending at `end_time`
    ///
    /// Audio reaching past `end_time` is cut or left out.
    /// The file is playable only after this returns `Ok`.
    fn finish_writing(&mut self, end_time: Duration) -> Result<(), RecordingError>;

    fn output_path(&self) -> &Path;
}

/// Opens container writers
pub trait ContainerBackend: Send + Sync {
    /// Extension for files this backend writes under `config`
    fn file_extension(&self, config: &RecordingConfig) -> &'static str {
        config.container.extension()
    }

    fn open(
        &self,
        path: &Path,
        config: &RecordingConfig,
    ) -> Result<Box<dyn ContainerWriter>, RecordingError>;
}
