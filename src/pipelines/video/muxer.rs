// SPDX-License-Identifier: MPL-2.0

//! GStreamer container writer
//!
//! Each track is an `appsrc` feeding its own encode branch into one muxer:
//!
//! ```text
//! appsrc(video) → videoconvert → encoder → parser → queue ─┐
//!                                                          ├→ mp4mux/matroskamux → filesink
//! appsrc(audio) → audioconvert → audioresample → encoder → queue ─┘
//! ```
//!
//! Timestamps come from the session; appsrc never stamps buffers itself.
//! Audio passes through an [`AudioGate`] so the file ends with its last
//! video frame.

use super::clip::AudioGate;
use super::writer::{ContainerBackend, ContainerWriter, Sample, TrackId, TrackSpec};
use crate::backends::camera::{Frame, MediaKind, PixelFormat, VideoFrame};
use crate::config::RecordingConfig;
use crate::constants::BitratePreset;
use crate::constants::timing::{
    AUDIO_GATE_MAX_BUFFERS, AUDIO_QUEUE_MAX_BYTES, FINALIZE_TIMEOUT_SECS, START_TIMEOUT_SECS, VIDEO_QUEUE_MAX_BYTES,
};
use crate::errors::RecordingError;
use crate::media::encoders::audio::{AudioChannels, select_audio_encoder};
use crate::media::encoders::video::select_video_encoder;
use crate::media::encoders::{AudioCodec, VideoCodec};
use gstreamer as gst;
use gstreamer::prelude::*;
use gstreamer_app::AppSrc;
use gstreamer_video::{VideoFormat, VideoFrameFlags, VideoInfo, VideoMeta};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Opens [`GstContainerWriter`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct GstContainerBackend;

impl GstContainerBackend {
    pub fn new() -> Self {
        Self
    }
}

impl ContainerBackend for GstContainerBackend {
    fn open(
        &self,
        path: &Path,
        config: &RecordingConfig,
    ) -> Result<Box<dyn ContainerWriter>, RecordingError> {
        GstContainerWriter::create(path, config).map(|w| Box::new(w) as Box<dyn ContainerWriter>)
    }
}

struct GstTrack {
    spec: TrackSpec,
    appsrc: AppSrc,
    max_bytes: u64,
    /// Set from the first video frame
    video_info: Option<VideoInfo>,
    /// No more appends accepted
    finished: bool,
    eos_sent: bool,
}

impl GstTrack {
    fn end_stream(&mut self) {
        self.finished = true;
        if self.eos_sent {
            return;
        }
        self.eos_sent = true;
        if let Err(e) = self.appsrc.end_of_stream() {
            warn!(track = %self.spec.kind(), error = ?e, "Failed to send end-of-stream");
        }
    }
}

pub struct GstContainerWriter {
    pipeline: gst::Pipeline,
    muxer: gst::Element,
    config: RecordingConfig,
    tracks: Vec<GstTrack>,
    audio_gate: AudioGate,
    path: PathBuf,
    started: bool,
}

impl GstContainerWriter {
    fn create(path: &Path, config: &RecordingConfig) -> Result<Self, RecordingError> {
        gst::init().map_err(|e| RecordingError::StartFailed(format!("GStreamer init: {}", e)))?;
        info!(path = %path.display(), container = ?config.container, "Creating container writer");

        let pipeline = gst::Pipeline::with_name("drive-recorder");
        let muxer = make(config.container.muxer_name())?;

        // Non-streamable output gets duration and index written at EOS
        if muxer.has_property("streamable") {
            muxer.set_property("streamable", false);
        }

        let filesink = gst::ElementFactory::make("filesink")
            .property("location", path.to_string_lossy().to_string())
            .build()
            .map_err(|e| pipeline_error("filesink", e))?;

        pipeline
            .add_many([&muxer, &filesink])
            .map_err(|e| pipeline_error("add muxer", e))?;
        muxer
            .link(&filesink)
            .map_err(|_| RecordingError::PipelineError("Failed to link muxer to filesink".into()))?;

        Ok(Self {
            pipeline,
            muxer,
            config: config.clone(),
            tracks: Vec::new(),
            audio_gate: AudioGate::new(AUDIO_GATE_MAX_BUFFERS),
            path: path.to_path_buf(),
            started: false,
        })
    }

    fn build_video_branch(
        &self,
        codec: VideoCodec,
        bitrate_kbps: u32,
        preset: BitratePreset,
    ) -> Result<AppSrc, RecordingError> {
        let appsrc = new_appsrc("video", VIDEO_QUEUE_MAX_BYTES);
        let convert = make("videoconvert")?;
        let encoder = select_video_encoder(codec, bitrate_kbps, preset)?;
        let parser = make(codec.parser_name())?;
        let queue = make("queue")?;

        let chain = [appsrc.upcast_ref::<gst::Element>(), &convert, &encoder, &parser, &queue];
        self.pipeline
            .add_many(chain)
            .map_err(|e| pipeline_error("add video branch", e))?;
        gst::Element::link_many(chain)
            .map_err(|e| pipeline_error("link video branch", e))?;
        queue
            .link(&self.muxer)
            .map_err(|_| RecordingError::PipelineError("Failed to link video to muxer".into()))?;

        debug!(codec = ?codec, bitrate_kbps, "Video branch ready");
        Ok(appsrc)
    }

    fn build_audio_branch(
        &self,
        sample_rate: u32,
        channels: u32,
        codec: AudioCodec,
        bitrate_bps: i32,
    ) -> Result<AppSrc, RecordingError> {
        let appsrc = new_appsrc("audio", AUDIO_QUEUE_MAX_BYTES);
        appsrc.set_caps(Some(
            &gst::Caps::builder("audio/x-raw")
                .field("format", "S16LE")
                .field("layout", "interleaved")
                .field("rate", sample_rate as i32)
                .field("channels", channels as i32)
                .build(),
        ));

        let convert = make("audioconvert")?;
        let resample = make("audioresample")?;
        let (encoder, selected) = select_audio_encoder(
            codec,
            self.config.container,
            AudioChannels::from_count(channels),
            bitrate_bps,
        )?;
        let queue = make("queue")?;

        let chain = [appsrc.upcast_ref::<gst::Element>(), &convert, &resample, &encoder, &queue];
        self.pipeline
            .add_many(chain)
            .map_err(|e| pipeline_error("add audio branch", e))?;
        gst::Element::link_many(chain)
            .map_err(|e| pipeline_error("link audio branch", e))?;
        queue
            .link(&self.muxer)
            .map_err(|_| RecordingError::PipelineError("Failed to link audio to muxer".into()))?;

        debug!(codec = ?selected, sample_rate, channels, "Audio branch ready");
        Ok(appsrc)
    }

    fn track_mut(&mut self, track: TrackId) -> Result<&mut GstTrack, RecordingError> {
        self.tracks
            .get_mut(track.0)
            .ok_or_else(|| RecordingError::AppendFailed(format!("unknown track {}", track.0)))
    }

    /// Hand one sample to its appsrc
    fn push_sample(&mut self, track: TrackId, sample: Sample) -> Result<(), RecordingError> {
        let frame_rate = self.config.frame_rate;
        let entry = self.track_mut(track)?;
        if entry.eos_sent {
            return Err(RecordingError::AppendFailed("track already ended".into()));
        }

        let mut buffer = match &sample.frame {
            Frame::Video(frame) => {
                if entry.video_info.is_none() {
                    let info = video_info(frame, frame_rate)?;
                    let caps = info
                        .to_caps()
                        .map_err(|e| RecordingError::AppendFailed(e.to_string()))?;
                    debug!(caps = %caps, "Video caps from first frame");
                    entry.appsrc.set_caps(Some(&caps));
                    entry.video_info = Some(info);
                }
                let mut buffer = gst::Buffer::from_slice(frame.data.clone());
                if let Some(info) = &entry.video_info {
                    attach_stride_meta(buffer.make_mut(), frame, info)?;
                }
                buffer
            }
            Frame::Audio(frame) => gst::Buffer::from_slice(frame.data.clone()),
        };

        {
            let buffer = buffer.make_mut();
            buffer.set_pts(clock_time(sample.pts));
            buffer.set_duration(clock_time(sample.duration));
        }

        entry
            .appsrc
            .push_buffer(buffer)
            .map_err(|e| RecordingError::AppendFailed(format!("push failed: {:?}", e)))?;
        Ok(())
    }

    /// Fail fast on an error already posted to the bus
    fn check_bus(&self) -> Result<(), RecordingError> {
        let Some(bus) = self.pipeline.bus() else {
            return Ok(());
        };
        if let Some(msg) = bus.pop_filtered(&[gst::MessageType::Error]) {
            if let gst::MessageView::Error(err) = msg.view() {
                error!(
                    error = %err.error(),
                    debug = ?err.debug(),
                    source = ?err.src().map(|s| s.name()),
                    "GStreamer error"
                );
                return Err(RecordingError::PipelineError(err.error().to_string()));
            }
        }
        Ok(())
    }
}

impl ContainerWriter for GstContainerWriter {
    fn add_track(&mut self, spec: &TrackSpec) -> Result<TrackId, RecordingError> {
        if self.started {
            return Err(RecordingError::PipelineError(
                "tracks must be added before writing starts".into(),
            ));
        }
        let (appsrc, max_bytes) = match *spec {
            TrackSpec::Video {
                codec,
                bitrate_kbps,
                preset,
                ..
            } => (
                self.build_video_branch(codec, bitrate_kbps, preset)?,
                VIDEO_QUEUE_MAX_BYTES,
            ),
            TrackSpec::Audio {
                sample_rate,
                channels,
                codec,
                bitrate_bps,
            } => (
                self.build_audio_branch(sample_rate, channels, codec, bitrate_bps)?,
                AUDIO_QUEUE_MAX_BYTES,
            ),
        };
        self.tracks.push(GstTrack {
            spec: spec.clone(),
            appsrc,
            max_bytes,
            video_info: None,
            finished: false,
            eos_sent: false,
        });
        Ok(TrackId(self.tracks.len() - 1))
    }

    fn start_writing(&mut self) -> Result<(), RecordingError> {
        self.pipeline
            .set_state(gst::State::Playing)
            .map_err(|e| RecordingError::StartFailed(format!("Failed to start pipeline: {}", e)))?;
        let (result, _, _) = self
            .pipeline
            .state(gst::ClockTime::from_seconds(START_TIMEOUT_SECS));
        if result.is_err() {
            self.check_bus()?;
            return Err(RecordingError::StartFailed(
                "pipeline did not reach PLAYING".into(),
            ));
        }
        self.check_bus()?;
        self.started = true;
        info!(path = %self.path.display(), tracks = self.tracks.len(), "Writer started");
        Ok(())
    }

    fn is_ready_for_more_data(&self, track: TrackId) -> bool {
        self.started
            && self
                .tracks
                .get(track.0)
                .is_some_and(|t| !t.finished && t.appsrc.current_level_bytes() < t.max_bytes)
    }

    fn append(&mut self, track: TrackId, sample: Sample) -> Result<(), RecordingError> {
        let entry = self.track_mut(track)?;
        if entry.finished {
            return Err(RecordingError::AppendFailed("track already finished".into()));
        }

        let released = match entry.spec.kind() {
            MediaKind::Video => {
                let end = sample.pts + sample.duration;
                self.push_sample(track, sample)?;
                self.audio_gate.advance_video(end)
            }
            MediaKind::Audio => self.audio_gate.push_audio(track, sample),
        };
        for (audio_track, audio) in released {
            self.push_sample(audio_track, audio)?;
        }
        Ok(())
    }

    fn mark_finished(&mut self, track: TrackId) {
        let Some(entry) = self.tracks.get_mut(track.0) else {
            return;
        };
        // Audio still held by the gate goes out in finish_writing
        if entry.spec.kind() == MediaKind::Video {
            entry.end_stream();
        } else {
            entry.finished = true;
        }
    }

    fn finish_writing(&mut self, end_time: Duration) -> Result<(), RecordingError> {
        let (tail, discarded) = self.audio_gate.finish(end_time);
        if discarded > 0 {
            debug!(discarded, end_time = ?end_time, "Dropped audio past the last video frame");
        }
        for (track, sample) in tail {
            if let Err(e) = self.push_sample(track, sample) {
                warn!(error = %e, "Failed to write trailing audio");
            }
        }
        for entry in &mut self.tracks {
            entry.end_stream();
        }
        info!(path = %self.path.display(), end_time = ?end_time, "Waiting for muxer to finish");

        let bus = self
            .pipeline
            .bus()
            .ok_or_else(|| RecordingError::FinalizeFailed("pipeline has no bus".into()))?;

        let mut outcome = Err(RecordingError::FinalizeFailed(format!(
            "no end-of-stream within {}s",
            FINALIZE_TIMEOUT_SECS
        )));
        for msg in bus.iter_timed(gst::ClockTime::from_seconds(FINALIZE_TIMEOUT_SECS)) {
            match msg.view() {
                gst::MessageView::Eos(..) => {
                    outcome = Ok(());
                    break;
                }
                gst::MessageView::Error(err) => {
                    outcome = Err(RecordingError::FinalizeFailed(err.error().to_string()));
                    break;
                }
                _ => {}
            }
        }

        if let Err(e) = self.pipeline.set_state(gst::State::Null) {
            warn!(error = %e, "Failed to stop writer pipeline");
        }
        outcome
    }

    fn output_path(&self) -> &Path {
        &self.path
    }
}

impl Drop for GstContainerWriter {
    fn drop(&mut self) {
        let _ = self.pipeline.set_state(gst::State::Null);
    }
}

fn new_appsrc(name: &str, max_bytes: u64) -> AppSrc {
    AppSrc::builder()
        .name(name)
        .format(gst::Format::Time)
        .is_live(true)
        .do_timestamp(false)
        .block(false)
        .max_bytes(max_bytes)
        .build()
}

fn make(factory: &str) -> Result<gst::Element, RecordingError> {
    gst::ElementFactory::make(factory)
        .build()
        .map_err(|_| RecordingError::EncoderNotAvailable(format!("missing element {}", factory)))
}

fn pipeline_error(what: &str, e: impl std::fmt::Display) -> RecordingError {
    RecordingError::PipelineError(format!("{}: {}", what, e))
}

fn clock_time(d: Duration) -> gst::ClockTime {
    gst::ClockTime::from_nseconds(d.as_nanos() as u64)
}

fn video_info(frame: &VideoFrame, frame_rate: u32) -> Result<VideoInfo, RecordingError> {
    let format = VideoFormat::from_string(frame.format.to_gst_format_string());
    VideoInfo::builder(format, frame.width, frame.height)
        .fps(gst::Fraction::new(frame_rate as i32, 1))
        .build()
        .map_err(|e| RecordingError::AppendFailed(format!("invalid video format: {}", e)))
}

/// Describe padded rows so videoconvert reads the right bytes
fn attach_stride_meta(
    buffer: &mut gst::BufferRef,
    frame: &VideoFrame,
    info: &VideoInfo,
) -> Result<(), RecordingError> {
    let stride = frame.stride as usize;
    if info.stride().first().copied() == Some(frame.stride as i32) {
        return Ok(());
    }
    let luma = stride * frame.height as usize;
    let (offsets, strides): (Vec<usize>, Vec<i32>) = match frame.format {
        PixelFormat::NV12 => (vec![0, luma], vec![stride as i32; 2]),
        PixelFormat::I420 => {
            let chroma = stride / 2 * (frame.height as usize).div_ceil(2);
            (
                vec![0, luma, luma + chroma],
                vec![stride as i32, (stride / 2) as i32, (stride / 2) as i32],
            )
        }
        PixelFormat::RGBA | PixelFormat::BGRA | PixelFormat::YUYV => {
            (vec![0], vec![stride as i32])
        }
    };
    VideoMeta::add_full(
        buffer,
        VideoFrameFlags::empty(),
        info.format(),
        frame.width,
        frame.height,
        &offsets,
        &strides,
    )
    .map_err(|e| RecordingError::AppendFailed(format!("stride meta: {}", e)))?;
    Ok(())
}
