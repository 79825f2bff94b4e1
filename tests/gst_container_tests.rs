// SPDX-License-Identifier: MPL-2.0

//! End-to-end recordings through the GStreamer container writer
//!
//! Each test skips itself when the host lacks the plugins it needs.

#![cfg(feature = "gstreamer")]

use drive_recorder::backends::camera::test_pattern::TestPatternSource;
use drive_recorder::backends::camera::{AudioFrame, Frame, MediaKind, PixelFormat, VideoFrame};
use drive_recorder::constants::VideoQuality;
use drive_recorder::media::encoders::detection::is_element_available;
use drive_recorder::media::encoders::video::enumerate_video_encoders;
use drive_recorder::media::encoders::{AudioCodec, VideoCodec};
use drive_recorder::pipelines::video::{GstContainerBackend, SessionContext, SubmitOutcome};
use drive_recorder::{Config, ConfigHandle, RecordingSession, TelemetryHandle};
use gstreamer as gst;
use gstreamer::prelude::*;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

const WIDTH: u32 = 640;
const HEIGHT: u32 = 480;
const FPS: u64 = 30;
const SAMPLE_RATE: u32 = 44_100;
const AUDIO_SAMPLES: u64 = 1024;

/// Streams found in a finished file
struct Inspected {
    duration: Duration,
    video_streams: usize,
    audio_streams: usize,
}

fn plugins_present(audio: bool) -> bool {
    if gst::init().is_err() {
        eprintln!("skipping: GStreamer failed to initialize");
        return false;
    }
    let required = ["mp4mux", "h264parse", "qtdemux", "videoconvert", "filesrc", "fakesink"];
    if let Some(missing) = required.iter().find(|name| !is_element_available(name)) {
        eprintln!("skipping: element {} not installed", missing);
        return false;
    }
    if !enumerate_video_encoders()
        .iter()
        .any(|e| e.codec == VideoCodec::H264)
    {
        eprintln!("skipping: no H.264 encoder installed");
        return false;
    }
    if audio
        && !AudioCodec::AAC
            .encoder_candidates()
            .iter()
            .any(|name| is_element_available(name))
    {
        eprintln!("skipping: no AAC encoder installed");
        return false;
    }
    true
}

fn gst_session(dir: &Path, audio: bool) -> RecordingSession {
    let config = Config {
        video_quality: VideoQuality::Low,
        frame_rate: FPS as u32,
        record_audio: audio,
        overlay_enabled: false,
        recordings_dir: dir.to_path_buf(),
        photos_dir: dir.join("photos"),
        ..Config::default()
    };
    RecordingSession::new(SessionContext {
        backend: Arc::new(GstContainerBackend::new()),
        config: ConfigHandle::new(config),
        telemetry: TelemetryHandle::default(),
        still: None,
    })
}

fn pattern_frame(index: u64) -> Frame {
    Frame::Video(VideoFrame::new(
        WIDTH,
        HEIGHT,
        PixelFormat::RGBA,
        TestPatternSource::render(WIDTH, HEIGHT, index),
        Duration::from_nanos(index * 1_000_000_000 / FPS),
    ))
}

fn silence_frame(index: u64) -> Frame {
    let timestamp = Duration::from_nanos(index * AUDIO_SAMPLES * 1_000_000_000 / SAMPLE_RATE as u64);
    Frame::Audio(AudioFrame::new(
        vec![0u8; AUDIO_SAMPLES as usize * 2],
        SAMPLE_RATE,
        1,
        timestamp,
    ))
}

/// Duration and stream count as qtdemux reports them
fn inspect(path: &Path, audio: bool) -> Inspected {
    let mut description = format!(
        "filesrc location=\"{}\" ! qtdemux name=demux demux.video_0 ! fakesink",
        path.display()
    );
    if audio {
        description.push_str(" demux.audio_0 ! fakesink");
    }
    let pipeline = gst::parse::launch(&description)
        .unwrap()
        .downcast::<gst::Pipeline>()
        .unwrap();
    pipeline.set_state(gst::State::Paused).unwrap();
    let (result, _, _) = pipeline.state(gst::ClockTime::from_seconds(10));
    result.expect("recording did not preroll");

    let duration = pipeline
        .query_duration::<gst::ClockTime>()
        .expect("no duration in recording");
    let demux = pipeline.by_name("demux").unwrap();
    let names: Vec<String> = demux.src_pads().iter().map(|p| p.name().to_string()).collect();
    pipeline.set_state(gst::State::Null).unwrap();

    Inspected {
        duration: Duration::from_nanos(duration.nseconds()),
        video_streams: names.iter().filter(|n| n.starts_with("video_")).count(),
        audio_streams: names.iter().filter(|n| n.starts_with("audio_")).count(),
    }
}

fn assert_about_one_second(duration: Duration) {
    let secs = duration.as_secs_f64();
    assert!((0.9..=1.1).contains(&secs), "duration was {:.3}s", secs);
}

#[test]
fn test_thirty_frames_make_one_second_file() {
    if !plugins_present(false) {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let session = gst_session(dir.path(), false);
    let info = session.start().unwrap();

    for i in 0..FPS {
        assert_eq!(session.submit_frame(pattern_frame(i)), SubmitOutcome::Appended);
    }
    let summary = session.stop().unwrap();
    assert_eq!(summary.frame_count, FPS as i64);
    assert_about_one_second(summary.duration);

    let metadata = std::fs::metadata(&info.output_path).unwrap();
    assert!(metadata.len() > 0);
    let file = inspect(&info.output_path, false);
    assert_eq!(file.video_streams, 1);
    assert_eq!(file.audio_streams, 0);
    assert_about_one_second(file.duration);
}

#[test]
fn test_audio_past_last_frame_does_not_extend_file() {
    if !plugins_present(true) {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let session = gst_session(dir.path(), true);
    let info = session.start().unwrap();

    // Half a second of microphone audio keeps coming after the last frame
    let audio_buffers = SAMPLE_RATE as u64 * 3 / 2 / AUDIO_SAMPLES;
    let mut frames: Vec<Frame> = (0..FPS).map(pattern_frame).collect();
    frames.extend((0..audio_buffers).map(silence_frame));
    frames.sort_by_key(|f| (f.timestamp(), f.kind() != MediaKind::Video));
    for frame in frames {
        session.submit_frame(frame);
    }
    let summary = session.stop().unwrap();
    assert_eq!(summary.frame_count, FPS as i64);
    assert!(summary.audio_buffers > 0);

    let file = inspect(&info.output_path, true);
    assert_eq!(file.video_streams, 1);
    assert_eq!(file.audio_streams, 1);
    assert_about_one_second(file.duration);
}
