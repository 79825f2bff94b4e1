// SPDX-License-Identifier: MPL-2.0

//! Integration tests for capture delivery into the recording session

mod common;

use common::*;
use drive_recorder::backends::camera::test_pattern::TestPatternSource;
use drive_recorder::backends::camera::{CaptureSource, FrameSink, MediaKind};
use drive_recorder::{FrameSourceAdapter, RecordingSession};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn adapter(audio: bool) -> (tempfile::TempDir, MockBackend, Arc<FrameSourceAdapter>) {
    let dir = tempfile::tempdir().unwrap();
    let backend = MockBackend::default();
    let session = RecordingSession::new(context(dir.path(), &backend, audio, true));
    (dir, backend, Arc::new(FrameSourceAdapter::new(session)))
}

#[test]
fn test_idle_frames_discarded() {
    let (_dir, backend, adapter) = adapter(false);

    adapter.on_video_frame(rgba_frame(frame_time(0, 30)));
    let stats = adapter.stats();
    assert_eq!(stats.video_received, 1);
    assert_eq!(stats.discarded_idle, 1);
    assert_eq!(backend.state.opened(), 0);
    assert!(backend.state.written().is_empty());
}

#[test]
fn test_unready_buffers_discarded() {
    let (_dir, backend, adapter) = adapter(false);
    adapter.session().start().unwrap();

    let mut frame = rgba_frame(frame_time(0, 30));
    frame.ready = false;
    adapter.on_video_frame(frame);
    adapter.on_video_frame(rgba_frame(frame_time(1, 30)));
    adapter.session().stop().unwrap();

    let stats = adapter.stats();
    assert_eq!(stats.discarded_unready, 1);
    assert_eq!(backend.state.written().len(), 1);
}

#[test]
fn test_session_drops_counted() {
    let (_dir, backend, adapter) = adapter(false);
    adapter.session().start().unwrap();

    backend.state.set_ready(false);
    adapter.on_video_frame(rgba_frame(frame_time(0, 30)));
    backend.state.set_ready(true);
    adapter.on_video_frame(rgba_frame(frame_time(1, 30)));

    assert_eq!(adapter.stats().dropped_by_session, 1);
    assert_eq!(adapter.session().stats().video.dropped_not_ready, 1);
    adapter.session().stop().unwrap();
}

#[test]
fn test_live_source_records_both_tracks() {
    let (_dir, backend, adapter) = adapter(true);
    let source = TestPatternSource::new(640, 480, 30, true);

    adapter.session().start().unwrap();
    source.start(adapter.clone()).unwrap();
    thread::sleep(Duration::from_millis(400));
    let summary = adapter.session().stop().unwrap();
    source.stop();

    assert!(summary.frame_count > 0);
    assert!(summary.audio_buffers > 0);
    for kind in [MediaKind::Video, MediaKind::Audio] {
        let written = backend.state.written_of(kind);
        assert!(written.windows(2).all(|w| w[0].pts < w[1].pts), "{} out of order", kind);
    }
    assert_eq!(backend.state.written_of(MediaKind::Video)[0].pts, Duration::ZERO);

    // Source kept delivering after stop; nothing more was written
    let written = backend.state.written().len();
    adapter.on_video_frame(rgba_frame(Duration::from_secs(1_000)));
    assert_eq!(backend.state.written().len(), written);
}
