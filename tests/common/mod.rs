// SPDX-License-Identifier: MPL-2.0

//! Shared fixtures: an in-memory container backend and frame builders

#![allow(dead_code)]

use drive_recorder::backends::camera::{AudioFrame, Frame, MediaKind, PixelFormat, VideoFrame};
use drive_recorder::constants::VideoQuality;
use drive_recorder::errors::RecordingError;
use drive_recorder::pipelines::video::{
    ContainerBackend, ContainerWriter, Sample, SessionContext, TrackId, TrackSpec,
};
use drive_recorder::{Config, ConfigHandle, RecordingConfig, TelemetryHandle};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Matches the `VideoQuality::Low` preset the fixtures record at
pub const FRAME_WIDTH: u32 = 640;
pub const FRAME_HEIGHT: u32 = 480;

/// One sample as the writer received it
#[derive(Debug, Clone)]
pub struct Written {
    pub track: TrackId,
    pub kind: MediaKind,
    pub pts: Duration,
    pub duration: Duration,
    pub frame: Frame,
}

/// Writer calls in the order they happened
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Append(MediaKind, Duration),
    MarkFinished(TrackId),
    FinishWriting(Duration),
}

/// Knobs and observations shared by the backend and every writer it opens
#[derive(Default)]
pub struct MockState {
    /// Readiness reported for every track
    pub not_ready: AtomicBool,
    pub fail_start: AtomicBool,
    pub fail_finalize: AtomicBool,
    pub append_delay: Mutex<Duration>,
    pub finalize_delay: Mutex<Duration>,
    pub opened: AtomicUsize,
    pub finalized: AtomicUsize,
    pub tracks: Mutex<Vec<TrackSpec>>,
    pub written: Mutex<Vec<Written>>,
    pub events: Mutex<Vec<Event>>,
}

impl MockState {
    pub fn set_ready(&self, ready: bool) {
        self.not_ready.store(!ready, Ordering::SeqCst);
    }

    pub fn set_append_delay(&self, delay: Duration) {
        *self.append_delay.lock().unwrap() = delay;
    }

    pub fn set_finalize_delay(&self, delay: Duration) {
        *self.finalize_delay.lock().unwrap() = delay;
    }

    pub fn written(&self) -> Vec<Written> {
        self.written.lock().unwrap().clone()
    }

    pub fn written_of(&self, kind: MediaKind) -> Vec<Written> {
        self.written().into_iter().filter(|w| w.kind == kind).collect()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn track_kinds(&self) -> Vec<MediaKind> {
        self.tracks.lock().unwrap().iter().map(|t| t.kind()).collect()
    }

    pub fn finalized(&self) -> usize {
        self.finalized.load(Ordering::SeqCst)
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Default)]
pub struct MockBackend {
    pub state: Arc<MockState>,
}

impl ContainerBackend for MockBackend {
    fn open(
        &self,
        path: &Path,
        _config: &RecordingConfig,
    ) -> Result<Box<dyn ContainerWriter>, RecordingError> {
        // Real writers create the file right away
        std::fs::write(path, b"")
            .map_err(|e| RecordingError::StartFailed(e.to_string()))?;
        self.state.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockWriter {
            state: self.state.clone(),
            path: path.to_path_buf(),
            kinds: Vec::new(),
        }))
    }
}

struct MockWriter {
    state: Arc<MockState>,
    path: PathBuf,
    kinds: Vec<MediaKind>,
}

impl ContainerWriter for MockWriter {
    fn add_track(&mut self, spec: &TrackSpec) -> Result<TrackId, RecordingError> {
        self.state.tracks.lock().unwrap().push(spec.clone());
        self.kinds.push(spec.kind());
        Ok(TrackId(self.kinds.len() - 1))
    }

    fn start_writing(&mut self) -> Result<(), RecordingError> {
        if self.state.fail_start.load(Ordering::SeqCst) {
            return Err(RecordingError::PipelineError("encoder refused to start".into()));
        }
        Ok(())
    }

    fn is_ready_for_more_data(&self, _track: TrackId) -> bool {
        !self.state.not_ready.load(Ordering::SeqCst)
    }

    fn append(&mut self, track: TrackId, sample: Sample) -> Result<(), RecordingError> {
        let delay = *self.state.append_delay.lock().unwrap();
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        let kind = self.kinds[track.0];
        self.state
            .events
            .lock()
            .unwrap()
            .push(Event::Append(kind, sample.pts));
        self.state.written.lock().unwrap().push(Written {
            track,
            kind,
            pts: sample.pts,
            duration: sample.duration,
            frame: sample.frame,
        });
        Ok(())
    }

    fn mark_finished(&mut self, track: TrackId) {
        self.state
            .events
            .lock()
            .unwrap()
            .push(Event::MarkFinished(track));
    }

    fn finish_writing(&mut self, end_time: Duration) -> Result<(), RecordingError> {
        let delay = *self.state.finalize_delay.lock().unwrap();
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        self.state.finalized.fetch_add(1, Ordering::SeqCst);
        self.state
            .events
            .lock()
            .unwrap()
            .push(Event::FinishWriting(end_time));
        if self.state.fail_finalize.load(Ordering::SeqCst) {
            return Err(RecordingError::FinalizeFailed("moov atom not written".into()));
        }
        std::fs::write(&self.path, b"finalized")
            .map_err(|e| RecordingError::FinalizeFailed(e.to_string()))
    }

    fn output_path(&self) -> &Path {
        &self.path
    }
}

/// Session collaborators writing into `dir`
pub fn context(dir: &Path, backend: &MockBackend, audio: bool, overlay: bool) -> SessionContext {
    let config = Config {
        video_quality: VideoQuality::Low,
        recordings_dir: dir.to_path_buf(),
        photos_dir: dir.join("photos"),
        record_audio: audio,
        overlay_enabled: overlay,
        ..Config::default()
    };
    SessionContext {
        backend: Arc::new(backend.clone()),
        config: ConfigHandle::new(config),
        telemetry: TelemetryHandle::default(),
        still: None,
    }
}

pub fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

/// Capture time of frame `index` at `fps`, offset by an arbitrary epoch
pub fn frame_time(index: u64, fps: u64) -> Duration {
    Duration::from_secs(100) + Duration::from_nanos(index * 1_000_000_000 / fps)
}

pub fn video_frame(timestamp: Duration) -> Frame {
    Frame::Video(rgba_frame(timestamp))
}

pub fn rgba_frame(timestamp: Duration) -> VideoFrame {
    VideoFrame::new(
        FRAME_WIDTH,
        FRAME_HEIGHT,
        PixelFormat::RGBA,
        vec![90u8; (FRAME_WIDTH * FRAME_HEIGHT * 4) as usize],
        timestamp,
    )
}

/// 1024 mono samples at 44.1 kHz
pub fn audio_frame(timestamp: Duration) -> Frame {
    Frame::Audio(AudioFrame::new(vec![0u8; 2048], 44_100, 1, timestamp))
}

pub fn files_in(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.is_file())
                .collect()
        })
        .unwrap_or_default();
    files.sort();
    files
}
