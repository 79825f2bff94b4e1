// SPDX-License-Identifier: MPL-2.0

//! Recording session: state machine, admission and drain-then-finalize
//!
//! ```text
//!  Idle ──start()──▶ Starting ──writer ready──▶ Recording ──stop()──▶ Stopping
//!   ▲                   │                                                │
//!   └──── open failed ──┘                         drained + finalized ───┘
//! ```
//!
//! One mutex guards the writer, both tracks, the time anchor and the frame
//! counter. A frame is admitted under the lock, composited outside it, then
//! appended under the lock again. `stop()` blocks new admissions, waits on
//! the condvar until every admitted frame has been appended, and finalizes
//! the file with the lock released.

use super::track::TrackAdaptor;
use super::writer::{ContainerBackend, ContainerWriter, Sample, TrackId, TrackSpec};
use crate::backends::camera::{Frame, MediaKind};
use crate::config::{ConfigHandle, RecordingConfig};
use crate::errors::{PhotoError, RecordingError};
use crate::media::OverlayCompositor;
use crate::pipelines::photo::StillImagePath;
use crate::storage;
use crate::telemetry::TelemetryHandle;
use chrono::{DateTime, Local};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

/// Collaborators a session is built from
#[derive(Clone)]
pub struct SessionContext {
    pub backend: Arc<dyn ContainerBackend>,
    /// Read once per `start()`
    pub config: ConfigHandle,
    pub telemetry: TelemetryHandle,
    pub still: Option<Arc<dyn StillImagePath>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Starting,
    Recording,
    Stopping,
}

/// Returned by a successful `start()`
#[derive(Debug, Clone, PartialEq)]
pub struct StartInfo {
    pub output_path: PathBuf,
    pub started_at: DateTime<Local>,
    pub has_audio: bool,
    pub has_overlay: bool,
    /// True when the call joined a recording that was already running
    pub already_recording: bool,
}

/// Counters for one track
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackStats {
    pub appended: u64,
    pub dropped_not_recording: u64,
    pub dropped_not_ready: u64,
    pub dropped_unavailable: u64,
    pub dropped_out_of_order: u64,
    /// Video frames whose size differs from the configured resolution
    pub dropped_format_mismatch: u64,
    /// Audio that arrived before the first video frame anchored the timeline
    pub dropped_before_start: u64,
    pub append_failed: u64,
}

impl TrackStats {
    pub fn dropped(&self) -> u64 {
        self.dropped_not_recording
            + self.dropped_not_ready
            + self.dropped_unavailable
            + self.dropped_out_of_order
            + self.dropped_format_mismatch
            + self.dropped_before_start
            + self.append_failed
    }
}

/// Counters for the current (or most recent) recording
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordingStats {
    pub video: TrackStats,
    pub audio: TrackStats,
    /// Frames written without overlay because compositing failed
    pub overlay_fallbacks: u64,
}

impl RecordingStats {
    pub fn track(&self, kind: MediaKind) -> &TrackStats {
        match kind {
            MediaKind::Video => &self.video,
            MediaKind::Audio => &self.audio,
        }
    }

    fn track_mut(&mut self, kind: MediaKind) -> &mut TrackStats {
        match kind {
            MediaKind::Video => &mut self.video,
            MediaKind::Audio => &mut self.audio,
        }
    }
}

/// Result of a completed recording
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingSummary {
    pub output_path: PathBuf,
    pub started_at: DateTime<Local>,
    /// End time of the last video frame
    pub duration: Duration,
    /// Video frames written
    pub frame_count: i64,
    /// Audio buffers written
    pub audio_buffers: u64,
    pub stats: RecordingStats,
}

/// Why a frame was not written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    NotRecording,
    /// The track's encoder queue is full
    NotReady,
    /// Buffer not fully available (still being filled, or truncated)
    BufferUnavailable,
    OutOfOrder,
    /// Frame size differs from the resolution the track was opened with
    FormatMismatch,
    /// Audio ahead of the first video frame
    BeforeStart,
    AppendFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Appended,
    Dropped(DropReason),
}

/// Writer, tracks and timeline of the running recording
struct ActiveRecording {
    writer: Box<dyn ContainerWriter>,
    config: RecordingConfig,
    video: TrackAdaptor,
    audio: Option<TrackAdaptor>,
    /// Capture timestamp of the first admitted video frame
    anchor: Option<Duration>,
    /// Last admitted pts per track, so admission order is append order
    admitted_video: Option<Duration>,
    admitted_audio: Option<Duration>,
    frame_counter: i64,
    info: StartInfo,
}

impl ActiveRecording {
    fn track(&self, kind: MediaKind) -> Option<&TrackAdaptor> {
        match kind {
            MediaKind::Video => Some(&self.video),
            MediaKind::Audio => self.audio.as_ref(),
        }
    }

    fn track_and_writer(
        &mut self,
        kind: MediaKind,
    ) -> Option<(&mut TrackAdaptor, &mut dyn ContainerWriter)> {
        let writer: &mut dyn ContainerWriter = self.writer.as_mut();
        let track = match kind {
            MediaKind::Video => &mut self.video,
            MediaKind::Audio => self.audio.as_mut()?,
        };
        Some((track, writer))
    }

    fn admitted_mut(&mut self, kind: MediaKind) -> &mut Option<Duration> {
        match kind {
            MediaKind::Video => &mut self.admitted_video,
            MediaKind::Audio => &mut self.admitted_audio,
        }
    }

    /// Presentation time for a frame, or why it cannot have one
    fn presentation_time(&mut self, frame: &Frame) -> Result<Duration, DropReason> {
        let captured = frame.timestamp();
        let anchor = match (frame.kind(), self.anchor) {
            (_, Some(anchor)) => anchor,
            (MediaKind::Video, None) => *self.anchor.insert(captured),
            (MediaKind::Audio, None) => return Err(DropReason::BeforeStart),
        };
        let pts = match captured.checked_sub(anchor) {
            Some(pts) => pts,
            None if frame.kind() == MediaKind::Audio => return Err(DropReason::BeforeStart),
            None => return Err(DropReason::OutOfOrder),
        };

        let admitted = self.admitted_mut(frame.kind());
        if admitted.is_some_and(|last| pts <= last) {
            return Err(DropReason::OutOfOrder);
        }
        *admitted = Some(pts);
        Ok(pts)
    }

    fn finalize(mut self) -> Result<(), RecordingError> {
        self.video.mark_finished(self.writer.as_mut());
        if let Some(audio) = self.audio.as_mut() {
            audio.mark_finished(self.writer.as_mut());
        }

        let end_time = self.end_time();
        debug!(
            path = %self.info.output_path.display(),
            end_time = ?end_time,
            frames = self.frame_counter,
            "Finalizing container"
        );
        self.writer.finish_writing(end_time).map_err(|e| {
            let reason = match e {
                RecordingError::FinalizeFailed(msg) => msg,
                other => other.to_string(),
            };
            error!(
                path = %self.info.output_path.display(),
                error = %reason,
                "Finalize failed, recording may be unplayable"
            );
            RecordingError::FinalizeFailed(reason)
        })
    }

    /// `last_video_pts + frame_interval`
    fn end_time(&self) -> Duration {
        match self.video.last_pts() {
            Some(last) => last + self.config.frame_interval(),
            None => Duration::ZERO,
        }
    }
}

struct Inner {
    state: SessionState,
    active: Option<ActiveRecording>,
    in_flight: usize,
    stats: RecordingStats,
    /// Bumped by every start attempt so waiters can find their outcome
    start_attempt: u64,
    last_start: Option<Result<StartInfo, RecordingError>>,
    last_outcome: Option<Result<RecordingSummary, RecordingError>>,
}

struct Shared {
    inner: Mutex<Inner>,
    /// Signalled on state changes and when `in_flight` reaches zero
    changed: Condvar,
    /// Mirrors `state == Recording` for lock-free reads
    recording: AtomicBool,
    ctx: SessionContext,
    compositor: OverlayCompositor,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait_while<'a>(
        &self,
        guard: MutexGuard<'a, Inner>,
        condition: impl FnMut(&mut Inner) -> bool,
    ) -> MutexGuard<'a, Inner> {
        self.changed
            .wait_while(guard, condition)
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, inner: &mut Inner, state: SessionState) {
        trace!(from = ?inner.state, to = ?state, "Session state change");
        inner.state = state;
        self.recording
            .store(state == SessionState::Recording, Ordering::SeqCst);
        self.changed.notify_all();
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        let inner = self.inner.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(active) = inner.active.take() {
            warn!(
                path = %active.info.output_path.display(),
                "Session dropped while recording, finalizing"
            );
            let _ = active.finalize();
        }
    }
}

/// Holds one admitted frame's slot in the in-flight count
///
/// Dropping without [`InFlight::finish`] (e.g. on unwind) still releases the
/// slot, so `stop()` cannot wait forever.
struct InFlight<'a> {
    shared: &'a Shared,
}

impl InFlight<'_> {
    fn finish<T>(self, f: impl FnOnce(&mut Inner) -> T) -> T {
        let mut inner = self.shared.lock();
        let out = f(&mut *inner);
        release(self.shared, &mut inner);
        std::mem::forget(self);
        out
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut inner = self.shared.lock();
        release(self.shared, &mut inner);
    }
}

fn release(shared: &Shared, inner: &mut Inner) {
    inner.in_flight -= 1;
    if inner.in_flight == 0 {
        shared.changed.notify_all();
    }
}

/// Frame admitted for writing
struct Admission {
    kind: MediaKind,
    pts: Duration,
    duration: Duration,
    overlay: bool,
}

enum StopRole {
    /// This caller moved the session to Stopping and must finish it
    Owner,
    Done(Result<RecordingSummary, RecordingError>),
}

/// Orchestrates one recording at a time
///
/// Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct RecordingSession {
    shared: Arc<Shared>,
}

impl RecordingSession {
    pub fn new(ctx: SessionContext) -> Self {
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    state: SessionState::Idle,
                    active: None,
                    in_flight: 0,
                    stats: RecordingStats::default(),
                    start_attempt: 0,
                    last_start: None,
                    last_outcome: None,
                }),
                changed: Condvar::new(),
                recording: AtomicBool::new(false),
                ctx,
                compositor: OverlayCompositor::new(),
            }),
        }
    }

    pub fn state(&self) -> SessionState {
        self.shared.lock().state
    }

    /// True only while frames are being accepted
    pub fn recording_in_progress(&self) -> bool {
        self.shared.recording.load(Ordering::SeqCst)
    }

    /// Counters of the current or most recent recording
    pub fn stats(&self) -> RecordingStats {
        self.shared.lock().stats
    }

    /// Info of the running recording, if any
    pub fn current(&self) -> Option<StartInfo> {
        self.shared.lock().active.as_ref().map(|a| a.info.clone())
    }

    /// Begin a new recording
    ///
    /// Joins the running recording if there is one. A caller arriving while
    /// another start is in progress gets that start's outcome.
    pub fn start(&self) -> Result<StartInfo, RecordingError> {
        let mut inner = self.shared.lock();
        match inner.state {
            SessionState::Recording => {
                return inner
                    .active
                    .as_ref()
                    .map(|active| StartInfo {
                        already_recording: true,
                        ..active.info.clone()
                    })
                    .ok_or(RecordingError::Busy("recording without an open writer"));
            }
            SessionState::Starting => {
                let attempt = inner.start_attempt;
                inner = self
                    .shared
                    .wait_while(inner, |i| i.state == SessionState::Starting);
                if inner.start_attempt == attempt
                    && let Some(outcome) = inner.last_start.clone()
                {
                    return outcome.map(|info| StartInfo {
                        already_recording: true,
                        ..info
                    });
                }
                return Err(RecordingError::Busy("recording state changed during start"));
            }
            SessionState::Stopping => return Err(RecordingError::Busy("stop in progress")),
            SessionState::Idle => {}
        }

        inner.start_attempt += 1;
        inner.last_start = None;
        self.shared.set_state(&mut inner, SessionState::Starting);
        drop(inner);

        let opened = self.open_recording();

        let mut inner = self.shared.lock();
        let result = match opened {
            Ok(active) => {
                let info = active.info.clone();
                inner.active = Some(active);
                inner.stats = RecordingStats::default();
                self.shared.set_state(&mut inner, SessionState::Recording);
                info!(
                    path = %info.output_path.display(),
                    audio = info.has_audio,
                    overlay = info.has_overlay,
                    "Recording started"
                );
                Ok(info)
            }
            Err(e) => {
                self.shared.set_state(&mut inner, SessionState::Idle);
                warn!(error = %e, "Recording start failed");
                Err(e)
            }
        };
        inner.last_start = Some(result.clone());
        result
    }

    /// Runs with the lock released
    fn open_recording(&self) -> Result<ActiveRecording, RecordingError> {
        let settings = self.shared.ctx.config.get();
        let config = settings.recording_config();
        let backend = &self.shared.ctx.backend;

        let started_at = Local::now();
        let path = storage::allocate_output_path(
            &settings.recordings_dir,
            started_at,
            backend.file_extension(&config),
        )
        .map_err(|e| {
            RecordingError::StartFailed(format!(
                "cannot create {}: {}",
                settings.recordings_dir.display(),
                e
            ))
        })?;

        let mut writer = backend.open(&path, &config).map_err(|e| {
            remove_partial(&path);
            start_failed(e)
        })?;

        let (video_id, audio_id) = match declare_tracks(writer.as_mut(), &config) {
            Ok(ids) => ids,
            Err(e) => {
                drop(writer);
                remove_partial(&path);
                return Err(start_failed(e));
            }
        };

        let info = StartInfo {
            output_path: path,
            started_at,
            has_audio: audio_id.is_some(),
            has_overlay: config.has_overlay(),
            already_recording: false,
        };
        Ok(ActiveRecording {
            writer,
            video: TrackAdaptor::new(MediaKind::Video, video_id),
            audio: audio_id.map(|id| TrackAdaptor::new(MediaKind::Audio, id)),
            config,
            anchor: None,
            admitted_video: None,
            admitted_audio: None,
            frame_counter: 0,
            info,
        })
    }

    /// Offer one frame to the running recording
    ///
    /// Never blocks on I/O and never fails: frames that cannot be written
    /// right now are dropped and counted.
    pub fn submit_frame(&self, frame: Frame) -> SubmitOutcome {
        let kind = frame.kind();
        let admission = {
            let mut inner = self.shared.lock();
            match self.admit(&mut inner, &frame) {
                Ok(admission) => {
                    inner.in_flight += 1;
                    admission
                }
                Err(reason) => {
                    let stats = inner.stats.track_mut(kind);
                    match reason {
                        DropReason::NotRecording => stats.dropped_not_recording += 1,
                        DropReason::NotReady => stats.dropped_not_ready += 1,
                        DropReason::BufferUnavailable => stats.dropped_unavailable += 1,
                        DropReason::OutOfOrder => stats.dropped_out_of_order += 1,
                        DropReason::FormatMismatch => stats.dropped_format_mismatch += 1,
                        DropReason::BeforeStart => stats.dropped_before_start += 1,
                        DropReason::AppendFailed => stats.append_failed += 1,
                    }
                    trace!(kind = %kind, reason = ?reason, "Frame dropped");
                    return SubmitOutcome::Dropped(reason);
                }
            }
        };
        let slot = InFlight {
            shared: &self.shared,
        };

        let mut overlay_failed = false;
        let frame = match frame {
            Frame::Video(video) if admission.overlay => {
                let telemetry = self.shared.ctx.telemetry.snapshot();
                match self.shared.compositor.compose(&video, &telemetry, Local::now()) {
                    Ok(composed) => Frame::Video(composed),
                    Err(e) => {
                        debug!(error = %e, "Overlay skipped, writing original frame");
                        overlay_failed = true;
                        Frame::Video(video)
                    }
                }
            }
            other => other,
        };

        slot.finish(|inner| {
            if overlay_failed {
                inner.stats.overlay_fallbacks += 1;
            }
            let Some(active) = inner.active.as_mut() else {
                inner.stats.track_mut(kind).dropped_not_recording += 1;
                return SubmitOutcome::Dropped(DropReason::NotRecording);
            };
            let Some((track, writer)) = active.track_and_writer(admission.kind) else {
                inner.stats.track_mut(kind).dropped_not_recording += 1;
                return SubmitOutcome::Dropped(DropReason::NotRecording);
            };
            if !track.accepts(admission.pts) {
                inner.stats.track_mut(kind).dropped_out_of_order += 1;
                return SubmitOutcome::Dropped(DropReason::OutOfOrder);
            }

            let sample = Sample {
                pts: admission.pts,
                duration: admission.duration,
                frame,
            };
            match track.append(writer, sample) {
                Ok(()) => {
                    if kind == MediaKind::Video {
                        active.frame_counter += 1;
                    }
                    inner.stats.track_mut(kind).appended += 1;
                    SubmitOutcome::Appended
                }
                Err(e) => {
                    warn!(kind = %kind, error = %e, "Append failed, frame dropped");
                    inner.stats.track_mut(kind).append_failed += 1;
                    SubmitOutcome::Dropped(DropReason::AppendFailed)
                }
            }
        })
    }

    /// Admission checks, all under the lock
    fn admit(&self, inner: &mut Inner, frame: &Frame) -> Result<Admission, DropReason> {
        if inner.state != SessionState::Recording {
            return Err(DropReason::NotRecording);
        }
        let complete = match frame {
            Frame::Video(video) => video.ready && video.is_complete(),
            Frame::Audio(audio) => audio.ready && !audio.data.is_empty(),
        };
        if !complete {
            return Err(DropReason::BufferUnavailable);
        }

        let active = inner.active.as_mut().ok_or(DropReason::NotRecording)?;
        let kind = frame.kind();
        let track = active.track(kind).ok_or(DropReason::NotRecording)?;
        if let Frame::Video(video) = frame
            && (video.width, video.height) != (active.config.width, active.config.height)
        {
            return Err(DropReason::FormatMismatch);
        }
        if !track.is_ready_for_more_data(active.writer.as_ref()) {
            return Err(DropReason::NotReady);
        }

        let pts = active.presentation_time(frame)?;
        let duration = match frame {
            Frame::Video(_) => active.config.frame_interval(),
            Frame::Audio(audio) => audio.duration(),
        };
        Ok(Admission {
            kind,
            pts,
            duration,
            overlay: kind == MediaKind::Video && active.config.has_overlay(),
        })
    }

    /// Stop the running recording and finalize its file
    ///
    /// Blocks until every admitted frame is written and the container is
    /// closed. Concurrent callers all receive the same outcome. When idle,
    /// returns the outcome of the last stop.
    pub fn stop(&self) -> Result<RecordingSummary, RecordingError> {
        match self.begin_stop(true) {
            StopRole::Owner => self.finish_stop(),
            StopRole::Done(outcome) => outcome,
        }
    }

    /// Stop on a background thread and hand the outcome to `on_complete`
    ///
    /// New frames are refused as soon as this returns.
    pub fn stop_with<F>(&self, on_complete: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<RecordingSummary, RecordingError>) + Send + 'static,
    {
        let owner = matches!(self.begin_stop(false), StopRole::Owner);
        let session = self.clone();
        thread::spawn(move || {
            let outcome = if owner {
                session.finish_stop()
            } else {
                session.stop()
            };
            on_complete(outcome);
        })
    }

    /// Stop and delete the output file
    ///
    /// For recordings abandoned before their source delivered anything,
    /// so no empty clip is left behind. A failed finalize is not an error
    /// here since the file is removed either way.
    pub fn discard(&self) -> Result<(), RecordingError> {
        let path = {
            let inner = self.shared.lock();
            inner.active.as_ref().map(|a| a.info.output_path.clone())
        };
        let Some(path) = path else {
            return Err(RecordingError::NotRecording);
        };
        let outcome = self.stop();
        remove_partial(&path);
        info!(path = %path.display(), "Recording discarded");
        match outcome {
            Ok(_) | Err(RecordingError::FinalizeFailed(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Stop without blocking the async runtime
    ///
    /// New frames are refused as soon as this is called, before the
    /// returned future is polled.
    pub fn stop_async(
        &self,
    ) -> impl Future<Output = Result<RecordingSummary, RecordingError>> + Send + 'static {
        let owner = matches!(self.begin_stop(false), StopRole::Owner);
        let session = self.clone();
        async move {
            tokio::task::spawn_blocking(move || {
                if owner {
                    session.finish_stop()
                } else {
                    session.stop()
                }
            })
            .await
            .map_err(|e| RecordingError::StopFailed(format!("stop task failed: {}", e)))?
        }
    }

    /// Move Recording to Stopping; with `wait`, resolve every other state
    fn begin_stop(&self, wait: bool) -> StopRole {
        let mut inner = self.shared.lock();
        loop {
            match inner.state {
                SessionState::Recording => {
                    self.shared.set_state(&mut inner, SessionState::Stopping);
                    info!("Stopping recording, draining in-flight frames");
                    return StopRole::Owner;
                }
                _ if !wait => {
                    // Resolved by a blocking stop() on the caller's thread
                    return StopRole::Done(Err(RecordingError::Busy("not recording yet")));
                }
                SessionState::Idle => {
                    return StopRole::Done(
                        inner
                            .last_outcome
                            .clone()
                            .unwrap_or(Err(RecordingError::NotRecording)),
                    );
                }
                SessionState::Starting => {
                    inner = self
                        .shared
                        .wait_while(inner, |i| i.state == SessionState::Starting);
                }
                SessionState::Stopping => {
                    inner = self
                        .shared
                        .wait_while(inner, |i| i.state == SessionState::Stopping);
                    return StopRole::Done(inner.last_outcome.clone().unwrap_or(Err(
                        RecordingError::StopFailed("stop ended without an outcome".to_string()),
                    )));
                }
            }
        }
    }

    /// Drain, finalize and return to Idle; caller must own the stop
    fn finish_stop(&self) -> Result<RecordingSummary, RecordingError> {
        let inner = self.shared.lock();
        let mut inner = self.shared.wait_while(inner, |i| i.in_flight > 0);
        let Some(active) = inner.active.take() else {
            self.shared.set_state(&mut inner, SessionState::Idle);
            return Err(RecordingError::NotRecording);
        };
        drop(inner);

        let output_path = active.info.output_path.clone();
        let started_at = active.info.started_at;
        let duration = active.end_time();
        let frame_count = active.frame_counter;
        let audio_buffers = active.audio.as_ref().map_or(0, |a| a.appended());
        let finalized = active.finalize();

        let mut inner = self.shared.lock();
        let outcome = finalized.map(|()| RecordingSummary {
            output_path,
            started_at,
            duration,
            frame_count,
            audio_buffers,
            stats: inner.stats,
        });
        if let Ok(summary) = &outcome {
            info!(
                path = %summary.output_path.display(),
                frames = summary.frame_count,
                duration = ?summary.duration,
                dropped = summary.stats.video.dropped() + summary.stats.audio.dropped(),
                "Recording saved"
            );
        }
        inner.last_outcome = Some(outcome.clone());
        self.shared.set_state(&mut inner, SessionState::Idle);
        outcome
    }

    /// Forward to the still-image path; independent of recording state
    pub fn take_still_image(&self) -> Result<PathBuf, PhotoError> {
        match &self.shared.ctx.still {
            Some(still) => still.capture_still(),
            None => Err(PhotoError::Unavailable),
        }
    }
}

fn declare_tracks(
    writer: &mut dyn ContainerWriter,
    config: &RecordingConfig,
) -> Result<(TrackId, Option<TrackId>), RecordingError> {
    let video = writer.add_track(&TrackSpec::video(config))?;
    let audio = if config.has_audio() {
        Some(writer.add_track(&TrackSpec::audio(config))?)
    } else {
        None
    };
    writer.start_writing()?;
    Ok((video, audio))
}

fn start_failed(e: RecordingError) -> RecordingError {
    match e {
        RecordingError::StartFailed(_) => e,
        other => RecordingError::StartFailed(other.to_string()),
    }
}

fn remove_partial(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "Removed partial output"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Could not remove partial output"),
    }
}
