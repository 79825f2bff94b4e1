// SPDX-License-Identifier: MPL-2.0

//! Bridges capture callbacks into the recording session
//!
//! Capture sources push frames from their own threads. The adapter drops
//! what the session could never use (incomplete buffers, anything outside a
//! recording) before it reaches the session lock, and counts it.

use super::session::{RecordingSession, SubmitOutcome};
use crate::backends::camera::{AudioFrame, Frame, FrameSink, MediaKind, VideoFrame};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

/// Frame counts seen at the adapter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceStats {
    pub video_received: u64,
    pub audio_received: u64,
    /// Discarded because the buffer was not ready
    pub discarded_unready: u64,
    /// Discarded because no recording was running
    pub discarded_idle: u64,
    /// Forwarded but dropped by the session
    pub dropped_by_session: u64,
}

#[derive(Default)]
struct Counters {
    video_received: AtomicU64,
    audio_received: AtomicU64,
    discarded_unready: AtomicU64,
    discarded_idle: AtomicU64,
    dropped_by_session: AtomicU64,
}

/// [`FrameSink`] feeding a [`RecordingSession`]
pub struct FrameSourceAdapter {
    session: RecordingSession,
    counters: Counters,
}

impl FrameSourceAdapter {
    pub fn new(session: RecordingSession) -> Self {
        Self {
            session,
            counters: Counters::default(),
        }
    }

    pub fn session(&self) -> &RecordingSession {
        &self.session
    }

    pub fn stats(&self) -> SourceStats {
        let c = &self.counters;
        SourceStats {
            video_received: c.video_received.load(Ordering::Relaxed),
            audio_received: c.audio_received.load(Ordering::Relaxed),
            discarded_unready: c.discarded_unready.load(Ordering::Relaxed),
            discarded_idle: c.discarded_idle.load(Ordering::Relaxed),
            dropped_by_session: c.dropped_by_session.load(Ordering::Relaxed),
        }
    }

    /// Forward one frame; returns whether the session wrote it
    pub fn deliver(&self, frame: Frame) -> bool {
        match frame.kind() {
            MediaKind::Video => &self.counters.video_received,
            MediaKind::Audio => &self.counters.audio_received,
        }
        .fetch_add(1, Ordering::Relaxed);

        if !frame.is_ready() {
            self.counters.discarded_unready.fetch_add(1, Ordering::Relaxed);
            trace!(kind = %frame.kind(), "Discarding unready buffer");
            return false;
        }
        if !self.session.recording_in_progress() {
            self.counters.discarded_idle.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        match self.session.submit_frame(frame) {
            SubmitOutcome::Appended => true,
            SubmitOutcome::Dropped(_) => {
                self.counters.dropped_by_session.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }
}

impl FrameSink for FrameSourceAdapter {
    fn on_video_frame(&self, frame: VideoFrame) {
        self.deliver(Frame::Video(frame));
    }

    fn on_audio_frame(&self, frame: AudioFrame) {
        self.deliver(Frame::Audio(frame));
    }
}
