// SPDX-License-Identifier: MPL-2.0

//! Per-track adaptor between the session and the container writer

use super::writer::{ContainerWriter, Sample, TrackId};
use crate::backends::camera::MediaKind;
use crate::constants::timing::FRAME_LOG_INTERVAL;
use crate::errors::RecordingError;
use std::time::Duration;
use tracing::debug;

/// Wraps one writer track: readiness, ordered append and finishing
///
/// Once finished a track never accepts another sample.
#[derive(Debug)]
pub struct TrackAdaptor {
    kind: MediaKind,
    id: TrackId,
    finished: bool,
    appended: u64,
    last_pts: Option<Duration>,
    end_time: Duration,
}

impl TrackAdaptor {
    pub fn new(kind: MediaKind, id: TrackId) -> Self {
        Self {
            kind,
            id,
            finished: false,
            appended: 0,
            last_pts: None,
            end_time: Duration::ZERO,
        }
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn id(&self) -> TrackId {
        self.id
    }

    pub fn is_ready_for_more_data(&self, writer: &dyn ContainerWriter) -> bool {
        !self.finished && writer.is_ready_for_more_data(self.id)
    }

    /// Whether a sample at `pts` keeps this track's timestamps increasing
    pub fn accepts(&self, pts: Duration) -> bool {
        !self.finished && self.last_pts.is_none_or(|last| pts > last)
    }

    pub fn append(
        &mut self,
        writer: &mut dyn ContainerWriter,
        sample: Sample,
    ) -> Result<(), RecordingError> {
        if self.finished {
            return Err(RecordingError::AppendFailed(format!(
                "{} track already finished",
                self.kind
            )));
        }
        if !self.accepts(sample.pts) {
            return Err(RecordingError::AppendFailed(format!(
                "{} sample at {:?} is not after {:?}",
                self.kind, sample.pts, self.last_pts
            )));
        }

        let (pts, duration) = (sample.pts, sample.duration);
        writer.append(self.id, sample)?;

        self.appended += 1;
        self.last_pts = Some(pts);
        self.end_time = self.end_time.max(pts + duration);
        if self.appended % FRAME_LOG_INTERVAL == 0 {
            debug!(track = %self.kind, appended = self.appended, pts = ?pts, "Track progress");
        }
        Ok(())
    }

    /// Idempotent; only the first call reaches the writer
    pub fn mark_finished(&mut self, writer: &mut dyn ContainerWriter) {
        if self.finished {
            return;
        }
        self.finished = true;
        writer.mark_finished(self.id);
        debug!(track = %self.kind, appended = self.appended, "Track finished");
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn appended(&self) -> u64 {
        self.appended
    }

    pub fn last_pts(&self) -> Option<Duration> {
        self.last_pts
    }

    /// End of the last appended sample
    pub fn end_time(&self) -> Duration {
        self.end_time
    }
}
