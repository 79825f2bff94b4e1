// SPDX-License-Identifier: MPL-2.0

//! Keeps audio inside the span covered by video
//!
//! Microphone buffers usually arrive a little ahead of the camera frame that
//! covers them. The gate holds such buffers until video catches up, then at
//! close trims whatever lies past the file's end time, so the container
//! duration is set by video alone.

use super::writer::{Sample, TrackId};
use crate::backends::camera::{AudioFrame, Frame};
use std::collections::VecDeque;
use std::time::Duration;

/// Audio held back until video covers it
#[derive(Debug)]
pub struct AudioGate {
    /// End of the last video sample written
    video_end: Duration,
    pending: VecDeque<(TrackId, Sample)>,
    /// Oldest buffers leave once this many are held
    max_pending: usize,
}

impl AudioGate {
    pub fn new(max_pending: usize) -> Self {
        Self {
            video_end: Duration::ZERO,
            pending: VecDeque::new(),
            max_pending: max_pending.max(1),
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Take an audio sample; returns buffers ready to write, oldest first
    pub fn push_audio(&mut self, track: TrackId, sample: Sample) -> Vec<(TrackId, Sample)> {
        self.pending.push_back((track, sample));
        let mut ready = self.release_covered();
        // A stalled camera must not hold the microphone forever
        while self.pending.len() > self.max_pending {
            if let Some(oldest) = self.pending.pop_front() {
                ready.push(oldest);
            }
        }
        ready
    }

    /// Video now reaches `end`; returns the audio it covers
    pub fn advance_video(&mut self, end: Duration) -> Vec<(TrackId, Sample)> {
        self.video_end = self.video_end.max(end);
        self.release_covered()
    }

    /// Audio to write before closing at `end_time`, and how many buffers
    /// were discarded for starting at or after it
    ///
    /// A buffer straddling `end_time` is cut down to end there.
    pub fn finish(&mut self, end_time: Duration) -> (Vec<(TrackId, Sample)>, usize) {
        let mut ready = Vec::with_capacity(self.pending.len());
        let mut discarded = 0;
        for (track, sample) in self.pending.drain(..) {
            if sample.pts >= end_time {
                discarded += 1;
            } else if sample.pts + sample.duration > end_time {
                let keep = end_time - sample.pts;
                ready.push((track, truncate(sample, keep)));
            } else {
                ready.push((track, sample));
            }
        }
        (ready, discarded)
    }

    fn release_covered(&mut self) -> Vec<(TrackId, Sample)> {
        let mut ready = Vec::new();
        while let Some((_, front)) = self.pending.front() {
            if front.pts + front.duration > self.video_end {
                break;
            }
            if let Some(entry) = self.pending.pop_front() {
                ready.push(entry);
            }
        }
        ready
    }
}

/// Shorten a sample to `keep`, dropping the audio bytes past it
fn truncate(sample: Sample, keep: Duration) -> Sample {
    let frame = match sample.frame {
        Frame::Audio(audio) => {
            let bytes_per_frame = 2 * audio.channels.max(1) as usize;
            let samples = (keep.as_nanos() * audio.sample_rate as u128 / 1_000_000_000) as usize;
            let bytes = (samples * bytes_per_frame).min(audio.data.len());
            Frame::Audio(AudioFrame {
                data: audio.data[..bytes].to_vec().into(),
                ..audio
            })
        }
        video => video,
    };
    Sample {
        pts: sample.pts,
        duration: keep,
        frame,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACK: TrackId = TrackId(1);

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    /// 20 ms of mono audio at 48 kHz
    fn audio(pts_ms: u64) -> Sample {
        Sample {
            pts: ms(pts_ms),
            duration: ms(20),
            frame: Frame::Audio(AudioFrame::new(vec![1u8; 960 * 2], 48_000, 1, ms(pts_ms))),
        }
    }

    fn pts_of(samples: &[(TrackId, Sample)]) -> Vec<u64> {
        samples.iter().map(|(_, s)| s.pts.as_millis() as u64).collect()
    }

    #[test]
    fn test_audio_waits_for_video() {
        let mut gate = AudioGate::new(64);
        assert!(gate.push_audio(TRACK, audio(0)).is_empty());
        assert!(gate.push_audio(TRACK, audio(20)).is_empty());
        assert_eq!(gate.pending(), 2);

        // One frame at 30 fps covers only the first buffer
        assert_eq!(pts_of(&gate.advance_video(ms(33))), vec![0]);
        assert_eq!(pts_of(&gate.advance_video(ms(66))), vec![20]);
        assert_eq!(gate.pending(), 0);
    }

    #[test]
    fn test_covered_audio_passes_straight_through() {
        let mut gate = AudioGate::new(64);
        gate.advance_video(ms(100));
        assert_eq!(pts_of(&gate.push_audio(TRACK, audio(40))), vec![40]);
        assert!(gate.push_audio(TRACK, audio(90)).is_empty());
    }

    #[test]
    fn test_overflow_releases_oldest() {
        let mut gate = AudioGate::new(2);
        gate.push_audio(TRACK, audio(0));
        gate.push_audio(TRACK, audio(20));
        assert_eq!(pts_of(&gate.push_audio(TRACK, audio(40))), vec![0]);
        assert_eq!(gate.pending(), 2);
    }

    #[test]
    fn test_finish_trims_past_end() {
        let mut gate = AudioGate::new(64);
        gate.advance_video(ms(1000));
        for pts in [990, 1010, 1030] {
            gate.push_audio(TRACK, audio(pts));
        }

        let (ready, discarded) = gate.finish(ms(1000));
        assert_eq!(discarded, 2);
        assert_eq!(pts_of(&ready), vec![990]);
        let (_, last) = &ready[0];
        assert_eq!(last.duration, ms(10));
        let Frame::Audio(frame) = &last.frame else {
            panic!("expected audio");
        };
        // 10 ms at 48 kHz mono S16
        assert_eq!(frame.data.len(), 480 * 2);
        assert_eq!(frame.duration(), ms(10));
        assert_eq!(gate.pending(), 0);
    }

    #[test]
    fn test_finish_without_video_discards_all() {
        let mut gate = AudioGate::new(64);
        gate.push_audio(TRACK, audio(0));
        let (ready, discarded) = gate.finish(Duration::ZERO);
        assert!(ready.is_empty());
        assert_eq!(discarded, 1);
    }
}
