// SPDX-License-Identifier: GPL-3.0-only

//! Synthetic capture source
//!
//! Scrolling color bars at the configured frame rate plus an optional 440 Hz
//! tone, each on its own delivery thread. Used by the CLI (`--source test`)
//! and by tests that need a live source without hardware.

use super::frame_loop::{DeliveryLoopController, LoopAction};
use super::{AudioFrame, CaptureSource, FrameSink, PixelFormat, VideoFrame};
use crate::constants::recording::{AUDIO_CHUNK_SAMPLES, AUDIO_CHANNELS, AUDIO_SAMPLE_RATE};
use crate::errors::CaptureError;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::info;

/// SMPTE-style bar colors (RGB)
const BARS: [[u8; 3]; 7] = [
    [192, 192, 192],
    [192, 192, 0],
    [0, 192, 192],
    [0, 192, 0],
    [192, 0, 192],
    [192, 0, 0],
    [0, 0, 192],
];

const TONE_HZ: f64 = 440.0;

pub struct TestPatternSource {
    width: u32,
    height: u32,
    frame_rate: u32,
    audio: bool,
    /// Origin of the source's monotonic clock
    epoch: Instant,
    latest: Arc<Mutex<Option<VideoFrame>>>,
    loops: Mutex<Vec<DeliveryLoopController>>,
}

impl TestPatternSource {
    pub fn new(width: u32, height: u32, frame_rate: u32, audio: bool) -> Self {
        Self {
            width,
            height,
            frame_rate: frame_rate.max(1),
            audio,
            epoch: Instant::now(),
            latest: Arc::new(Mutex::new(None)),
            loops: Mutex::new(Vec::new()),
        }
    }

    /// Render one RGBA frame; bars scroll one column step per tick
    pub fn render(width: u32, height: u32, tick: u64) -> Vec<u8> {
        let mut pixels = vec![0u8; width as usize * height as usize * 4];
        let bar_width = (width as usize / BARS.len()).max(1);
        let shift = (tick as usize * 4) % (width.max(1) as usize);

        for (y, row) in pixels.chunks_exact_mut(width as usize * 4).enumerate() {
            // Lower quarter is a gray ramp so the overlay band has something to sit on
            let ramp = y >= height as usize * 3 / 4;
            for (x, px) in row.chunks_exact_mut(4).enumerate() {
                let rgb = if ramp {
                    let v = (x * 255 / width.max(1) as usize) as u8;
                    [v, v, v]
                } else {
                    BARS[((x + shift) / bar_width) % BARS.len()]
                };
                px.copy_from_slice(&[rgb[0], rgb[1], rgb[2], 255]);
            }
        }
        pixels
    }

    /// One chunk of the tone starting at sample `offset`
    fn tone(offset: u64, samples: usize, sample_rate: u32) -> Vec<u8> {
        let amplitude = i16::MAX as f64 * 0.2;
        (0..samples as u64)
            .flat_map(|i| {
                let t = (offset + i) as f64 / sample_rate as f64;
                let value = (amplitude * (2.0 * std::f64::consts::PI * TONE_HZ * t).sin()) as i16;
                value.to_le_bytes()
            })
            .collect()
    }

    fn frame_at(&self, tick: u64, timestamp: Duration) -> VideoFrame {
        VideoFrame::new(
            self.width,
            self.height,
            PixelFormat::RGBA,
            Self::render(self.width, self.height, tick),
            timestamp,
        )
    }
}

impl CaptureSource for TestPatternSource {
    fn start(&self, sink: Arc<dyn FrameSink>) -> Result<(), CaptureError> {
        let mut loops = self.loops.lock().unwrap_or_else(PoisonError::into_inner);
        if !loops.is_empty() {
            return Err(CaptureError::AlreadyRunning);
        }

        info!(
            width = self.width,
            height = self.height,
            fps = self.frame_rate,
            audio = self.audio,
            "Starting test pattern source"
        );

        let (width, height, epoch) = (self.width, self.height, self.epoch);
        let latest = Arc::clone(&self.latest);
        let video_sink = Arc::clone(&sink);
        loops.push(DeliveryLoopController::start(
            "test-pattern-video",
            Duration::from_secs(1) / self.frame_rate,
            move |tick| {
                let frame = VideoFrame::new(
                    width,
                    height,
                    PixelFormat::RGBA,
                    Self::render(width, height, tick),
                    epoch.elapsed(),
                );
                *latest.lock().unwrap_or_else(PoisonError::into_inner) = Some(frame.clone());
                video_sink.on_video_frame(frame);
                LoopAction::Continue
            },
        ));

        if self.audio {
            let chunk = Duration::from_secs_f64(AUDIO_CHUNK_SAMPLES as f64 / AUDIO_SAMPLE_RATE as f64);
            let first = epoch.elapsed();
            loops.push(DeliveryLoopController::start("test-pattern-audio", chunk, move |tick| {
                let offset = tick * AUDIO_CHUNK_SAMPLES as u64;
                let timestamp = first
                    + Duration::from_nanos(offset * 1_000_000_000 / AUDIO_SAMPLE_RATE as u64);
                sink.on_audio_frame(AudioFrame::new(
                    Self::tone(offset, AUDIO_CHUNK_SAMPLES, AUDIO_SAMPLE_RATE),
                    AUDIO_SAMPLE_RATE,
                    AUDIO_CHANNELS,
                    timestamp,
                ));
                LoopAction::Continue
            }));
        }

        Ok(())
    }

    fn stop(&self) {
        let loops: Vec<_> = self
            .loops
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for mut controller in loops {
            controller.stop();
        }
    }

    fn capture_still(&self) -> Result<VideoFrame, CaptureError> {
        if let Some(frame) = self
            .latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
        {
            return Ok(frame);
        }
        // Not streaming: render on demand
        Ok(self.frame_at(0, self.epoch.elapsed()))
    }

    fn has_audio(&self) -> bool {
        self.audio
    }
}

impl Drop for TestPatternSource {
    fn drop(&mut self) {
        self.stop();
    }
}
