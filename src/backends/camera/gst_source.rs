// SPDX-License-Identifier: GPL-3.0-only

//! Default-device capture through GStreamer
//!
//! ```text
//! autovideosrc ! videoconvert ! videoscale ! videorate ! RGBA caps ! appsink
//! autoaudiosrc ! audioconvert ! audioresample ! S16LE caps ! appsink
//! ```
//!
//! Both branches live in one pipeline so their buffer timestamps share the
//! pipeline's running time.

use super::{AudioFrame, CaptureSource, FrameData, FrameSink, PixelFormat, VideoFrame};
use crate::constants::recording::{AUDIO_CHANNELS, AUDIO_SAMPLE_RATE};
use crate::constants::timing;
use crate::errors::CaptureError;
use gstreamer as gst;
use gstreamer::prelude::*;
use gstreamer_app::{AppSink, AppSinkCallbacks};
use gstreamer_video::VideoInfo;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

struct Running {
    pipeline: gst::Pipeline,
    appsinks: Vec<AppSink>,
}

pub struct GstCaptureSource {
    width: u32,
    height: u32,
    frame_rate: u32,
    audio: bool,
    latest: Arc<Mutex<Option<VideoFrame>>>,
    running: Mutex<Option<Running>>,
}

impl GstCaptureSource {
    pub fn new(width: u32, height: u32, frame_rate: u32, audio: bool) -> Self {
        Self {
            width,
            height,
            frame_rate: frame_rate.max(1),
            audio,
            latest: Arc::new(Mutex::new(None)),
            running: Mutex::new(None),
        }
    }

    fn pipeline_description(&self) -> String {
        let mut desc = format!(
            "autovideosrc ! videoconvert ! videoscale ! videorate ! \
             video/x-raw,format=RGBA,width={},height={},framerate={}/1 ! \
             appsink name=video max-buffers=2 drop=true sync=false",
            self.width, self.height, self.frame_rate
        );
        if self.audio {
            desc.push_str(&format!(
                " autoaudiosrc ! audioconvert ! audioresample ! \
                 audio/x-raw,format=S16LE,layout=interleaved,rate={},channels={} ! \
                 appsink name=audio max-buffers=8 drop=true sync=false",
                AUDIO_SAMPLE_RATE, AUDIO_CHANNELS
            ));
        }
        desc
    }

    fn video_callbacks(
        sink: Arc<dyn FrameSink>,
        latest: Arc<Mutex<Option<VideoFrame>>>,
    ) -> AppSinkCallbacks {
        let counter = AtomicU64::new(0);
        AppSinkCallbacks::builder()
            .new_sample(move |appsink| {
                let frame_num = counter.fetch_add(1, Ordering::Relaxed);
                let sample = appsink.pull_sample().map_err(|_| gst::FlowError::Eos)?;
                let caps = sample.caps().ok_or(gst::FlowError::Error)?;
                let info = VideoInfo::from_caps(caps).map_err(|_| gst::FlowError::Error)?;
                let format = PixelFormat::from_gst_format(info.format().to_str())
                    .ok_or(gst::FlowError::NotNegotiated)?;
                let buffer = sample.buffer_owned().ok_or(gst::FlowError::Error)?;

                // Buffers flagged while DMA is still filling them
                let ready = !buffer.flags().contains(gst::BufferFlags::CORRUPTED);
                if !ready && frame_num % 30 == 0 {
                    warn!(frame = frame_num, "Buffer marked as corrupted");
                }
                let timestamp = buffer
                    .pts()
                    .map(|pts| Duration::from_nanos(pts.nseconds()))
                    .unwrap_or_default();
                let data = buffer
                    .into_mapped_buffer_readable()
                    .map(FrameData::from_mapped_buffer)
                    .map_err(|_| gst::FlowError::Error)?;

                let frame = VideoFrame {
                    width: info.width(),
                    height: info.height(),
                    stride: info.stride()[0] as u32,
                    format,
                    data,
                    timestamp,
                    ready,
                };
                if ready {
                    *latest.lock().unwrap_or_else(PoisonError::into_inner) = Some(frame.clone());
                }
                sink.on_video_frame(frame);
                Ok(gst::FlowSuccess::Ok)
            })
            .build()
    }

    fn audio_callbacks(sink: Arc<dyn FrameSink>) -> AppSinkCallbacks {
        AppSinkCallbacks::builder()
            .new_sample(move |appsink| {
                let sample = appsink.pull_sample().map_err(|_| gst::FlowError::Eos)?;
                let buffer = sample.buffer_owned().ok_or(gst::FlowError::Error)?;
                let ready = !buffer.flags().contains(gst::BufferFlags::CORRUPTED);
                let timestamp = buffer
                    .pts()
                    .map(|pts| Duration::from_nanos(pts.nseconds()))
                    .unwrap_or_default();
                let data = buffer
                    .into_mapped_buffer_readable()
                    .map(FrameData::from_mapped_buffer)
                    .map_err(|_| gst::FlowError::Error)?;

                let mut frame = AudioFrame::new(data, AUDIO_SAMPLE_RATE, AUDIO_CHANNELS, timestamp);
                frame.ready = ready;
                sink.on_audio_frame(frame);
                Ok(gst::FlowSuccess::Ok)
            })
            .build()
    }
}

fn appsink_by_name(pipeline: &gst::Pipeline, name: &str) -> Result<AppSink, CaptureError> {
    pipeline
        .by_name(name)
        .and_then(|e| e.dynamic_cast::<AppSink>().ok())
        .ok_or_else(|| CaptureError::InitializationFailed(format!("missing appsink '{}'", name)))
}

impl CaptureSource for GstCaptureSource {
    fn start(&self, sink: Arc<dyn FrameSink>) -> Result<(), CaptureError> {
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        if running.is_some() {
            return Err(CaptureError::AlreadyRunning);
        }

        gst::init().map_err(|e| CaptureError::InitializationFailed(e.to_string()))?;

        let desc = self.pipeline_description();
        debug!(pipeline = %desc, "Creating capture pipeline");
        let pipeline = gst::parse::launch(&desc)
            .map_err(|e| CaptureError::BackendError(e.to_string()))?
            .dynamic_cast::<gst::Pipeline>()
            .map_err(|_| CaptureError::InitializationFailed("not a pipeline".to_string()))?;

        let video = appsink_by_name(&pipeline, "video")?;
        video.set_callbacks(Self::video_callbacks(Arc::clone(&sink), Arc::clone(&self.latest)));
        let mut appsinks = vec![video];
        if self.audio {
            let audio = appsink_by_name(&pipeline, "audio")?;
            audio.set_callbacks(Self::audio_callbacks(sink));
            appsinks.push(audio);
        }

        if pipeline.set_state(gst::State::Playing).is_err() {
            let _ = pipeline.set_state(gst::State::Null);
            return Err(CaptureError::NoDevice);
        }
        let (result, state, _) =
            pipeline.state(gst::ClockTime::from_seconds(timing::START_TIMEOUT_SECS));
        if result.is_err() {
            let _ = pipeline.set_state(gst::State::Null);
            return Err(CaptureError::InitializationFailed(format!(
                "capture pipeline stuck in {:?}",
                state
            )));
        }

        info!(
            width = self.width,
            height = self.height,
            fps = self.frame_rate,
            audio = self.audio,
            "Capture pipeline playing"
        );
        *running = Some(Running { pipeline, appsinks });
        Ok(())
    }

    fn stop(&self) {
        let Some(running) = self
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        else {
            return;
        };

        // Release the sink references held by the callbacks
        for appsink in &running.appsinks {
            appsink.set_callbacks(AppSinkCallbacks::builder().build());
        }
        if let Err(e) = running.pipeline.set_state(gst::State::Null) {
            warn!(error = ?e, "Failed to stop capture pipeline");
        }
        info!("Capture pipeline stopped");
    }

    fn capture_still(&self) -> Result<VideoFrame, CaptureError> {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(CaptureError::NoFrameAvailable)
    }

    fn has_audio(&self) -> bool {
        self.audio
    }
}

impl Drop for GstCaptureSource {
    fn drop(&mut self) {
        self.stop();
    }
}
