// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! - Recording with a live telemetry overlay
//! - Listing saved recordings
//! - Taking stills
//! - Reporting installed encoders

use crate::SourceKind;
use drive_recorder::backends::camera::CaptureSource;
use drive_recorder::backends::camera::test_pattern::TestPatternSource;
use drive_recorder::pipelines::video::{ContainerBackend, FrameSourceAdapter};
use drive_recorder::storage;
use drive_recorder::{
    Config, ConfigHandle, PhotoPipeline, RecordingConfig, RecordingSession, SessionContext,
    StillImagePath, TelemetryHandle, TelemetrySnapshot,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::warn;

type CliResult = Result<(), Box<dyn std::error::Error>>;

pub struct RecordOptions {
    pub duration: u64,
    pub output: Option<PathBuf>,
    pub audio: bool,
    pub overlay: bool,
    pub source: SourceKind,
    /// Speed (km/h), latitude, longitude, altitude
    pub telemetry: (f64, f64, f64, f64),
}

pub fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    Ok(config)
}

/// Record until the duration elapses or Ctrl+C
pub fn record(mut config: Config, options: RecordOptions) -> CliResult {
    if let Some(dir) = options.output {
        config.recordings_dir = dir;
    }
    config.record_audio |= options.audio;
    config.overlay_enabled &= options.overlay;

    let recording = config.recording_config();
    let source = open_source(options.source, &recording)?;
    let photos_dir = config.photos_dir.clone();

    let (speed_kmh, lat, lon, alt) = options.telemetry;
    let telemetry = TelemetryHandle::new(TelemetrySnapshot::from_location(
        speed_kmh / 3.6,
        lat,
        lon,
        alt,
    ));

    let session = RecordingSession::new(SessionContext {
        backend: container_backend()?,
        config: ConfigHandle::new(config),
        telemetry,
        still: Some(Arc::new(PhotoPipeline::new(source.clone(), photos_dir))),
    });
    let adapter = Arc::new(FrameSourceAdapter::new(session.clone()));

    println!(
        "Recording format: {}x{} @ {}fps",
        recording.width, recording.height, recording.frame_rate
    );
    let info = session.start()?;
    println!("Output: {}", info.output_path.display());
    println!("Duration: {} seconds", options.duration);
    if info.has_audio {
        println!("Audio: enabled");
    }
    if !info.has_overlay {
        println!("Overlay: disabled");
    }

    if let Err(e) = source.start(adapter.clone()) {
        // No frames will arrive, so the opened file would stay empty
        if let Err(discard) = session.discard() {
            warn!(error = %discard, "Could not discard recording");
        }
        return Err(e.into());
    }

    println!();
    println!("Recording... (press Ctrl+C to stop early)");

    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_clone = stop_flag.clone();
    ctrlc::set_handler(move || {
        stop_flag_clone.store(true, Ordering::SeqCst);
    })?;

    let start = Instant::now();
    let target_duration = Duration::from_secs(options.duration);
    while start.elapsed() < target_duration {
        if stop_flag.load(Ordering::SeqCst) {
            println!();
            println!("Stopping early...");
            break;
        }

        let elapsed = start.elapsed().as_secs();
        let stats = session.stats();
        print!(
            "\rRecording: {:02}:{:02}  frames: {}  dropped: {}",
            elapsed / 60,
            elapsed % 60,
            stats.video.appended,
            stats.video.dropped()
        );
        std::io::Write::flush(&mut std::io::stdout())?;

        std::thread::sleep(Duration::from_millis(100));
    }
    println!();

    let outcome = session.stop();
    source.stop();
    let summary = outcome?;

    println!("Video saved: {}", summary.output_path.display());
    println!(
        "Frames: {} ({:.1}s), audio buffers: {}",
        summary.frame_count,
        summary.duration.as_secs_f64(),
        summary.audio_buffers
    );
    let dropped = summary.stats.video.dropped() + summary.stats.audio.dropped();
    if dropped > 0 {
        println!("Dropped: {}", dropped);
    }
    Ok(())
}

/// List recordings in the configured directory
pub fn list_recordings(config: &Config, dir: Option<PathBuf>) -> CliResult {
    let dir = dir.unwrap_or_else(|| config.recordings_dir.clone());
    let entries = storage::list_recordings(&dir)?;
    if entries.is_empty() {
        println!("No recordings in {}", dir.display());
        return Ok(());
    }

    println!("Recordings in {}:", dir.display());
    println!();
    for entry in entries {
        let name = entry
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let started = entry
            .started_at
            .map(|t| t.format("%Y/%m/%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("  {:<28} {:<20} {:>10}", name, started, format_size(entry.size));
    }
    Ok(())
}

/// Take one still from the chosen source
pub fn take_photo(mut config: Config, output: Option<PathBuf>, kind: SourceKind) -> CliResult {
    if let Some(dir) = output {
        config.photos_dir = dir;
    }
    let recording = RecordingConfig {
        audio_enabled: false,
        ..config.recording_config()
    };
    let source = open_source(kind, &recording)?;

    // Live sources need a moment before the first frame arrives
    if kind == SourceKind::Camera {
        source.start(Arc::new(NullSink))?;
        std::thread::sleep(Duration::from_millis(500));
    }

    println!("Capturing...");
    let pipeline = PhotoPipeline::new(source.clone(), config.photos_dir.clone());
    let result = pipeline.capture_still();
    source.stop();

    let path = result?;
    println!("Photo saved: {}", path.display());
    Ok(())
}

#[cfg(feature = "gstreamer")]
pub fn list_encoders() -> CliResult {
    println!("Installed encoders:");
    for line in drive_recorder::media::encoders::detection::available_encoders_report() {
        println!("  {}", line);
    }
    Ok(())
}

#[cfg(not(feature = "gstreamer"))]
pub fn list_encoders() -> CliResult {
    Err("built without GStreamer support".into())
}

pub fn show_config(config: &Config) -> CliResult {
    if let Some(path) = Config::default_path() {
        println!("# {}", path.display());
    }
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

fn open_source(
    kind: SourceKind,
    config: &RecordingConfig,
) -> Result<Arc<dyn CaptureSource>, Box<dyn std::error::Error>> {
    match kind {
        SourceKind::Test => Ok(Arc::new(TestPatternSource::new(
            config.width,
            config.height,
            config.frame_rate,
            config.has_audio(),
        ))),
        #[cfg(feature = "gstreamer")]
        SourceKind::Camera => Ok(Arc::new(
            drive_recorder::backends::camera::gst_source::GstCaptureSource::new(
                config.width,
                config.height,
                config.frame_rate,
                config.has_audio(),
            ),
        )),
        #[cfg(not(feature = "gstreamer"))]
        SourceKind::Camera => Err("camera capture needs GStreamer support; use --source test".into()),
    }
}

#[cfg(feature = "gstreamer")]
fn container_backend() -> Result<Arc<dyn ContainerBackend>, Box<dyn std::error::Error>> {
    Ok(Arc::new(drive_recorder::pipelines::video::GstContainerBackend::new()))
}

#[cfg(not(feature = "gstreamer"))]
fn container_backend() -> Result<Arc<dyn ContainerBackend>, Box<dyn std::error::Error>> {
    Err("recording needs GStreamer support".into())
}

/// Discards frames; keeps a live source running for stills
struct NullSink;

impl drive_recorder::backends::camera::FrameSink for NullSink {
    fn on_video_frame(&self, _frame: drive_recorder::backends::camera::VideoFrame) {}
    fn on_audio_frame(&self, _frame: drive_recorder::backends::camera::AudioFrame) {}
}

fn format_size(bytes: u64) -> String {
    const MB: f64 = 1024.0 * 1024.0;
    if bytes as f64 >= MB {
        format!("{:.1} MB", bytes as f64 / MB)
    } else {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    }
}
