// SPDX-License-Identifier: GPL-3.0-only

use crate::constants::{BitratePreset, VideoQuality, recording, trigger};
use crate::errors::{AppError, AppResult};
use crate::media::encoders::{AudioCodec, ContainerFormat, VideoCodec};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::{debug, info, warn};

/// G-sensor sensitivity used by the event trigger
///
/// Stored for the external sensor provider that decides when to call
/// start and stop; the recorder itself never reads it.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
pub enum GSensorSensitivity {
    /// Trigger only on strong impacts
    #[default]
    Strong,
    Medium,
    /// Trigger on light bumps
    Weak,
}

impl GSensorSensitivity {
    /// Threshold in g
    pub fn threshold(&self) -> f64 {
        match self {
            Self::Strong => trigger::GSENSOR_STRONG,
            Self::Medium => trigger::GSENSOR_MEDIUM,
            Self::Weak => trigger::GSENSOR_WEAK,
        }
    }
}

/// Persistent user settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Recording resolution preset
    pub video_quality: VideoQuality,
    /// Frames per second requested from the capture source
    pub frame_rate: u32,
    /// Record microphone audio alongside video
    pub record_audio: bool,
    /// Burn the telemetry overlay into recorded frames
    pub overlay_enabled: bool,
    /// Video encoder bitrate preset (Low, Medium, High)
    pub bitrate_preset: BitratePreset,
    /// Output container for new recordings
    pub container: ContainerFormat,
    /// Directory for recordings
    pub recordings_dir: PathBuf,
    /// Directory for still images
    pub photos_dir: PathBuf,
    // Trigger settings below are persisted for the external telemetry
    // provider, which owns the decision to start and stop. Nothing in
    // this crate acts on them.
    /// Provider should start recording once speed exceeds `auto_start_speed_kmh`
    pub auto_start_enabled: bool,
    /// Provider should stop recording when the vehicle has been stationary
    pub auto_stop_enabled: bool,
    /// Negative or non-finite values reset to the default on load
    pub auto_start_speed_kmh: f64,
    pub gsensor_sensitivity: GSensorSensitivity,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            video_quality: VideoQuality::default(), // 720p
            frame_rate: recording::DEFAULT_FRAME_RATE,
            record_audio: false,
            overlay_enabled: true,
            bitrate_preset: BitratePreset::default(),
            container: ContainerFormat::default(),
            recordings_dir: default_dir(dirs::video_dir()),
            photos_dir: default_dir(dirs::picture_dir()),
            auto_start_enabled: false,
            auto_stop_enabled: false,
            auto_start_speed_kmh: trigger::DEFAULT_AUTO_START_SPEED_KMH,
            gsensor_sensitivity: GSensorSensitivity::default(),
        }
    }
}

fn default_dir(base: Option<PathBuf>) -> PathBuf {
    base.or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(recording::DEFAULT_SAVE_FOLDER)
}

impl Config {
    /// Default location: `<config dir>/drive-recorder/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("drive-recorder").join("config.json"))
    }

    /// Load from the default location, falling back to defaults
    pub fn load() -> AppResult<Self> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => {
                warn!("No config directory available, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load from `path`; a missing file yields defaults
    pub fn load_from(path: &Path) -> AppResult<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Config file not found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        let mut config: Config = serde_json::from_str(&contents)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        config.sanitize();

        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        debug!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// Reset values the recorder cannot honor
    fn sanitize(&mut self) {
        if !(recording::MIN_FRAME_RATE..=recording::MAX_FRAME_RATE).contains(&self.frame_rate) {
            warn!(
                frame_rate = self.frame_rate,
                "Unsupported frame rate, resetting to default"
            );
            self.frame_rate = recording::DEFAULT_FRAME_RATE;
        }
        if !self.auto_start_speed_kmh.is_finite() || self.auto_start_speed_kmh < 0.0 {
            self.auto_start_speed_kmh = trigger::DEFAULT_AUTO_START_SPEED_KMH;
        }
    }

    /// Snapshot of everything a recording needs, taken once per start
    pub fn recording_config(&self) -> RecordingConfig {
        let mut sanitized = self.clone();
        sanitized.sanitize();

        let (width, height) = sanitized.video_quality.dimensions();
        RecordingConfig {
            width,
            height,
            frame_rate: sanitized.frame_rate,
            audio_enabled: sanitized.record_audio,
            overlay_enabled: sanitized.overlay_enabled,
            video_codec: VideoCodec::default(),
            audio_codec: AudioCodec::for_container(sanitized.container),
            container: sanitized.container,
            bitrate_preset: sanitized.bitrate_preset,
            video_bitrate_kbps: sanitized.bitrate_preset.bitrate_kbps(width),
            audio_sample_rate: recording::AUDIO_SAMPLE_RATE,
            audio_channels: recording::AUDIO_CHANNELS,
            audio_bitrate_bps: recording::AUDIO_BITRATE_BPS,
        }
    }
}

/// Immutable per-recording settings
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingConfig {
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
    pub audio_enabled: bool,
    pub overlay_enabled: bool,
    pub video_codec: VideoCodec,
    pub audio_codec: AudioCodec,
    pub container: ContainerFormat,
    pub bitrate_preset: BitratePreset,
    pub video_bitrate_kbps: u32,
    pub audio_sample_rate: u32,
    pub audio_channels: u32,
    pub audio_bitrate_bps: i32,
}

impl RecordingConfig {
    /// Nominal duration of one video frame
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.frame_rate.max(1)
    }

    pub fn has_audio(&self) -> bool {
        self.audio_enabled
    }

    pub fn has_overlay(&self) -> bool {
        self.overlay_enabled
    }
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Config::default().recording_config()
    }
}

/// Shared configuration read by the session at every start
#[derive(Debug, Clone, Default)]
pub struct ConfigHandle(Arc<RwLock<Config>>);

impl ConfigHandle {
    pub fn new(config: Config) -> Self {
        Self(Arc::new(RwLock::new(config)))
    }

    pub fn get(&self) -> Config {
        self.0
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Takes effect at the next recording start
    pub fn set(&self, config: Config) {
        *self
            .0
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = config;
    }

    pub fn update(&self, f: impl FnOnce(&mut Config)) {
        let mut guard = self
            .0
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&mut guard);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_interval() {
        let config = RecordingConfig {
            frame_rate: 30,
            ..RecordingConfig::default()
        };
        assert_eq!(config.frame_interval(), Duration::from_nanos(33_333_333));
    }

    #[test]
    fn test_invalid_frame_rate_resets() {
        let config = Config {
            frame_rate: 0,
            ..Config::default()
        };
        assert_eq!(config.recording_config().frame_rate, 30);

        let config = Config {
            frame_rate: 240,
            ..Config::default()
        };
        assert_eq!(config.recording_config().frame_rate, 30);
    }

    #[test]
    fn test_handle_update_visible_to_clones() {
        let handle = ConfigHandle::default();
        let other = handle.clone();
        handle.update(|c| c.record_audio = true);
        assert!(other.get().record_audio);
    }

    #[test]
    fn test_gsensor_thresholds() {
        assert_eq!(GSensorSensitivity::Strong.threshold(), 4.0);
        assert_eq!(GSensorSensitivity::Weak.threshold(), 1.8);
    }
}
