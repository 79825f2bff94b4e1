// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use serde::{Deserialize, Serialize};

/// Recording resolution presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VideoQuality {
    /// 1920x1080
    High,
    /// 1280x720 (default)
    #[default]
    Medium,
    /// 640x480
    Low,
}

impl VideoQuality {
    pub const ALL: [VideoQuality; 3] = [VideoQuality::High, VideoQuality::Medium, VideoQuality::Low];

    /// Frame dimensions for this preset
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            VideoQuality::High => (1920, 1080),
            VideoQuality::Medium => (1280, 720),
            VideoQuality::Low => (640, 480),
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            VideoQuality::High => "1080p",
            VideoQuality::Medium => "720p",
            VideoQuality::Low => "480p",
        }
    }
}

/// Video encoder bitrate presets
///
/// These presets define the target bitrate for video encoding based on resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BitratePreset {
    /// Low bitrate - smaller files, reduced quality
    Low,
    /// Medium bitrate - balanced quality and file size (default)
    #[default]
    Medium,
    /// High bitrate - larger files, better quality
    High,
}

impl BitratePreset {
    pub const ALL: [BitratePreset; 3] = [
        BitratePreset::Low,
        BitratePreset::Medium,
        BitratePreset::High,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            BitratePreset::Low => "Low",
            BitratePreset::Medium => "Medium",
            BitratePreset::High => "High",
        }
    }

    /// Get bitrate in kbps for a given frame width
    ///
    /// - SD (640x480): Low=1, Medium=2, High=4 Mbps
    /// - HD (1280x720): Low=2.5, Medium=5, High=10 Mbps
    /// - Full HD (1920x1080): Low=4, Medium=8, High=16 Mbps
    /// - 2K and above: Low=8, Medium=16, High=32 Mbps
    pub fn bitrate_kbps(&self, width: u32) -> u32 {
        match (get_resolution_tier(width), self) {
            (ResolutionTier::SD, BitratePreset::Low) => 1_000,
            (ResolutionTier::SD, BitratePreset::Medium) => 2_000,
            (ResolutionTier::SD, BitratePreset::High) => 4_000,
            (ResolutionTier::HD, BitratePreset::Low) => 2_500,
            (ResolutionTier::HD, BitratePreset::Medium) => 5_000,
            (ResolutionTier::HD, BitratePreset::High) => 10_000,
            (ResolutionTier::FullHD, BitratePreset::Low) => 4_000,
            (ResolutionTier::FullHD, BitratePreset::Medium) => 8_000,
            (ResolutionTier::FullHD, BitratePreset::High) => 16_000,
            (ResolutionTier::TwoK, BitratePreset::Low) => 8_000,
            (ResolutionTier::TwoK, BitratePreset::Medium) => 16_000,
            (ResolutionTier::TwoK, BitratePreset::High) => 32_000,
        }
    }
}

/// Resolution tiers for bitrate calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionTier {
    SD,
    HD,
    FullHD,
    TwoK,
}

pub fn get_resolution_tier(width: u32) -> ResolutionTier {
    match width {
        w if w >= 2560 => ResolutionTier::TwoK,
        w if w >= 1920 => ResolutionTier::FullHD,
        w if w >= 1280 => ResolutionTier::HD,
        _ => ResolutionTier::SD,
    }
}

/// Format bitrate for display (e.g., "8 Mbps" or "2.5 Mbps")
pub fn format_bitrate(kbps: u32) -> String {
    let mbps = kbps as f64 / 1000.0;
    if mbps == mbps.floor() {
        format!("{} Mbps", mbps as u32)
    } else {
        format!("{:.1} Mbps", mbps)
    }
}

/// Recording defaults
pub mod recording {
    /// Frame rate used when the configured one is unusable
    pub const DEFAULT_FRAME_RATE: u32 = 30;

    /// Accepted frame rate range
    pub const MIN_FRAME_RATE: u32 = 1;
    pub const MAX_FRAME_RATE: u32 = 120;

    /// Audio track: mono AAC at 44.1 kHz, 128 kbps
    pub const AUDIO_SAMPLE_RATE: u32 = 44_100;
    pub const AUDIO_CHANNELS: u32 = 1;
    pub const AUDIO_BITRATE_BPS: i32 = 128_000;

    /// Samples per audio buffer delivered by the synthetic source
    pub const AUDIO_CHUNK_SAMPLES: usize = 1024;

    /// Subfolder used under the user's video/picture directories
    pub const DEFAULT_SAVE_FOLDER: &str = "DriveRecorder";

    /// File name timestamp format (20180510_142233)
    pub const FILENAME_FORMAT: &str = "%Y%m%d_%H%M%S";

    /// Prefix for still images
    pub const PHOTO_PREFIX: &str = "IMG_";
}

/// Auto start/stop trigger defaults (consumed by the telemetry provider)
pub mod trigger {
    pub const DEFAULT_AUTO_START_SPEED_KMH: f64 = 10.0;

    /// G-sensor sensitivity thresholds in g
    pub const GSENSOR_STRONG: f64 = 4.0;
    pub const GSENSOR_MEDIUM: f64 = 2.8;
    pub const GSENSOR_WEAK: f64 = 1.8;
}

/// Overlay layout
pub mod overlay {
    /// Overlay timestamp format (2018/05/10 14:22:33)
    pub const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

    /// Text line height is frame height divided by this
    pub const FONT_HEIGHT_DIVISOR: u32 = 24;

    /// Smallest line height in pixels
    pub const MIN_FONT_PX: u32 = 8;

    /// Padding around text is the line height divided by this
    pub const MARGIN_DIVISOR: u32 = 4;

    /// Background band opacity (0-255)
    pub const BAND_ALPHA: u8 = 140;
}

/// Pipeline timing
pub mod timing {
    /// Max wait for the writer pipeline to reach PLAYING
    pub const START_TIMEOUT_SECS: u64 = 5;

    /// Max wait for end-of-stream to reach the file sink
    pub const FINALIZE_TIMEOUT_SECS: u64 = 10;

    /// Bytes an appsrc may queue before its track reports "not ready"
    pub const VIDEO_QUEUE_MAX_BYTES: u64 = 64 * 1024 * 1024;
    pub const AUDIO_QUEUE_MAX_BYTES: u64 = 2 * 1024 * 1024;

    /// Audio buffers held while waiting for video to cover them
    pub const AUDIO_GATE_MAX_BUFFERS: usize = 128;

    /// Log per-track statistics every N appended frames
    pub const FRAME_LOG_INTERVAL: u64 = 300;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_dimensions() {
        assert_eq!(VideoQuality::High.dimensions(), (1920, 1080));
        assert_eq!(VideoQuality::default().dimensions(), (1280, 720));
        assert_eq!(VideoQuality::Low.dimensions(), (640, 480));
    }

    #[test]
    fn test_format_bitrate() {
        assert_eq!(format_bitrate(8_000), "8 Mbps");
        assert_eq!(format_bitrate(2_500), "2.5 Mbps");
    }

    #[test]
    fn test_resolution_tiers() {
        assert_eq!(get_resolution_tier(640), ResolutionTier::SD);
        assert_eq!(get_resolution_tier(1280), ResolutionTier::HD);
        assert_eq!(get_resolution_tier(1920), ResolutionTier::FullHD);
        assert_eq!(get_resolution_tier(3840), ResolutionTier::TwoK);
    }
}
