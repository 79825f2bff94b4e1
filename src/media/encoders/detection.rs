// SPDX-License-Identifier: MPL-2.0

//! GStreamer encoder detection
//!
//! Reports which video and audio encoders the installed plugins provide.

use super::audio::AudioCodec;
use super::video::enumerate_video_encoders;
use gstreamer as gst;
use tracing::{debug, info};

/// Check if a specific GStreamer element is available
pub fn is_element_available(element_name: &str) -> bool {
    gst::init().ok();
    gst::ElementFactory::find(element_name).is_some()
}

/// Detect all available audio encoders
pub fn detect_audio_encoders() -> Vec<&'static str> {
    let available: Vec<&'static str> = [AudioCodec::AAC, AudioCodec::Opus]
        .iter()
        .flat_map(|codec| codec.encoder_candidates().iter().copied())
        .filter(|name| {
            let found = is_element_available(name);
            if found {
                debug!("Audio encoder available: {}", name);
            }
            found
        })
        .collect();

    info!("Detected {} audio encoders", available.len());
    available
}

/// Human-readable encoder report, one line per encoder
pub fn available_encoders_report() -> Vec<String> {
    let mut lines = vec!["Video encoders:".to_string()];
    let video = enumerate_video_encoders();
    if video.is_empty() {
        lines.push("  (none)".to_string());
    }
    for encoder in video {
        lines.push(format!("  {} ({})", encoder.display_name, encoder.element_name));
    }

    lines.push("Audio encoders:".to_string());
    let audio = detect_audio_encoders();
    if audio.is_empty() {
        lines.push("  (none)".to_string());
    }
    for encoder in audio {
        lines.push(format!("  {}", encoder));
    }
    lines
}

/// Log all available encoders (for debugging)
pub fn log_available_encoders() {
    info!("=== GStreamer Encoder Detection ===");
    for line in available_encoders_report() {
        info!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_has_sections() {
        let report = available_encoders_report();
        assert_eq!(report[0], "Video encoders:");
        assert!(report.iter().any(|l| l == "Audio encoders:"));
    }
}
