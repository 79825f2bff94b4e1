// SPDX-License-Identifier: MPL-2.0

//! Telemetry overlay burned into recorded frames
//!
//! A translucent band along the bottom edge carries three fields:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                                                          │
//! │▓2018/05/10 14:22:33▓▓▓35.6812 139.7671 40m▓▓▓▓▓▓42 km/h▓│
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! The compositor writes into a fresh copy of the pixel data; the input
//! frame is never touched.

use super::text::OverlayFont;
use crate::backends::camera::{PixelFormat, VideoFrame};
use crate::constants::overlay::{
    BAND_ALPHA, FONT_HEIGHT_DIVISOR, MARGIN_DIVISOR, MIN_FONT_PX, TIMESTAMP_FORMAT,
};
use crate::telemetry::TelemetrySnapshot;
use chrono::{DateTime, Local};
use std::fmt;
use tracing::warn;

/// Why a frame could not be overlaid
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayError {
    /// Only 4-byte RGBA/BGRA layouts are drawn on
    UnsupportedFormat(PixelFormat),
    /// Destination buffer could not be allocated
    AllocationFailed(usize),
    /// Payload is shorter than its header claims
    IncompleteFrame,
    /// The embedded font could not be parsed
    FontUnavailable,
}

impl fmt::Display for OverlayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverlayError::UnsupportedFormat(format) => {
                write!(f, "Overlay not supported for {:?} frames", format)
            }
            OverlayError::AllocationFailed(bytes) => {
                write!(f, "Could not allocate {} bytes for overlay", bytes)
            }
            OverlayError::IncompleteFrame => write!(f, "Frame payload is incomplete"),
            OverlayError::FontUnavailable => write!(f, "Overlay font is unavailable"),
        }
    }
}

impl std::error::Error for OverlayError {}

/// Band geometry for a frame size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayLayout {
    /// Line height of the text in pixels
    pub font_px: u32,
    /// Padding around text
    pub margin: u32,
    /// First row of the band
    pub band_top: u32,
    /// Top of the text line
    pub text_top: u32,
}

impl OverlayLayout {
    pub fn for_frame(width: u32, height: u32) -> Self {
        let font_px = (height / FONT_HEIGHT_DIVISOR).max(MIN_FONT_PX);
        let margin = (font_px / MARGIN_DIVISOR).min(width / 4);
        let band_height = (font_px + 2 * margin).min(height);
        let band_top = height - band_height;
        Self {
            font_px,
            margin,
            band_top,
            text_top: band_top + margin,
        }
    }
}

/// The three overlay strings for one frame
pub fn overlay_fields(telemetry: &TelemetrySnapshot, now: DateTime<Local>) -> [String; 3] {
    [
        now.format(TIMESTAMP_FORMAT).to_string(),
        telemetry.position_text(),
        telemetry.speed_text(),
    ]
}

/// Draws the telemetry band onto copies of video frames
#[derive(Debug, Clone)]
pub struct OverlayCompositor {
    font: Option<OverlayFont>,
}

impl Default for OverlayCompositor {
    fn default() -> Self {
        Self::new()
    }
}

impl OverlayCompositor {
    pub fn new() -> Self {
        let font = match OverlayFont::load() {
            Ok(font) => Some(font),
            Err(e) => {
                warn!(error = %e, "Overlay font failed to load, frames will be written plain");
                None
            }
        };
        Self { font }
    }

    /// New frame with the overlay applied; same size, stride and format
    pub fn compose(
        &self,
        frame: &VideoFrame,
        telemetry: &TelemetrySnapshot,
        now: DateTime<Local>,
    ) -> Result<VideoFrame, OverlayError> {
        if !frame.format.is_rgb32() {
            return Err(OverlayError::UnsupportedFormat(frame.format));
        }
        if !frame.is_complete() || frame.stride < frame.width * 4 {
            return Err(OverlayError::IncompleteFrame);
        }
        let font = self.font.as_ref().ok_or(OverlayError::FontUnavailable)?;

        let source: &[u8] = &frame.data;
        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(source.len())
            .map_err(|_| OverlayError::AllocationFailed(source.len()))?;
        pixels.extend_from_slice(source);

        let layout = OverlayLayout::for_frame(frame.width, frame.height);
        let mut canvas = Canvas {
            pixels: &mut pixels,
            width: frame.width,
            height: frame.height,
            stride: frame.stride as usize,
        };
        canvas.darken_rows(layout.band_top, frame.height);

        let px = layout.font_px as f32;
        let baseline = layout.text_top as f32 + font.ascent(px);
        let frame_width = frame.width as f32;
        let margin = layout.margin as f32;
        let [timestamp, position, speed] = overlay_fields(telemetry, now);

        canvas.draw_text(font, &timestamp, margin, baseline, px);
        let position_left = ((frame_width - font.text_width(&position, px)) / 2.0).max(0.0);
        canvas.draw_text(font, &position, position_left, baseline, px);
        let speed_left = (frame_width - margin - font.text_width(&speed, px)).max(0.0);
        canvas.draw_text(font, &speed, speed_left, baseline, px);

        Ok(VideoFrame {
            data: pixels.into(),
            ..frame.clone()
        })
    }
}

/// Mutable view over packed 32-bit pixels
struct Canvas<'a> {
    pixels: &'a mut [u8],
    width: u32,
    height: u32,
    stride: usize,
}

impl Canvas<'_> {
    fn pixel_mut(&mut self, x: i64, y: i64) -> Option<&mut [u8]> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        let offset = y as usize * self.stride + x as usize * 4;
        self.pixels.get_mut(offset..offset + 4)
    }

    /// Blend rows `top..bottom` toward black
    fn darken_rows(&mut self, top: u32, bottom: u32) {
        let keep = 255 - BAND_ALPHA as u32;
        for y in top..bottom {
            for x in 0..self.width {
                if let Some(px) = self.pixel_mut(x as i64, y as i64) {
                    // Alpha (byte 3 in RGBA and BGRA) is left alone
                    for c in &mut px[..3] {
                        *c = (*c as u32 * keep / 255) as u8;
                    }
                }
            }
        }
    }

    /// Blend white text into the color channels by glyph coverage
    fn draw_text(&mut self, font: &OverlayFont, text: &str, left: f32, baseline: f32, px: f32) {
        for glyph in font.outline(text, px, left, baseline) {
            let bounds = glyph.px_bounds();
            let (x0, y0) = (bounds.min.x as i64, bounds.min.y as i64);
            glyph.draw(|x, y, coverage| {
                let Some(pixel) = self.pixel_mut(x0 + x as i64, y0 + y as i64) else {
                    return;
                };
                let coverage = coverage.clamp(0.0, 1.0);
                for c in &mut pixel[..3] {
                    let value = *c as f32;
                    *c = (value + (255.0 - value) * coverage).round() as u8;
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn gray_frame(width: u32, height: u32) -> VideoFrame {
        VideoFrame::new(
            width,
            height,
            PixelFormat::RGBA,
            vec![128u8; (width * height * 4) as usize],
            Duration::ZERO,
        )
    }

    #[test]
    fn test_layout_scales_with_height() {
        assert_eq!(OverlayLayout::for_frame(640, 480).font_px, 20);
        assert_eq!(OverlayLayout::for_frame(1920, 1080).font_px, 45);
        assert_eq!(OverlayLayout::for_frame(64, 48).font_px, MIN_FONT_PX);
    }

    #[test]
    fn test_band_inside_frame() {
        let layout = OverlayLayout::for_frame(32, 4);
        assert_eq!(layout.band_top, 0);
        let layout = OverlayLayout::for_frame(1280, 720);
        assert!(layout.band_top < 720);
        assert!(layout.text_top + layout.font_px <= 720);
    }

    #[test]
    fn test_top_rows_untouched() {
        let frame = gray_frame(320, 240);
        let out = OverlayCompositor::new()
            .compose(&frame, &TelemetrySnapshot::default(), Local::now())
            .unwrap();
        let layout = OverlayLayout::for_frame(320, 240);
        let band_start = (layout.band_top * 320 * 4) as usize;
        assert!(out.data[..band_start].iter().all(|&b| b == 128));
        assert!(out.data[band_start..].iter().any(|&b| b > 200));
        assert!(out.data[band_start..].iter().any(|&b| b < 128));
    }

    #[test]
    fn test_text_is_antialiased() {
        let frame = gray_frame(640, 480);
        let out = OverlayCompositor::new()
            .compose(&frame, &TelemetrySnapshot::default(), Local::now())
            .unwrap();
        let layout = OverlayLayout::for_frame(640, 480);
        let band = &out.data[(layout.band_top * 640 * 4) as usize..];
        let darkened = (128u32 * (255 - BAND_ALPHA as u32) / 255) as u8;
        // Edge pixels sit between the band and full white
        assert!(band.iter().any(|&b| b > darkened + 20 && b < 235));
    }

    #[test]
    fn test_incomplete_frame_rejected() {
        let mut frame = gray_frame(16, 16);
        frame.data = vec![0u8; 10].into();
        assert_eq!(
            OverlayCompositor::new()
                .compose(&frame, &TelemetrySnapshot::default(), Local::now())
                .unwrap_err(),
            OverlayError::IncompleteFrame
        );
    }
}
