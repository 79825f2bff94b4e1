// SPDX-License-Identifier: MPL-2.0

//! Integration tests for the telemetry overlay

use chrono::{Local, TimeZone};
use drive_recorder::backends::camera::{PixelFormat, VideoFrame};
use drive_recorder::media::overlay::{OverlayLayout, overlay_fields};
use drive_recorder::media::{OverlayCompositor, OverlayError};
use drive_recorder::TelemetrySnapshot;
use std::time::Duration;

fn frame(width: u32, height: u32, format: PixelFormat) -> VideoFrame {
    let size = format.frame_size(height, width * 4);
    VideoFrame::new(width, height, format, vec![60u8; size], Duration::ZERO)
}

fn telemetry() -> TelemetrySnapshot {
    TelemetrySnapshot {
        speed_kmh: 42.4,
        latitude: 35.681236,
        longitude: 139.767125,
        altitude: 40.2,
        ..TelemetrySnapshot::default()
    }
}

#[test]
fn test_fields_formatted() {
    let now = Local.with_ymd_and_hms(2018, 5, 10, 14, 22, 33).unwrap();
    let [timestamp, position, speed] = overlay_fields(&telemetry(), now);
    assert_eq!(timestamp, "2018/05/10 14:22:33");
    assert_eq!(position, "35.6812 139.7671 40m");
    assert_eq!(speed, "42 km/h");
}

#[test]
fn test_dimensions_preserved() {
    let compositor = OverlayCompositor::new();
    for (w, h) in [(1920, 1080), (1280, 720), (640, 480), (33, 17), (8, 2)] {
        for format in [PixelFormat::RGBA, PixelFormat::BGRA] {
            let input = frame(w, h, format);
            let out = compositor.compose(&input, &telemetry(), Local::now()).unwrap();
            assert_eq!((out.width, out.height, out.stride), (w, h, w * 4));
            assert_eq!(out.format, format);
            assert_eq!(out.data.len(), input.data.len());
        }
    }
}

#[test]
fn test_input_never_mutated() {
    let input = frame(320, 240, PixelFormat::RGBA);
    let before = input.data.to_vec();
    let out = OverlayCompositor::new()
        .compose(&input, &telemetry(), Local::now())
        .unwrap();
    assert_eq!(&input.data[..], &before[..]);
    assert_ne!(&out.data[..], &before[..]);
}

#[test]
fn test_text_in_each_third_of_band() {
    let (w, h) = (640, 480);
    let out = OverlayCompositor::new()
        .compose(&frame(w, h, PixelFormat::RGBA), &telemetry(), Local::now())
        .unwrap();
    let layout = OverlayLayout::for_frame(w, h);

    // The band darkens the gray background; only text comes out bright
    let white_in = |x0: u32, x1: u32| {
        (layout.band_top..h).any(|y| {
            (x0..x1).any(|x| {
                let i = (y * w * 4 + x * 4) as usize;
                out.data[i..i + 3].iter().all(|&c| c > 200)
            })
        })
    };
    assert!(white_in(0, w / 3), "timestamp missing");
    assert!(white_in(w / 3, 2 * w / 3), "position missing");
    assert!(white_in(2 * w / 3, w), "speed missing");
}

#[test]
fn test_padded_stride_kept() {
    let mut input = frame(100, 60, PixelFormat::RGBA);
    input.stride = 100 * 4 + 64;
    input.data = vec![60u8; (input.stride * 60) as usize].into();
    let out = OverlayCompositor::new()
        .compose(&input, &telemetry(), Local::now())
        .unwrap();
    assert_eq!(out.stride, input.stride);
    // Padding bytes are not pixels
    let last_row = (59 * input.stride) as usize;
    assert!(out.data[last_row + 400..last_row + 464].iter().all(|&b| b == 60));
}

#[test]
fn test_yuv_frames_rejected() {
    let yuyv = VideoFrame::new(16, 8, PixelFormat::YUYV, vec![0u8; 16 * 8 * 2], Duration::ZERO);
    assert_eq!(
        OverlayCompositor::new()
            .compose(&yuyv, &telemetry(), Local::now())
            .unwrap_err(),
        OverlayError::UnsupportedFormat(PixelFormat::YUYV)
    );
}
