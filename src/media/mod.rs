// SPDX-License-Identifier: MPL-2.0

//! Media processing for the recording pipeline
//!
//! # Overlay
//!
//! The [`overlay`] module burns the telemetry band (timestamp, position,
//! speed) into a copy of each RGBA/BGRA video frame. Text is rasterized
//! from an embedded font by [`text`].
//!
//! # Encoding
//!
//! The [`encoders`] module names the codecs and containers a recording uses
//! and, with the `gstreamer` feature, picks concrete encoder elements:
//! - **Video**: H.264/H.265 with hardware acceleration (VA-API, NVENC, V4L2)
//! - **Audio**: AAC for MP4, Opus for Matroska

pub mod encoders;
pub mod overlay;
pub mod text;

pub use overlay::{OverlayCompositor, OverlayError};
