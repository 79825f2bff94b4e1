// SPDX-License-Identifier: MPL-2.0

//! Recording and still-image pipelines
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │ Capture      │ ──▶ │ Recording session │ ──▶ │ MP4/MKV file │
//! │ source       │     │  - admission      │     │              │
//! │ (callbacks)  │     │  - overlay        │     │              │
//! │              │     │  - track writers  │     │              │
//! └──────────────┘     └───────────────────┘     └──────────────┘
//!
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │ Latest frame │ ──▶ │  Photo pipeline   │ ──▶ │  JPEG file   │
//! └──────────────┘     └───────────────────┘     └──────────────┘
//! ```
//!
//! Capture threads never wait on disk I/O: frames the writer cannot take
//! are dropped and counted, and finalizing happens off the capture path.

pub mod photo;
pub mod video;
