// SPDX-License-Identifier: MPL-2.0

//! Backend layer for frame capture
//!
//! - [`camera`]: capture source trait, frame types and the bundled sources
//!   (synthetic test pattern, GStreamer default devices)

pub mod camera;
