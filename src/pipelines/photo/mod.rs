// SPDX-License-Identifier: MPL-2.0

//! Still image capture
//!
//! ```text
//! Capture source → latest frame → RGB conversion → JPEG → IMG_<time>.jpg
//! ```
//!
//! Runs independently of recording: a still can be taken while a recording
//! is in progress or while idle, and it never touches the recording file.

pub mod encoding;
pub mod processing;

pub use encoding::EncodingQuality;

use crate::backends::camera::CaptureSource;
use crate::errors::PhotoError;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Anything that can produce a still image file on request
pub trait StillImagePath: Send + Sync {
    /// Capture one still and return where it was saved
    fn capture_still(&self) -> Result<PathBuf, PhotoError>;
}

/// Captures the source's latest frame as a JPEG
pub struct PhotoPipeline {
    source: Arc<dyn CaptureSource>,
    output_dir: PathBuf,
    quality: EncodingQuality,
}

impl PhotoPipeline {
    pub fn new(source: Arc<dyn CaptureSource>, output_dir: PathBuf) -> Self {
        Self {
            source,
            output_dir,
            quality: EncodingQuality::default(),
        }
    }

    pub fn with_quality(mut self, quality: EncodingQuality) -> Self {
        self.quality = quality;
        self
    }

    pub fn output_dir(&self) -> &std::path::Path {
        &self.output_dir
    }

    /// Capture and save without blocking the async runtime
    pub async fn capture_and_save(self: Arc<Self>) -> Result<PathBuf, PhotoError> {
        tokio::task::spawn_blocking(move || self.capture_still())
            .await
            .map_err(|e| PhotoError::SaveFailed(format!("Photo task error: {}", e)))?
    }
}

impl StillImagePath for PhotoPipeline {
    fn capture_still(&self) -> Result<PathBuf, PhotoError> {
        info!("Capturing still image");
        let frame = self.source.capture_still()?;
        debug!(
            width = frame.width,
            height = frame.height,
            format = ?frame.format,
            "Frame captured from source"
        );

        let image = processing::frame_to_rgb(&frame)?;
        let data = encoding::encode_jpeg(&image, self.quality)?;
        encoding::save_jpeg(&data, &self.output_dir)
    }
}
