// SPDX-License-Identifier: GPL-3.0-only

//! JPEG encoding and saving of still images

use crate::errors::PhotoError;
use crate::storage;
use chrono::Local;
use image::RgbImage;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Encoding quality settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncodingQuality {
    /// Low quality (high compression)
    Low,
    /// Medium quality (balanced)
    Medium,
    /// High quality (low compression)
    #[default]
    High,
    /// Maximum quality (minimal compression)
    Maximum,
}

impl EncodingQuality {
    /// Get JPEG quality value (0-100)
    pub fn jpeg_quality(&self) -> u8 {
        match self {
            EncodingQuality::Low => 60,
            EncodingQuality::Medium => 80,
            EncodingQuality::High => 92,
            EncodingQuality::Maximum => 98,
        }
    }
}

/// Encode image as JPEG
pub fn encode_jpeg(image: &RgbImage, quality: EncodingQuality) -> Result<Vec<u8>, PhotoError> {
    let mut buffer = Vec::new();
    let mut encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality.jpeg_quality());

    encoder
        .encode(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| PhotoError::EncodingFailed(format!("JPEG encoding failed: {}", e)))?;

    debug!(size = buffer.len(), "JPEG encoded");
    Ok(buffer)
}

/// Write encoded bytes under a fresh timestamped name in `dir`
pub fn save_jpeg(data: &[u8], dir: &Path) -> Result<PathBuf, PhotoError> {
    let path = storage::allocate_photo_path(dir, Local::now())?;
    std::fs::write(&path, data)?;
    info!(path = %path.display(), size = data.len(), "Photo saved");
    Ok(path)
}
