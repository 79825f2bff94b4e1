// SPDX-License-Identifier: GPL-3.0-only

//! Captured frame to RGB image
//!
//! Handles every layout a capture source delivers. YUV conversions use
//! BT.601 limited-range integer math.

use crate::backends::camera::{PixelFormat, VideoFrame};
use crate::errors::PhotoError;
use image::RgbImage;

/// Convert a frame to a packed RGB image
pub fn frame_to_rgb(frame: &VideoFrame) -> Result<RgbImage, PhotoError> {
    if !frame.is_complete() {
        return Err(PhotoError::EncodingFailed(format!(
            "frame data too small: expected {}, got {}",
            frame.format.frame_size(frame.height, frame.stride),
            frame.data.len()
        )));
    }

    let width = frame.width as usize;
    let height = frame.height as usize;
    let stride = frame.stride as usize;
    let min_stride = match frame.format {
        PixelFormat::RGBA | PixelFormat::BGRA => width * 4,
        PixelFormat::YUYV => width.div_ceil(2) * 4,
        PixelFormat::NV12 | PixelFormat::I420 => width.div_ceil(2) * 2,
    };
    if stride < min_stride {
        return Err(PhotoError::EncodingFailed(format!(
            "stride {} too small for width {}",
            stride, width
        )));
    }
    let data: &[u8] = &frame.data;
    let mut rgb = vec![0u8; width * height * 3];

    match frame.format {
        PixelFormat::RGBA | PixelFormat::BGRA => {
            let swap = frame.format == PixelFormat::BGRA;
            for (y, out_row) in rgb.chunks_exact_mut(width * 3).enumerate() {
                let row = &data[y * stride..y * stride + width * 4];
                for (px, out) in row.chunks_exact(4).zip(out_row.chunks_exact_mut(3)) {
                    if swap {
                        out.copy_from_slice(&[px[2], px[1], px[0]]);
                    } else {
                        out.copy_from_slice(&px[..3]);
                    }
                }
            }
        }
        PixelFormat::YUYV => {
            for (y, out_row) in rgb.chunks_exact_mut(width * 3).enumerate() {
                let row = &data[y * stride..];
                for x in 0..width {
                    let pair = (x / 2) * 4;
                    let luma = row[pair + if x % 2 == 0 { 0 } else { 2 }];
                    let (u, v) = (row[pair + 1], row[pair + 3]);
                    out_row[x * 3..x * 3 + 3].copy_from_slice(&yuv_to_rgb(luma, u, v));
                }
            }
        }
        PixelFormat::NV12 => {
            let uv_plane = &data[stride * height..];
            for (y, out_row) in rgb.chunks_exact_mut(width * 3).enumerate() {
                let y_row = &data[y * stride..];
                let uv_row = &uv_plane[(y / 2) * stride..];
                for x in 0..width {
                    let uv = (x / 2) * 2;
                    let px = yuv_to_rgb(y_row[x], uv_row[uv], uv_row[uv + 1]);
                    out_row[x * 3..x * 3 + 3].copy_from_slice(&px);
                }
            }
        }
        PixelFormat::I420 => {
            let chroma_stride = stride / 2;
            let chroma_rows = height.div_ceil(2);
            let u_plane = &data[stride * height..];
            let v_plane = &u_plane[chroma_stride * chroma_rows..];
            for (y, out_row) in rgb.chunks_exact_mut(width * 3).enumerate() {
                let y_row = &data[y * stride..];
                let offset = (y / 2) * chroma_stride;
                for x in 0..width {
                    let px = yuv_to_rgb(y_row[x], u_plane[offset + x / 2], v_plane[offset + x / 2]);
                    out_row[x * 3..x * 3 + 3].copy_from_slice(&px);
                }
            }
        }
    }

    RgbImage::from_raw(frame.width, frame.height, rgb)
        .ok_or_else(|| PhotoError::EncodingFailed("Failed to create RGB image".to_string()))
}

#[inline]
fn yuv_to_rgb(y: u8, u: u8, v: u8) -> [u8; 3] {
    let u = u as i32 - 128;
    let v = v as i32 - 128;
    let luma = ((y as i32 - 16) * 149) >> 7;
    let r = luma + ((179 * v) >> 7);
    let g = luma - ((44 * u) >> 7) - ((91 * v) >> 7);
    let b = luma + ((227 * u) >> 7);
    [r.clamp(0, 255) as u8, g.clamp(0, 255) as u8, b.clamp(0, 255) as u8]
}
