// SPDX-License-Identifier: GPL-3.0-only
// Shared types for capture sources

//! Frame types delivered by capture sources

#[cfg(feature = "gstreamer")]
use gstreamer::buffer::{MappedBuffer, Readable};
use std::sync::Arc;
use std::time::Duration;

/// Frame data storage - either pre-copied bytes or zero-copy GStreamer buffer
///
/// The `Mapped` variant keeps the GStreamer buffer mapped and alive until all
/// references are dropped.
#[derive(Clone)]
pub enum FrameData {
    /// Pre-copied bytes (overlay output, synthetic sources, tests)
    Copied(Arc<[u8]>),
    /// Zero-copy mapped GStreamer buffer
    #[cfg(feature = "gstreamer")]
    Mapped(Arc<MappedBuffer<Readable>>),
}

impl FrameData {
    /// Create FrameData from a mapped GStreamer buffer (zero-copy)
    #[cfg(feature = "gstreamer")]
    pub fn from_mapped_buffer(buffer: MappedBuffer<Readable>) -> Self {
        FrameData::Mapped(Arc::new(buffer))
    }

    /// Get the length of the frame data in bytes
    pub fn len(&self) -> usize {
        self.as_ref().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Vec<u8>> for FrameData {
    fn from(data: Vec<u8>) -> Self {
        FrameData::Copied(data.into())
    }
}

impl std::fmt::Debug for FrameData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameData::Copied(data) => write!(f, "FrameData::Copied({} bytes)", data.len()),
            #[cfg(feature = "gstreamer")]
            FrameData::Mapped(buf) => write!(f, "FrameData::Mapped({} bytes)", buf.len()),
        }
    }
}

impl AsRef<[u8]> for FrameData {
    fn as_ref(&self) -> &[u8] {
        match self {
            FrameData::Copied(data) => data.as_ref(),
            #[cfg(feature = "gstreamer")]
            FrameData::Mapped(buf) => buf.as_slice(),
        }
    }
}

impl std::ops::Deref for FrameData {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_ref()
    }
}

/// Pixel format of a video frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// RGBA - 32-bit with alpha (4 bytes per pixel)
    RGBA,
    /// BGRA - 32-bit with alpha (B G R A byte order)
    BGRA,
    /// NV12 - Semi-planar 4:2:0 (Y plane + interleaved UV plane)
    NV12,
    /// I420 - Planar 4:2:0 (separate Y, U, V planes)
    I420,
    /// YUYV - Packed 4:2:2 (Y0 U Y1 V interleaved)
    YUYV,
}

impl PixelFormat {
    /// True for 4-byte RGB layouts the overlay can draw on
    pub fn is_rgb32(&self) -> bool {
        matches!(self, Self::RGBA | Self::BGRA)
    }

    /// Average bytes per pixel (accounting for chroma subsampling)
    pub fn bytes_per_pixel(&self) -> f32 {
        match self {
            Self::RGBA | Self::BGRA => 4.0,
            Self::NV12 | Self::I420 => 1.5,
            Self::YUYV => 2.0,
        }
    }

    /// GStreamer video/x-raw format string
    pub fn to_gst_format_string(&self) -> &'static str {
        match self {
            Self::RGBA => "RGBA",
            Self::BGRA => "BGRA",
            Self::NV12 => "NV12",
            Self::I420 => "I420",
            Self::YUYV => "YUY2",
        }
    }

    /// Parse format from GStreamer format string
    pub fn from_gst_format(format: &str) -> Option<Self> {
        match format {
            "RGBA" | "RGBx" => Some(Self::RGBA),
            "BGRA" | "BGRx" => Some(Self::BGRA),
            "NV12" => Some(Self::NV12),
            "I420" => Some(Self::I420),
            "YUYV" | "YUY2" => Some(Self::YUYV),
            _ => None,
        }
    }

    /// Minimum buffer size for a frame with this format
    pub fn frame_size(&self, height: u32, stride: u32) -> usize {
        match self {
            Self::RGBA | Self::BGRA | Self::YUYV => stride as usize * height as usize,
            // Y plane plus half-height chroma rows at the same stride
            Self::NV12 | Self::I420 => {
                stride as usize * (height as usize + (height as usize).div_ceil(2))
            }
        }
    }
}

/// Media kind of a frame or track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Video,
    Audio,
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Video => write!(f, "video"),
            MediaKind::Audio => write!(f, "audio"),
        }
    }
}

/// One captured video frame
#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    /// Row stride in bytes (may include padding)
    pub stride: u32,
    pub format: PixelFormat,
    pub data: FrameData,
    /// Capture time on the source's monotonic clock
    pub timestamp: Duration,
    /// False while the buffer is still being filled
    pub ready: bool,
}

impl VideoFrame {
    /// Tightly packed frame from owned bytes
    pub fn new(
        width: u32,
        height: u32,
        format: PixelFormat,
        data: impl Into<FrameData>,
        timestamp: Duration,
    ) -> Self {
        let stride = match format {
            PixelFormat::RGBA | PixelFormat::BGRA => width * 4,
            PixelFormat::YUYV => width * 2,
            PixelFormat::NV12 | PixelFormat::I420 => width,
        };
        Self {
            width,
            height,
            stride,
            format,
            data: data.into(),
            timestamp,
            ready: true,
        }
    }

    /// True if the payload covers every row the header promises
    pub fn is_complete(&self) -> bool {
        self.data.len() >= self.format.frame_size(self.height, self.stride)
    }
}

/// Interleaved signed 16-bit PCM
#[derive(Debug, Clone)]
pub struct AudioFrame {
    pub data: FrameData,
    pub sample_rate: u32,
    pub channels: u32,
    /// Capture time on the source's monotonic clock
    pub timestamp: Duration,
    pub ready: bool,
}

impl AudioFrame {
    pub fn new(data: impl Into<FrameData>, sample_rate: u32, channels: u32, timestamp: Duration) -> Self {
        Self {
            data: data.into(),
            sample_rate,
            channels,
            timestamp,
            ready: true,
        }
    }

    /// Samples per channel
    pub fn sample_count(&self) -> usize {
        self.data.len() / (2 * self.channels.max(1) as usize)
    }

    /// Playback duration of this buffer
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos(self.sample_count() as u64 * 1_000_000_000 / self.sample_rate as u64)
    }
}

/// A frame of either kind, as handed to the recording session
#[derive(Debug, Clone)]
pub enum Frame {
    Video(VideoFrame),
    Audio(AudioFrame),
}

impl Frame {
    pub fn kind(&self) -> MediaKind {
        match self {
            Frame::Video(_) => MediaKind::Video,
            Frame::Audio(_) => MediaKind::Audio,
        }
    }

    pub fn timestamp(&self) -> Duration {
        match self {
            Frame::Video(f) => f.timestamp,
            Frame::Audio(f) => f.timestamp,
        }
    }

    pub fn is_ready(&self) -> bool {
        match self {
            Frame::Video(f) => f.ready,
            Frame::Audio(f) => f.ready,
        }
    }
}

impl From<VideoFrame> for Frame {
    fn from(frame: VideoFrame) -> Self {
        Frame::Video(frame)
    }
}

impl From<AudioFrame> for Frame {
    fn from(frame: AudioFrame) -> Self {
        Frame::Audio(frame)
    }
}
