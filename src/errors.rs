// SPDX-License-Identifier: MPL-2.0

//! Error types for the recorder
//!
//! Frame drops are not errors: a frame that cannot be written in time is
//! counted in [`crate::pipelines::video::RecordingStats`], never
//! reported as an error.

use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Top-level error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Capture source errors (passed through unmodified)
    Capture(CaptureError),
    /// Recording-related errors
    Recording(RecordingError),
    /// Still image errors
    Photo(PhotoError),
    /// Configuration errors
    Config(String),
    /// Storage/filesystem errors
    Storage(String),
    /// Generic error with message
    Other(String),
}

/// Errors raised by a capture source
///
/// The recorder never retries these; they reach the caller exactly as the
/// source reported them.
#[derive(Debug, Clone)]
pub enum CaptureError {
    /// No capture device could be opened
    NoDevice,
    /// Source failed to initialize
    InitializationFailed(String),
    /// Source is already delivering frames
    AlreadyRunning,
    /// No frame has been captured yet
    NoFrameAvailable,
    /// Backend error (e.g., GStreamer)
    BackendError(String),
}

/// Recording-specific errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordingError {
    /// Output could not be opened or an encoder could not be configured
    StartFailed(String),
    /// Stop could not complete (e.g. the stopping task died)
    StopFailed(String),
    /// Container could not be finalized; the file may be unplayable
    FinalizeFailed(String),
    /// Encoder not available
    EncoderNotAvailable(String),
    /// A start or stop is already in progress
    Busy(&'static str),
    /// No recording is active and none has completed
    NotRecording,
    /// The container rejected a sample
    AppendFailed(String),
    /// Pipeline error while recording
    PipelineError(String),
}

/// Still image errors
#[derive(Debug, Clone)]
pub enum PhotoError {
    /// No still image path is attached to the session
    Unavailable,
    /// Capture failed at the source
    CaptureFailed(CaptureError),
    /// Frame could not be converted or encoded
    EncodingFailed(String),
    /// Save failed
    SaveFailed(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Capture(e) => write!(f, "Capture error: {}", e),
            AppError::Recording(e) => write!(f, "Recording error: {}", e),
            AppError::Photo(e) => write!(f, "Photo error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::NoDevice => write!(f, "No capture device found"),
            CaptureError::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            CaptureError::AlreadyRunning => write!(f, "Capture source is already running"),
            CaptureError::NoFrameAvailable => write!(f, "No frame available"),
            CaptureError::BackendError(msg) => write!(f, "Backend error: {}", msg),
        }
    }
}

impl fmt::Display for RecordingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordingError::StartFailed(msg) => write!(f, "Failed to start recording: {}", msg),
            RecordingError::StopFailed(msg) => write!(f, "Failed to stop recording: {}", msg),
            RecordingError::FinalizeFailed(msg) => {
                write!(f, "Failed to finalize recording (file may be unplayable): {}", msg)
            }
            RecordingError::EncoderNotAvailable(msg) => write!(f, "Encoder not available: {}", msg),
            RecordingError::Busy(what) => write!(f, "Recorder busy: {}", what),
            RecordingError::NotRecording => write!(f, "No recording in progress"),
            RecordingError::AppendFailed(msg) => write!(f, "Failed to append sample: {}", msg),
            RecordingError::PipelineError(msg) => write!(f, "Pipeline error: {}", msg),
        }
    }
}

impl fmt::Display for PhotoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhotoError::Unavailable => write!(f, "Still image capture is not available"),
            PhotoError::CaptureFailed(e) => write!(f, "Capture failed: {}", e),
            PhotoError::EncodingFailed(msg) => write!(f, "Encoding failed: {}", msg),
            PhotoError::SaveFailed(msg) => write!(f, "Save failed: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for CaptureError {}
impl std::error::Error for RecordingError {}
impl std::error::Error for PhotoError {}

impl From<CaptureError> for AppError {
    fn from(err: CaptureError) -> Self {
        AppError::Capture(err)
    }
}

impl From<RecordingError> for AppError {
    fn from(err: RecordingError) -> Self {
        AppError::Recording(err)
    }
}

impl From<PhotoError> for AppError {
    fn from(err: PhotoError) -> Self {
        AppError::Photo(err)
    }
}

impl From<CaptureError> for PhotoError {
    fn from(err: CaptureError) -> Self {
        PhotoError::CaptureFailed(err)
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<std::io::Error> for PhotoError {
    fn from(err: std::io::Error) -> Self {
        PhotoError::SaveFailed(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(err.to_string())
    }
}
