// SPDX-License-Identifier: MPL-2.0

//! Error types for the data collection tools

use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Configuration errors
    Config(String),
    /// Storage/filesystem errors
    Storage(String),
}

/// Camera-specific errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    /// Camera missing or not streaming
    Unavailable(String),
    /// No frame arrived within the timeout
    ReadFailed,
    /// Frame source has no more frames
    EndOfStream,
    /// Backend error (e.g., GStreamer)
    BackendError(String),
}

/// Capture errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// All datasets have already been captured
    SessionComplete,
    /// Frame buffer did not match its declared dimensions
    InvalidFrame(String),
    /// Encoding failed
    EncodingFailed(String),
    /// Save failed
    SaveFailed(String),
}

/// Form validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputError {
    /// A field was not an integer
    NotInteger,
    /// A field was zero or negative
    NotPositive,
}

impl InputError {
    /// Dialog title for this error
    pub fn title(&self) -> &'static str {
        "Input Error"
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::Unavailable(msg) => write!(f, "Unable to access the camera: {}", msg),
            CameraError::ReadFailed => write!(f, "Could not read from camera"),
            CameraError::EndOfStream => write!(f, "No more frames"),
            CameraError::BackendError(msg) => write!(f, "Backend error: {}", msg),
        }
    }
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::SessionComplete => {
                write!(f, "All datasets and images have been captured")
            }
            CaptureError::InvalidFrame(msg) => write!(f, "Invalid frame: {}", msg),
            CaptureError::EncodingFailed(msg) => write!(f, "Encoding failed: {}", msg),
            CaptureError::SaveFailed(msg) => write!(f, "Save failed: {}", msg),
        }
    }
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::NotInteger => write!(f, "Please enter valid integers."),
            InputError::NotPositive => write!(f, "All numbers should be greater than zero."),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for CameraError {}
impl std::error::Error for CaptureError {}
impl std::error::Error for InputError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<std::io::Error> for CaptureError {
    fn from(err: std::io::Error) -> Self {
        CaptureError::SaveFailed(err.to_string())
    }
}

impl From<image::ImageError> for CaptureError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(e) => CaptureError::SaveFailed(e.to_string()),
            other => CaptureError::EncodingFailed(other.to_string()),
        }
    }
}

impl From<gstreamer::glib::Error> for CameraError {
    fn from(err: gstreamer::glib::Error) -> Self {
        CameraError::BackendError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_becomes_storage() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = AppError::from(io);
        assert!(matches!(err, AppError::Storage(_)));
        assert_eq!(err.to_string(), "Storage error: denied");
    }

    #[test]
    fn test_image_io_error_is_save_failure() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = CaptureError::from(image::ImageError::IoError(io));
        assert_eq!(err, CaptureError::SaveFailed("gone".to_string()));
    }

    #[test]
    fn test_input_messages() {
        assert_eq!(InputError::NotInteger.to_string(), "Please enter valid integers.");
        assert_eq!(
            InputError::NotPositive.to_string(),
            "All numbers should be greater than zero."
        );
        assert_eq!(InputError::NotPositive.title(), "Input Error");
    }
}
