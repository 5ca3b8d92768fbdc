//! Camera Errors
//!
//! Acquisition failures, classified where they happen and passed through
//! unchanged to the scan controller.

use serde::Serialize;
use std::io;
use thiserror::Error;

/// Camera acquisition failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CameraError {
    /// Access to the device was denied
    #[error("camera permission denied: {message}")]
    Permission { message: String },
    /// No camera-capable backend exists on this system
    #[error("camera not supported: {message}")]
    NotSupported { message: String },
    /// No device matched the request
    #[error("no camera found: {message}")]
    NotFound { message: String },
    /// Acquisition exceeded the bounded wait
    #[error("camera timed out: {message}")]
    Timeout { message: String },
    #[error("camera error: {message}")]
    Unknown { message: String },
}

/// Error class without the message, for matching and display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CameraErrorKind {
    Permission,
    NotSupported,
    NotFound,
    Timeout,
    Unknown,
}

impl CameraErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CameraErrorKind::Permission => "permission",
            CameraErrorKind::NotSupported => "not-supported",
            CameraErrorKind::NotFound => "not-found",
            CameraErrorKind::Timeout => "timeout",
            CameraErrorKind::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for CameraErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl CameraError {
    pub fn permission(message: impl Into<String>) -> Self {
        CameraError::Permission { message: message.into() }
    }

    pub fn not_supported(message: impl Into<String>) -> Self {
        CameraError::NotSupported { message: message.into() }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        CameraError::NotFound { message: message.into() }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        CameraError::Timeout { message: message.into() }
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        CameraError::Unknown { message: message.into() }
    }

    /// Classify an IO failure while opening a device
    pub fn from_io(err: &io::Error, context: &str) -> Self {
        let message = format!("{}: {}", context, err);
        match err.kind() {
            io::ErrorKind::PermissionDenied => CameraError::permission(message),
            io::ErrorKind::NotFound => CameraError::not_found(message),
            io::ErrorKind::Unsupported => CameraError::not_supported(message),
            io::ErrorKind::TimedOut => CameraError::timeout(message),
            _ => CameraError::unknown(message),
        }
    }

    pub fn kind(&self) -> CameraErrorKind {
        match self {
            CameraError::Permission { .. } => CameraErrorKind::Permission,
            CameraError::NotSupported { .. } => CameraErrorKind::NotSupported,
            CameraError::NotFound { .. } => CameraErrorKind::NotFound,
            CameraError::Timeout { .. } => CameraErrorKind::Timeout,
            CameraError::Unknown { .. } => CameraErrorKind::Unknown,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            CameraError::Permission { message }
            | CameraError::NotSupported { message }
            | CameraError::NotFound { message }
            | CameraError::Timeout { message }
            | CameraError::Unknown { message } => message.as_str(),
        }
    }

    /// Short headline for the user
    pub fn title(&self) -> &'static str {
        match self {
            CameraError::Permission { .. } => "Camera Permission Required",
            CameraError::NotSupported { .. } => "Camera Not Supported",
            CameraError::NotFound { .. } => "No Camera Found",
            CameraError::Timeout { .. } => "Camera Timeout",
            CameraError::Unknown { .. } => "Camera Error",
        }
    }

    /// What the user should do about it
    pub fn description(&self) -> &str {
        match self {
            CameraError::Permission { .. } => {
                "Please allow camera access to scan QR codes. Check your system settings if needed."
            }
            CameraError::NotSupported { .. } => {
                "This system does not provide a camera backend."
            }
            CameraError::NotFound { .. } => "No camera device was detected on your device.",
            CameraError::Timeout { .. } => {
                "Camera initialization took too long. Please try again."
            }
            CameraError::Unknown { message } if !message.is_empty() => message.as_str(),
            CameraError::Unknown { .. } => {
                "An unknown error occurred while accessing the camera."
            }
        }
    }
}
