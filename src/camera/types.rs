//! Camera types and data structures.

use std::fmt;
use std::time::Instant;

/// Camera resolution settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// 1280x720, the size barcode scanning asks for.
    pub const HD: Resolution = Resolution {
        width: 1280,
        height: 720,
    };
}

impl Default for Resolution {
    fn default() -> Self {
        Self::HD
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Which way the requested camera should face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Facing {
    /// Rear camera (points away from the user)
    #[default]
    Environment,
    /// Front camera
    User,
}

/// What the scanner asks of a camera. Values are ideals, not requirements.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamConstraints {
    pub facing: Facing,
    pub ideal: Resolution,
    pub aspect_ratio: f64,
}

impl Default for StreamConstraints {
    fn default() -> Self {
        Self {
            facing: Facing::Environment,
            ideal: Resolution::HD,
            aspect_ratio: 16.0 / 9.0,
        }
    }
}

/// Pixel format of a captured frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFormat {
    /// RGB format (3 bytes per pixel)
    Rgb,
}

/// A captured camera frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Raw pixel data in RGB format
    pub data: Vec<u8>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Pixel format
    pub format: FrameFormat,
    /// Timestamp when frame was captured
    pub timestamp: Instant,
}

impl Frame {
    /// Build an RGB frame from raw pixel data.
    pub fn rgb(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            data,
            width,
            height,
            format: FrameFormat::Rgb,
            timestamp: Instant::now(),
        }
    }

    /// Get the number of bytes per pixel (3 for RGB).
    pub fn bytes_per_pixel(&self) -> usize {
        match self.format {
            FrameFormat::Rgb => 3,
        }
    }

    /// True when the buffer holds exactly width * height pixels.
    pub fn is_complete(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.data.len() == self.width as usize * self.height as usize * self.bytes_per_pixel()
    }
}

/// Errors that can occur during camera operations.
#[derive(Debug)]
pub enum CameraError {
    /// Camera permission denied
    PermissionDenied,
    /// Capture device does not exist
    DeviceNotFound(String),
    /// Failed to open camera
    OpenFailed(String),
    /// The stream stopped delivering (source process exited)
    StreamFailed(String),
    /// ffmpeg is not installed
    FfmpegNotFound,
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::PermissionDenied => write!(f, "Camera permission denied"),
            CameraError::DeviceNotFound(device) => {
                write!(f, "Camera device '{}' not found", device)
            }
            CameraError::OpenFailed(msg) => write!(f, "Failed to open camera: {}", msg),
            CameraError::StreamFailed(msg) => write!(f, "Camera stream failed: {}", msg),
            CameraError::FfmpegNotFound => {
                write!(f, "FFmpeg not found. Install ffmpeg to scan from a camera")
            }
        }
    }
}

impl std::error::Error for CameraError {}

/// Classify a camera failure message, mapping access problems to
/// `PermissionDenied`.
pub fn classify_open_error(message: &str) -> CameraError {
    let msg = message.to_lowercase();
    if msg.contains("permission")
        || msg.contains("denied")
        || msg.contains("authorization")
        || msg.contains("not authorized")
    {
        CameraError::PermissionDenied
    } else if msg.contains("no such file or directory") || msg.contains("no such device") {
        CameraError::DeviceNotFound(message.trim().to_string())
    } else {
        CameraError::OpenFailed(message.trim().to_string())
    }
}
