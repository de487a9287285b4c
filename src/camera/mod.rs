//! Camera access for barcode scanning.
//!
//! This module provides the capture side of the scanner:
//! - [`Camera`] opens a [`VideoStream`] for a set of [`StreamConstraints`]
//! - [`FfmpegCamera`] and [`FrameFileCamera`] are the concrete sources
//! - [`frame_to_data_url`] turns a [`Frame`] into what the decode endpoint accepts

mod encode;
mod ffmpeg;
mod types;

pub use encode::{
    data_url, decode_frame, encode_jpeg, file_to_data_url, frame_to_data_url, mime_for_path,
    EncodeError, CAPTURE_JPEG_QUALITY, SCAN_JPEG_QUALITY,
};
pub use ffmpeg::{FfmpegCamera, FrameFileCamera, FrameFileStream};
pub use types::{
    classify_open_error, CameraError, Facing, Frame, FrameFormat, Resolution, StreamConstraints,
};

/// Something that can grant a video stream.
pub trait Camera {
    /// Request a stream. Failure here is a stream-acquisition failure.
    fn open(&mut self, constraints: &StreamConstraints) -> Result<Box<dyn VideoStream>, CameraError>;
}

/// A live video stream owned by one scan session.
pub trait VideoStream: Send {
    /// Whether a full frame is buffered and can be sampled right now.
    fn has_enough_data(&mut self) -> bool;

    /// The newest frame, if one can be read.
    fn current_frame(&mut self) -> Option<Frame>;

    /// Report a source that has died since the stream was opened.
    fn health(&mut self) -> Result<(), CameraError> {
        Ok(())
    }

    /// Stop all tracks. Calling this more than once is harmless.
    fn stop(&mut self);

    fn is_stopped(&self) -> bool;
}
