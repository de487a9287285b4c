//! Frame encoding for the decode endpoint.
//!
//! The backend accepts images as data URLs, so every frame goes
//! RGB -> JPEG -> base64 -> `data:image/jpeg;base64,...`.

use std::io::Cursor;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;
use thiserror::Error;

use super::types::Frame;

/// Quality used for polled frames (0.8 on a 0-1 scale).
pub const SCAN_JPEG_QUALITY: u8 = 80;

/// Quality used for the manual single-shot capture (encoder default, 0.92).
pub const CAPTURE_JPEG_QUALITY: u8 = 92;

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("frame buffer does not match {width}x{height} RGB ({len} bytes)")]
    InvalidFrame { width: u32, height: u32, len: usize },

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// JPEG-encode a frame and wrap it as a base64 data URL.
pub fn frame_to_data_url(frame: &Frame, quality: u8) -> Result<String, EncodeError> {
    let jpeg = encode_jpeg(frame, quality)?;
    Ok(data_url("image/jpeg", &jpeg))
}

/// JPEG-encode a frame. Quality is clamped to 1..=100.
pub fn encode_jpeg(frame: &Frame, quality: u8) -> Result<Vec<u8>, EncodeError> {
    if !frame.is_complete() {
        return Err(EncodeError::InvalidFrame {
            width: frame.width,
            height: frame.height,
            len: frame.data.len(),
        });
    }

    let mut out = Cursor::new(Vec::new());
    let mut encoder = JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100));
    encoder.encode(&frame.data, frame.width, frame.height, ExtendedColorType::Rgb8)?;
    Ok(out.into_inner())
}

/// Decode an encoded image (JPEG, PNG) into an RGB frame.
pub fn decode_frame(bytes: &[u8]) -> Result<Frame, EncodeError> {
    let rgb = image::load_from_memory(bytes)?.to_rgb8();
    let (width, height) = rgb.dimensions();
    Ok(Frame::rgb(rgb.into_raw(), width, height))
}

/// Read an image file as-is into a data URL, typed by its extension.
pub fn file_to_data_url(path: &Path) -> Result<String, EncodeError> {
    let bytes = std::fs::read(path)?;
    Ok(data_url(mime_for_path(path), &bytes))
}

pub fn data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Guess an image MIME type from a file extension.
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray_frame(width: u32, height: u32) -> Frame {
        Frame::rgb(vec![128; (width * height * 3) as usize], width, height)
    }

    #[test]
    fn test_frame_to_data_url_prefix() {
        let url = frame_to_data_url(&gray_frame(16, 8), SCAN_JPEG_QUALITY).unwrap();
        assert!(url.starts_with("data:image/jpeg;base64,"));

        let payload = url.trim_start_matches("data:image/jpeg;base64,");
        let jpeg = STANDARD.decode(payload).unwrap();
        // SOI marker
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_encoded_frame_decodes_to_same_size() {
        let jpeg = encode_jpeg(&gray_frame(32, 24), SCAN_JPEG_QUALITY).unwrap();
        let frame = decode_frame(&jpeg).unwrap();
        assert_eq!((frame.width, frame.height), (32, 24));
        assert!(frame.is_complete());
    }

    #[test]
    fn test_lower_quality_is_not_larger() {
        let mut frame = gray_frame(64, 64);
        for (i, px) in frame.data.iter_mut().enumerate() {
            *px = (i * 7 % 251) as u8;
        }
        let low = encode_jpeg(&frame, 10).unwrap();
        let high = encode_jpeg(&frame, 95).unwrap();
        assert!(low.len() <= high.len());
    }

    #[test]
    fn test_truncated_frame_is_rejected() {
        let frame = Frame::rgb(vec![0; 10], 4, 4);
        assert!(matches!(
            encode_jpeg(&frame, SCAN_JPEG_QUALITY),
            Err(EncodeError::InvalidFrame { len: 10, .. })
        ));
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(decode_frame(b"not an image").is_err());
    }

    #[test]
    fn test_mime_for_path() {
        assert_eq!(mime_for_path(Path::new("shot.JPG")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("a/b/label.png")), "image/png");
        assert_eq!(mime_for_path(Path::new("noext")), "application/octet-stream");
    }

    #[test]
    fn test_file_to_data_url_keeps_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("label.png");
        std::fs::write(&path, b"\x89PNG fake").unwrap();
        let url = file_to_data_url(&path).unwrap();
        assert_eq!(url, format!("data:image/png;base64,{}", STANDARD.encode(b"\x89PNG fake")));
    }
}
