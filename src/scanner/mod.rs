//! The camera capture loop.
//!
//! A [`ScanController`] opens a [`ScanSession`] on a camera, polls it at a
//! fixed interval, and submits each sampled frame to the barcode decoder
//! until one comes back with a barcode or the user captures or closes.

mod controller;
mod session;

pub use controller::{
    ScanCommand, ScanController, ScanError, ScanOutcome, ScanSettings, CAMERA_ERROR_MESSAGE,
};
pub use session::{CaptureIndicator, ScanSession, ScanState, SessionId};
