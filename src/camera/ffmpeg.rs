//! File-backed video streams.
//!
//! A capture process (normally ffmpeg with `-update 1`) keeps overwriting a
//! single image file with the newest camera frame. The stream reads that
//! file on demand, so "enough data" simply means the file currently holds
//! a decodable image.

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};

use tempfile::TempDir;

use super::encode::decode_frame;
use super::types::{classify_open_error, CameraError, Frame, StreamConstraints};
use super::{Camera, VideoStream};

/// File name ffmpeg writes the newest frame to.
const FRAME_FILE: &str = "frame.jpg";

/// Frame rate the capture process is asked for. Polling is much slower.
const CAPTURE_FPS: u32 = 10;

/// Camera that reads frames some other process writes to `path`.
#[derive(Debug, Clone)]
pub struct FrameFileCamera {
    path: PathBuf,
}

impl FrameFileCamera {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Camera for FrameFileCamera {
    fn open(&mut self, constraints: &StreamConstraints) -> Result<Box<dyn VideoStream>, CameraError> {
        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        if !parent.is_dir() {
            return Err(CameraError::DeviceNotFound(self.path.display().to_string()));
        }
        log::info!(
            "Reading frames from {} (ideal {})",
            self.path.display(),
            constraints.ideal
        );
        Ok(Box::new(FrameFileStream::new(self.path.clone(), None, None)))
    }
}

/// Camera backed by an ffmpeg capture process.
#[derive(Debug, Clone)]
pub struct FfmpegCamera {
    device: String,
}

impl FfmpegCamera {
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
        }
    }

    /// Platform default capture device.
    pub fn default_device() -> &'static str {
        if cfg!(target_os = "macos") {
            "0"
        } else {
            "/dev/video0"
        }
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    /// ffmpeg arguments that keep `output` updated with the newest frame.
    pub fn capture_args(&self, constraints: &StreamConstraints, output: &Path) -> Vec<String> {
        let input_format = if cfg!(target_os = "macos") {
            "avfoundation"
        } else {
            "v4l2"
        };
        let mut args: Vec<String> = vec!["-hide_banner".into(), "-loglevel".into(), "error".into()];
        args.extend(["-f".into(), input_format.into()]);
        if cfg!(target_os = "macos") {
            // avfoundation refuses to open without an explicit rate
            args.extend(["-framerate".into(), "30".into()]);
        }
        args.extend([
            "-video_size".into(),
            constraints.ideal.to_string(),
            "-i".into(),
            self.device.clone(),
            "-vf".into(),
            format!("fps={}", CAPTURE_FPS),
            "-q:v".into(),
            "2".into(),
            "-update".into(),
            "1".into(),
            "-y".into(),
            output.display().to_string(),
        ]);
        args
    }
}

impl Camera for FfmpegCamera {
    fn open(&mut self, constraints: &StreamConstraints) -> Result<Box<dyn VideoStream>, CameraError> {
        log::debug!(
            "Facing mode {:?} is advisory for ffmpeg devices; using {}",
            constraints.facing,
            self.device
        );

        let dir = tempfile::Builder::new()
            .prefix("fooderator-")
            .tempdir()
            .map_err(|e| CameraError::OpenFailed(e.to_string()))?;
        let output = dir.path().join(FRAME_FILE);
        let args = self.capture_args(constraints, &output);
        log::debug!("Spawning ffmpeg {}", args.join(" "));

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    CameraError::FfmpegNotFound
                } else {
                    CameraError::OpenFailed(e.to_string())
                }
            })?;

        let stderr = child.stderr.take();
        let stderr_thread = stderr.map(|stderr| {
            thread::spawn(move || {
                let reader = BufReader::new(stderr);
                let mut lines = Vec::new();
                for line in reader.lines() {
                    match line {
                        Ok(l) => {
                            log::debug!("[ffmpeg] {}", l);
                            lines.push(l);
                        }
                        Err(_) => break,
                    }
                }
                lines
            })
        });

        Ok(Box::new(FrameFileStream::new(
            output,
            Some(CaptureProcess {
                child,
                stderr_thread,
            }),
            Some(dir),
        )))
    }
}

struct CaptureProcess {
    child: Child,
    stderr_thread: Option<JoinHandle<Vec<String>>>,
}

impl CaptureProcess {
    fn take_stderr_output(&mut self) -> Vec<String> {
        self.stderr_thread
            .take()
            .and_then(|h| h.join().ok())
            .unwrap_or_default()
    }
}

/// Stream over a frame file, optionally owning the process that writes it.
pub struct FrameFileStream {
    path: PathBuf,
    process: Option<CaptureProcess>,
    // Keeps the frame directory alive for the lifetime of the stream
    _dir: Option<TempDir>,
    stopped: bool,
}

impl std::fmt::Debug for FrameFileStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameFileStream")
            .field("path", &self.path)
            .field("has_process", &self.process.is_some())
            .field("stopped", &self.stopped)
            .finish_non_exhaustive()
    }
}

impl FrameFileStream {
    fn new(path: PathBuf, process: Option<CaptureProcess>, dir: Option<TempDir>) -> Self {
        Self {
            path,
            process,
            _dir: dir,
            stopped: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_frame(&self) -> Option<Frame> {
        let bytes = std::fs::read(&self.path).ok()?;
        // A half-written file fails to decode; the next tick will retry
        decode_frame(&bytes).ok()
    }
}

impl VideoStream for FrameFileStream {
    fn has_enough_data(&mut self) -> bool {
        !self.stopped
            && std::fs::metadata(&self.path)
                .map(|m| m.len() > 0)
                .unwrap_or(false)
    }

    fn current_frame(&mut self) -> Option<Frame> {
        if self.stopped {
            return None;
        }
        self.read_frame()
    }

    fn health(&mut self) -> Result<(), CameraError> {
        let Some(process) = self.process.as_mut() else {
            return Ok(());
        };
        match process.child.try_wait() {
            Ok(None) => Ok(()),
            Ok(Some(status)) => {
                let stderr = process.take_stderr_output().join("\n");
                log::warn!("ffmpeg exited with {}: {}", status, stderr);
                if stderr.trim().is_empty() {
                    Err(CameraError::StreamFailed(format!("ffmpeg exited with {}", status)))
                } else {
                    Err(classify_open_error(&stderr))
                }
            }
            Err(e) => Err(CameraError::StreamFailed(e.to_string())),
        }
    }

    fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        if let Some(process) = self.process.as_mut() {
            if matches!(process.child.try_wait(), Ok(None)) {
                let _ = process.child.kill();
            }
            let _ = process.child.wait();
            let _ = process.take_stderr_output();
        }
        log::debug!("Stream on {} stopped", self.path.display());
    }

    fn is_stopped(&self) -> bool {
        self.stopped
    }
}

impl Drop for FrameFileStream {
    fn drop(&mut self) {
        self.stop();
    }
}
