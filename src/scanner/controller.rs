//! Continuous barcode scanning.
//!
//! The controller owns at most one [`ScanSession`]. While scanning, every
//! poll tick samples the stream and fires a decode request without waiting
//! for earlier ones, so responses can arrive late and out of order. Each
//! response carries the id of the session that sent it and is dropped
//! unless that session is still the one scanning.

use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::Interval;

use super::session::{CaptureIndicator, ScanSession, ScanState, SessionId};
use crate::api::{ApiClient, ApiError, ScanResponse};
use crate::camera::{
    frame_to_data_url, Camera, CameraError, EncodeError, Frame, StreamConstraints,
    CAPTURE_JPEG_QUALITY, SCAN_JPEG_QUALITY,
};
use crate::config::ScanConfig;

/// Message shown when the camera cannot be opened or dies mid-scan.
pub const CAMERA_ERROR_MESSAGE: &str =
    "Unable to access camera. Please ensure camera permissions are granted.";

/// Timing and encoding knobs for the capture loop.
#[derive(Debug, Clone)]
pub struct ScanSettings {
    pub interval: Duration,
    pub found_delay: Duration,
    pub jpeg_quality: u8,
    pub capture_quality: u8,
    pub constraints: StreamConstraints,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(300),
            found_delay: Duration::from_secs(1),
            jpeg_quality: SCAN_JPEG_QUALITY,
            capture_quality: CAPTURE_JPEG_QUALITY,
            constraints: StreamConstraints::default(),
        }
    }
}

impl From<&ScanConfig> for ScanSettings {
    fn from(config: &ScanConfig) -> Self {
        Self {
            interval: config.interval(),
            found_delay: config.found_delay(),
            jpeg_quality: config.jpeg_quality,
            capture_quality: CAPTURE_JPEG_QUALITY,
            constraints: config.constraints(),
        }
    }
}

/// User input while the scanner is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanCommand {
    /// Take a single shot now instead of waiting for polling.
    Capture,
    /// Close the scanner.
    Close,
}

/// How a scanning run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Polling decoded a barcode.
    Found(String),
    /// Manual capture; the frame still has to be decoded.
    Captured(String),
    Cancelled,
}

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("Unable to access camera. Please ensure camera permissions are granted.")]
    CameraUnavailable(#[source] CameraError),

    #[error("No frame available to capture")]
    NoFrame,

    #[error("Failed to encode frame: {0}")]
    Encode(#[from] EncodeError),
}

struct DecodeReport {
    session: SessionId,
    outcome: Result<ScanResponse, ApiError>,
}

enum LoopEvent {
    Tick,
    Report(DecodeReport),
    Command(Option<ScanCommand>),
}

pub struct ScanController {
    client: ApiClient,
    settings: ScanSettings,
    state: ScanState,
    indicator: CaptureIndicator,
    session: Option<ScanSession>,
    next_session: SessionId,
    frames_submitted: u64,
    reports_tx: UnboundedSender<DecodeReport>,
    reports_rx: UnboundedReceiver<DecodeReport>,
}

impl std::fmt::Debug for ScanController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanController")
            .field("state", &self.state)
            .field("indicator", &self.indicator)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl ScanController {
    pub fn new(client: ApiClient, settings: ScanSettings) -> Self {
        let (reports_tx, reports_rx) = mpsc::unbounded_channel();
        Self {
            client,
            settings,
            state: ScanState::Idle,
            indicator: CaptureIndicator::Capture,
            session: None,
            next_session: 1,
            frames_submitted: 0,
            reports_tx,
            reports_rx,
        }
    }

    pub fn state(&self) -> &ScanState {
        &self.state
    }

    pub fn indicator(&self) -> CaptureIndicator {
        self.indicator
    }

    pub fn settings(&self) -> &ScanSettings {
        &self.settings
    }

    pub fn is_scanning(&self) -> bool {
        self.state == ScanState::Scanning
    }

    /// Id of the live session, if any.
    pub fn session_id(&self) -> Option<SessionId> {
        self.session.as_ref().map(ScanSession::id)
    }

    pub fn is_polling(&self) -> bool {
        self.session.as_ref().is_some_and(ScanSession::is_polling)
    }

    /// Number of frames sent to the decoder since the controller was built.
    pub fn frames_submitted(&self) -> u64 {
        self.frames_submitted
    }

    /// Ask `camera` for a stream and start polling it.
    ///
    /// Any previous session is closed first. Must be called from within a
    /// tokio runtime.
    pub fn open_camera(&mut self, camera: &mut dyn Camera) -> Result<SessionId, ScanError> {
        self.close();
        self.state = ScanState::RequestingPermission;

        match camera.open(&self.settings.constraints) {
            Ok(stream) => {
                let id = self.next_session;
                self.next_session += 1;

                let mut session = ScanSession::new(id, stream);
                session.start_polling(self.settings.interval);
                self.session = Some(session);
                self.state = ScanState::Scanning;
                self.indicator = CaptureIndicator::Scanning;
                log::info!("Scan session {} started", id);
                Ok(id)
            }
            Err(e) => {
                log::error!("Camera access error: {}", e);
                self.state = ScanState::Idle;
                self.indicator = CaptureIndicator::Capture;
                Err(ScanError::CameraUnavailable(e))
            }
        }
    }

    /// One poll tick: sample the stream and submit the frame if it is ready.
    ///
    /// Returns whether a frame was submitted. A dead stream ends the session
    /// with `ScanError::CameraUnavailable`.
    pub fn tick(&mut self) -> Result<bool, ScanError> {
        if self.state != ScanState::Scanning {
            return Ok(false);
        }
        let Some(session) = self.session.as_mut() else {
            return Ok(false);
        };
        let id = session.id();
        let stream = session.stream_mut();

        if let Err(e) = stream.health() {
            log::error!("Camera stream lost: {}", e);
            self.close();
            return Err(ScanError::CameraUnavailable(e));
        }
        if !stream.has_enough_data() {
            return Ok(false);
        }
        let Some(frame) = stream.current_frame() else {
            return Ok(false);
        };

        if !frame.is_complete() {
            log::debug!("Skipping partial {}x{} frame", frame.width, frame.height);
            return Ok(false);
        }
        self.submit(id, frame);
        Ok(true)
    }

    /// Encode `frame` on the blocking pool, then send it to the decoder.
    fn submit(&mut self, session: SessionId, frame: Frame) {
        self.frames_submitted += 1;
        let client = self.client.clone();
        let tx = self.reports_tx.clone();
        let quality = self.settings.jpeg_quality;
        tokio::spawn(async move {
            let encoded =
                tokio::task::spawn_blocking(move || frame_to_data_url(&frame, quality)).await;
            let image = match encoded {
                Ok(Ok(image)) => image,
                Ok(Err(e)) => {
                    log::debug!("Skipping frame that failed to encode: {}", e);
                    return;
                }
                Err(e) => {
                    log::warn!("Frame encoder task failed: {}", e);
                    return;
                }
            };
            let outcome = client.scan_barcode(&image).await;
            // The controller may be gone; nobody is waiting for the result then
            let _ = tx.send(DecodeReport { session, outcome });
        });
    }

    /// Apply one decode result.
    ///
    /// Returns the barcode if this result ended the session's scanning.
    /// Results from sessions that are no longer scanning are discarded, and
    /// failed requests are ignored so polling carries on.
    pub fn accept_result(
        &mut self,
        session: SessionId,
        outcome: Result<ScanResponse, ApiError>,
    ) -> Option<String> {
        let active = self.state == ScanState::Scanning && self.session_id() == Some(session);
        if !active {
            log::debug!("Discarding decode result from inactive session {}", session);
            return None;
        }

        let response = match outcome {
            Ok(response) => response,
            Err(e) => {
                log::debug!("Decode tick failed, still scanning: {}", e);
                return None;
            }
        };
        let barcode = response.found()?.to_string();

        if let Some(session) = self.session.as_mut() {
            session.stop_polling();
        }
        self.state = ScanState::Found(barcode.clone());
        self.indicator = CaptureIndicator::Found;
        log::info!("Barcode found: {}", barcode);
        Some(barcode)
    }

    /// Grab the current frame for a single-shot decode and close the session.
    ///
    /// Returns `Ok(None)` when no session is open.
    pub fn manual_capture(&mut self) -> Result<Option<String>, ScanError> {
        let Some(session) = self.session.as_mut() else {
            return Ok(None);
        };
        let frame = session.stream_mut().current_frame();
        self.close();

        let frame = frame.ok_or(ScanError::NoFrame)?;
        let image = frame_to_data_url(&frame, self.settings.capture_quality)?;
        Ok(Some(image))
    }

    /// Stop polling, release the stream, reset the indicator.
    ///
    /// Safe to call at any time, any number of times.
    pub fn close(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.release();
            log::debug!("Scan session {} closed", session.id());
        }
        self.state = ScanState::Idle;
        self.indicator = CaptureIndicator::Capture;
    }

    /// Drive the open session until a barcode is found, the user captures
    /// or closes, or the camera fails.
    ///
    /// After a barcode is found the session stays up for the confirmation
    /// delay, then closes.
    pub async fn run(
        &mut self,
        commands: &mut UnboundedReceiver<ScanCommand>,
    ) -> Result<ScanOutcome, ScanError> {
        let mut commands_open = true;

        loop {
            if self.state != ScanState::Scanning {
                self.close();
                return Ok(ScanOutcome::Cancelled);
            }

            let event = {
                let poll = self.session.as_mut().and_then(|s| s.poll_timer());
                tokio::select! {
                    _ = next_tick(poll) => LoopEvent::Tick,
                    Some(report) = self.reports_rx.recv() => LoopEvent::Report(report),
                    command = commands.recv(), if commands_open => LoopEvent::Command(command),
                }
            };

            match event {
                LoopEvent::Tick => {
                    self.tick()?;
                }
                LoopEvent::Report(report) => {
                    if let Some(barcode) = self.accept_result(report.session, report.outcome) {
                        tokio::time::sleep(self.settings.found_delay).await;
                        self.close();
                        return Ok(ScanOutcome::Found(barcode));
                    }
                }
                LoopEvent::Command(Some(ScanCommand::Capture)) => {
                    return match self.manual_capture()? {
                        Some(image) => Ok(ScanOutcome::Captured(image)),
                        None => Ok(ScanOutcome::Cancelled),
                    };
                }
                LoopEvent::Command(Some(ScanCommand::Close)) => {
                    self.close();
                    return Ok(ScanOutcome::Cancelled);
                }
                LoopEvent::Command(None) => commands_open = false,
            }
        }
    }

    /// Apply every decode result that has already arrived.
    ///
    /// Returns the barcode if one of them ended scanning.
    pub fn drain_results(&mut self) -> Option<String> {
        let mut found = None;
        while let Ok(report) = self.reports_rx.try_recv() {
            if let Some(barcode) = self.accept_result(report.session, report.outcome) {
                found = Some(barcode);
            }
        }
        found
    }
}

impl Drop for ScanController {
    fn drop(&mut self) {
        self.close();
    }
}

async fn next_tick(poll: Option<&mut Interval>) {
    match poll {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::VideoStream;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct StillStream {
        frame: Option<Frame>,
        stops: Arc<AtomicUsize>,
        stopped: bool,
    }

    impl VideoStream for StillStream {
        fn has_enough_data(&mut self) -> bool {
            !self.stopped && self.frame.is_some()
        }

        fn current_frame(&mut self) -> Option<Frame> {
            self.frame.clone()
        }

        fn stop(&mut self) {
            if !self.stopped {
                self.stopped = true;
                self.stops.fetch_add(1, Ordering::SeqCst);
            }
        }

        fn is_stopped(&self) -> bool {
            self.stopped
        }
    }

    struct StillCamera {
        stops: Arc<AtomicUsize>,
        deny: bool,
        partial: bool,
    }

    impl Camera for StillCamera {
        fn open(
            &mut self,
            _constraints: &StreamConstraints,
        ) -> Result<Box<dyn VideoStream>, CameraError> {
            if self.deny {
                return Err(CameraError::PermissionDenied);
            }
            // A partial frame is missing its last row
            let len = if self.partial { 4 * 3 * 3 } else { 4 * 4 * 3 };
            Ok(Box::new(StillStream {
                frame: Some(Frame::rgb(vec![90; len], 4, 4)),
                stops: Arc::clone(&self.stops),
                stopped: false,
            }))
        }
    }

    fn controller() -> ScanController {
        // Nothing listens here; these tests never let a request complete
        let client = ApiClient::new("http://127.0.0.1:9").unwrap();
        ScanController::new(client, ScanSettings::default())
    }

    fn camera() -> (StillCamera, Arc<AtomicUsize>) {
        let stops = Arc::new(AtomicUsize::new(0));
        (
            StillCamera {
                stops: Arc::clone(&stops),
                deny: false,
                partial: false,
            },
            stops,
        )
    }

    fn found(barcode: &str) -> Result<ScanResponse, ApiError> {
        Ok(ScanResponse {
            barcode: Some(barcode.to_string()),
            symbology: None,
        })
    }

    #[tokio::test]
    async fn test_open_camera_starts_scanning() {
        let mut controller = controller();
        let (mut camera, _) = camera();
        let id = controller.open_camera(&mut camera).unwrap();
        assert_eq!(controller.session_id(), Some(id));
        assert!(controller.is_scanning());
        assert!(controller.is_polling());
        assert_eq!(controller.indicator(), CaptureIndicator::Scanning);
    }

    #[tokio::test]
    async fn test_denied_camera_returns_to_idle() {
        let mut controller = controller();
        let mut camera = StillCamera {
            stops: Arc::new(AtomicUsize::new(0)),
            deny: true,
            partial: false,
        };
        let err = controller.open_camera(&mut camera).unwrap_err();
        assert_eq!(err.to_string(), CAMERA_ERROR_MESSAGE);
        assert_eq!(controller.state(), &ScanState::Idle);
        assert_eq!(controller.indicator(), CaptureIndicator::Capture);
        assert!(controller.session_id().is_none());
    }

    #[tokio::test]
    async fn test_close_twice_matches_close_once() {
        let mut controller = controller();
        let (mut camera, stops) = camera();
        controller.open_camera(&mut camera).unwrap();

        controller.close();
        let once = (controller.state().clone(), controller.indicator(), controller.is_polling());
        controller.close();
        let twice = (controller.state().clone(), controller.indicator(), controller.is_polling());

        assert_eq!(once, twice);
        assert_eq!(twice, (ScanState::Idle, CaptureIndicator::Capture, false));
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_close_when_idle_is_noop() {
        let mut controller = controller();
        controller.close();
        assert_eq!(controller.state(), &ScanState::Idle);
        assert_eq!(controller.indicator(), CaptureIndicator::Capture);
    }

    #[tokio::test]
    async fn test_first_barcode_wins() {
        let mut controller = controller();
        let (mut camera, _) = camera();
        let id = controller.open_camera(&mut camera).unwrap();

        assert_eq!(controller.accept_result(id, found("111")), Some("111".to_string()));
        assert!(!controller.is_polling());
        assert_eq!(controller.indicator(), CaptureIndicator::Found);
        // A second in-flight response must not fire another transition
        assert_eq!(controller.accept_result(id, found("222")), None);
        assert_eq!(controller.state(), &ScanState::Found("111".to_string()));
    }

    #[tokio::test]
    async fn test_result_after_close_is_discarded() {
        let mut controller = controller();
        let (mut camera, _) = camera();
        let id = controller.open_camera(&mut camera).unwrap();
        controller.close();

        assert_eq!(controller.accept_result(id, found("012345")), None);
        assert_eq!(controller.state(), &ScanState::Idle);
    }

    #[tokio::test]
    async fn test_result_from_previous_session_is_discarded() {
        let mut controller = controller();
        let (mut camera, _) = camera();
        let first = controller.open_camera(&mut camera).unwrap();
        let second = controller.open_camera(&mut camera).unwrap();
        assert_ne!(first, second);

        assert_eq!(controller.accept_result(first, found("012345")), None);
        assert!(controller.is_scanning());
    }

    #[tokio::test]
    async fn test_failed_tick_keeps_scanning() {
        let mut controller = controller();
        let (mut camera, _) = camera();
        let id = controller.open_camera(&mut camera).unwrap();

        let failed = Err(ApiError::ScanFailed { status: 404 });
        assert_eq!(controller.accept_result(id, failed), None);
        let empty = Ok(ScanResponse::default());
        assert_eq!(controller.accept_result(id, empty), None);
        assert!(controller.is_scanning());
        assert!(controller.is_polling());
    }

    #[tokio::test]
    async fn test_tick_submits_ready_frames() {
        let mut controller = controller();
        let (mut camera, _) = camera();
        controller.open_camera(&mut camera).unwrap();

        assert!(controller.tick().unwrap());
        assert!(controller.tick().unwrap());
        assert_eq!(controller.frames_submitted(), 2);

        controller.close();
        assert!(!controller.tick().unwrap());
        assert_eq!(controller.frames_submitted(), 2);
    }

    #[tokio::test]
    async fn test_partial_frame_is_not_submitted() {
        let mut controller = controller();
        let mut camera = StillCamera {
            stops: Arc::new(AtomicUsize::new(0)),
            deny: false,
            partial: true,
        };
        controller.open_camera(&mut camera).unwrap();

        assert!(!controller.tick().unwrap());
        assert_eq!(controller.frames_submitted(), 0);
        assert!(controller.is_scanning());
    }

    #[tokio::test]
    async fn test_tick_returns_before_encoding_finishes() {
        let mut controller = controller();
        let (mut camera, _) = camera();
        controller.open_camera(&mut camera).unwrap();

        assert!(controller.tick().unwrap());
        // The encoder and request run on other tasks; nothing has reported yet
        assert_eq!(controller.drain_results(), None);
        assert!(controller.is_scanning());
    }

    #[tokio::test]
    async fn test_manual_capture_closes_session() {
        let mut controller = controller();
        let (mut camera, stops) = camera();
        controller.open_camera(&mut camera).unwrap();

        let image = controller.manual_capture().unwrap().unwrap();
        assert!(image.starts_with("data:image/jpeg;base64,"));
        assert_eq!(controller.state(), &ScanState::Idle);
        assert_eq!(stops.load(Ordering::SeqCst), 1);
        assert_eq!(controller.manual_capture().unwrap(), None);
    }

    #[tokio::test]
    async fn test_run_returns_cancelled_on_close_command() {
        let mut controller = controller();
        let (mut camera, stops) = camera();
        controller.open_camera(&mut camera).unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.send(ScanCommand::Close).unwrap();
        let outcome = controller.run(&mut rx).await.unwrap();
        assert_eq!(outcome, ScanOutcome::Cancelled);
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }
}
