//! Scan session state.

use std::fmt;
use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior};

use crate::camera::VideoStream;

pub type SessionId = u64;

/// Shortest poll period; tokio intervals reject a zero period.
const MIN_POLL_PERIOD: Duration = Duration::from_millis(1);

/// Where the capture loop is.
///
/// Cancelled and failed sessions go straight back to `Idle`; the way they
/// ended is reported through `ScanOutcome` / `ScanError`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ScanState {
    #[default]
    Idle,
    RequestingPermission,
    Scanning,
    /// A barcode was decoded; waiting out the confirmation delay.
    Found(String),
}

/// The capture button, as the user sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureIndicator {
    #[default]
    Capture,
    Scanning,
    Found,
}

impl CaptureIndicator {
    pub fn label(self) -> &'static str {
        match self {
            CaptureIndicator::Capture => "📸 Capture",
            CaptureIndicator::Scanning => "🔍 Scanning...",
            CaptureIndicator::Found => "✅ Barcode Found!",
        }
    }

    /// Manual capture is only offered while not polling.
    pub fn enabled(self) -> bool {
        matches!(self, CaptureIndicator::Capture)
    }
}

impl fmt::Display for CaptureIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One camera-scanning attempt: the stream it owns and its poll timer.
pub struct ScanSession {
    id: SessionId,
    stream: Box<dyn VideoStream>,
    poll: Option<Interval>,
}

impl fmt::Debug for ScanSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanSession")
            .field("id", &self.id)
            .field("polling", &self.is_polling())
            .field("stream_stopped", &self.stream.is_stopped())
            .finish()
    }
}

impl ScanSession {
    pub fn new(id: SessionId, stream: Box<dyn VideoStream>) -> Self {
        Self {
            id,
            stream,
            poll: None,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Start the poll timer. The first tick fires one `period` from now.
    ///
    /// Returns false, leaving the running timer alone, if already polling.
    /// Periods below 1 ms are raised to 1 ms. Must be called from within a
    /// tokio runtime.
    pub fn start_polling(&mut self, period: Duration) -> bool {
        if self.poll.is_some() {
            return false;
        }
        let period = period.max(MIN_POLL_PERIOD);
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        self.poll = Some(interval);
        true
    }

    pub fn stop_polling(&mut self) {
        self.poll = None;
    }

    pub fn is_polling(&self) -> bool {
        self.poll.is_some()
    }

    pub(crate) fn poll_timer(&mut self) -> Option<&mut Interval> {
        self.poll.as_mut()
    }

    pub fn stream_mut(&mut self) -> &mut dyn VideoStream {
        self.stream.as_mut()
    }

    /// Stop polling and stop every track of the stream.
    pub fn release(&mut self) {
        self.stop_polling();
        self.stream.stop();
    }
}

impl Drop for ScanSession {
    fn drop(&mut self) {
        self.release();
    }
}
