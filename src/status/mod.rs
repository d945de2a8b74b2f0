//! Operator-facing status indicator.
//!
//! The presenter exclusively owns the single status region. Every
//! render overwrites it; no history is kept.

use crate::client::AttendanceOutcome;
use std::fmt;
use std::io::Write;

/// Text shown when the attendance server cannot be reached.
pub const NETWORK_FAILURE_TEXT: &str = "Unable to mark attendance. Check network/server.";
pub const RUNNING_TEXT: &str = "Scanner is running...";
pub const STOPPED_TEXT: &str = "Scanner stopped.";

/// Visual class of the indicator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusKind {
    #[default]
    Idle,
    Success,
    Error,
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StatusKind::Idle => "idle",
            StatusKind::Success => "success",
            StatusKind::Error => "error",
        })
    }
}

/// Current content of the status region.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusIndicator {
    pub kind: StatusKind,
    pub text: String,
}

impl StatusIndicator {
    pub fn new(kind: StatusKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Anything the presenter can render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusUpdate {
    /// Classified result of a submission.
    Outcome(AttendanceOutcome),
    /// Scanner started.
    Running,
    /// Scanner stopped on request or because its input ended.
    Stopped,
    /// Scanner lifecycle failure, shown verbatim.
    Failure(String),
}

impl From<AttendanceOutcome> for StatusUpdate {
    fn from(outcome: AttendanceOutcome) -> Self {
        StatusUpdate::Outcome(outcome)
    }
}

impl StatusUpdate {
    /// Maps an update to the indicator it produces.
    pub fn indicator(self) -> StatusIndicator {
        match self {
            StatusUpdate::Outcome(AttendanceOutcome::Success(message)) => {
                StatusIndicator::new(StatusKind::Success, message)
            }
            // Duplicates are an operator-visible error, not a fault.
            StatusUpdate::Outcome(AttendanceOutcome::Duplicate(message)) => {
                StatusIndicator::new(StatusKind::Error, message)
            }
            StatusUpdate::Outcome(AttendanceOutcome::Rejected(detail)) => {
                StatusIndicator::new(StatusKind::Error, detail)
            }
            StatusUpdate::Outcome(AttendanceOutcome::NetworkFailure) => {
                StatusIndicator::new(StatusKind::Error, NETWORK_FAILURE_TEXT)
            }
            StatusUpdate::Running => StatusIndicator::new(StatusKind::Idle, RUNNING_TEXT),
            StatusUpdate::Stopped => StatusIndicator::new(StatusKind::Idle, STOPPED_TEXT),
            StatusUpdate::Failure(text) => StatusIndicator::new(StatusKind::Error, text),
        }
    }
}

/// Renders status updates as timestamped lines.
pub struct StatusPresenter<W: Write> {
    current: StatusIndicator,
    out: W,
}

impl<W: Write> StatusPresenter<W> {
    pub fn new(out: W) -> Self {
        Self {
            current: StatusIndicator::default(),
            out,
        }
    }

    /// Replaces the indicator with the one produced by `update`.
    pub fn render(&mut self, update: impl Into<StatusUpdate>) -> &StatusIndicator {
        self.current = update.into().indicator();

        let stamp = chrono::Local::now().format("%H:%M:%S");
        if let Err(e) = writeln!(
            self.out,
            "[{stamp}] {:<7} {}",
            self.current.kind, self.current.text
        )
        .and_then(|_| self.out.flush())
        {
            tracing::warn!(error = %e, "Failed to write status line");
        }

        tracing::debug!(kind = %self.current.kind, text = %self.current.text, "Status updated");
        &self.current
    }

    /// Returns the indicator currently shown.
    pub fn current(&self) -> &StatusIndicator {
        &self.current
    }

    pub fn output(&self) -> &W {
        &self.out
    }
}
