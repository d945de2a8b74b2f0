//! Single-flight submission gate with per-identifier cooldown.
//!
//! The gate is the only mutable state shared along the scan pipeline.
//! It admits at most one submission at a time and suppresses repeated
//! detections of the same identifier inside [`COOLDOWN`]. A different
//! identifier is admitted immediately once the gate is idle, even while
//! the previous identifier's cooldown is still running.

use super::RegistrationId;
use std::time::Duration;
use tokio::time::Instant;

/// Window during which the same identifier is not resubmitted.
pub const COOLDOWN: Duration = Duration::from_millis(3000);

/// Reason a scan was turned away by the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// A submission is already in flight.
    Busy,
    /// The same identifier was admitted less than [`COOLDOWN`] ago.
    Cooldown,
}

impl DropReason {
    /// Stable label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            DropReason::Busy => "busy",
            DropReason::Cooldown => "cooldown",
        }
    }
}

/// Gate state for one scanner session.
#[derive(Debug, Default)]
pub struct SubmissionGate {
    busy: bool,
    last_accepted: Option<RegistrationId>,
    last_accepted_at: Option<Instant>,
}

impl SubmissionGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decides whether `id` may be submitted at `now`.
    ///
    /// On admission the gate becomes busy and records `id` as the
    /// cooldown key. Every admitted call must be paired with exactly
    /// one [`release`](Self::release).
    pub fn check(&mut self, id: &RegistrationId, now: Instant) -> Result<(), DropReason> {
        if self.busy {
            return Err(DropReason::Busy);
        }

        if let (Some(last), Some(at)) = (&self.last_accepted, self.last_accepted_at) {
            // Clock regressions count as "inside the window".
            if last == id && now.saturating_duration_since(at) < COOLDOWN {
                return Err(DropReason::Cooldown);
            }
        }

        self.busy = true;
        self.last_accepted = Some(id.clone());
        self.last_accepted_at = Some(now);
        Ok(())
    }

    /// Boolean form of [`check`](Self::check).
    pub fn try_admit(&mut self, id: &RegistrationId, now: Instant) -> bool {
        self.check(id, now).is_ok()
    }

    /// Clears the in-flight flag. Idempotent.
    pub fn release(&mut self) {
        self.busy = false;
    }

    /// True while a submission is in flight.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Last identifier admitted, if any.
    pub fn last_accepted(&self) -> Option<&RegistrationId> {
        self.last_accepted.as_ref()
    }
}
