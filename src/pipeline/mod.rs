//! Decoded payload to admission decision.
//!
//! This module holds the synchronous half of the scan pipeline: turning
//! a decoded QR payload into a registration identifier and deciding
//! whether that identifier should trigger a submission right now.

mod extract;
mod gate;

pub use extract::{extract, RegistrationId, REG_PREFIX};
pub use gate::{DropReason, SubmissionGate, COOLDOWN};
