//! Prometheus metrics for the scan pipeline.
//!
//! # Metrics Exposed
//!
//! - `qr_attendance_scans_decoded_total` - Payloads received from the decoder
//! - `qr_attendance_scans_dropped_total{reason}` - Payloads dropped before
//!   submission (`no_identifier`, `busy`, `cooldown`)
//! - `qr_attendance_submissions_total{outcome}` - Finished submissions
//!   (`success`, `duplicate`, `rejected`, `network_failure`)
//! - `qr_attendance_submission_in_flight` - 1 while a submission runs
//!
//! With the `metrics` feature enabled, [`MetricsServer`] serves them
//! over HTTP.

mod collector;
#[cfg(feature = "metrics")]
mod server;

pub use collector::{MetricsError, ScanMetrics};
#[cfg(feature = "metrics")]
pub use server::{MetricsServer, MetricsServerConfig, ServerError};
