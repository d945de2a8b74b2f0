//! QR Attendance Scanner Client Library
//!
//! Turns decoded QR payloads into attendance submissions against the
//! attendance server's marking endpoint, and reports each outcome on a
//! single status indicator.
//!
//! # Architecture
//!
//! The system follows an explicit data flow:
//!
//! ```text
//! decoder → extract → gate → client → status → gate.release
//!    ↑                                              │
//!    └──────────── scanner controller ──────────────┘
//! ```
//!
//! # Design Principles
//!
//! - **Single-flight**: at most one submission is in flight at a time
//! - **Cooldown**: the same identifier is not resubmitted within 3 s
//! - **No retries**: a failed submission is re-scanned by the operator,
//!   never retried automatically
//! - **Always release**: every outcome, including network failure,
//!   frees the gate for the next scan
//!
//! # Example
//!
//! ```no_run
//! use qr_attendance::{
//!     client::HttpAttendanceClient,
//!     config::FileConfig,
//!     scanner::{LineDecoder, ScannerController},
//!     status::StatusPresenter,
//! };
//! use std::sync::Arc;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = FileConfig::default();
//! let client = Arc::new(HttpAttendanceClient::new(&config.server)?);
//! let mut scanner = ScannerController::new(
//!     LineDecoder::stdin(),
//!     client,
//!     StatusPresenter::new(std::io::stdout()),
//!     config.scanner.clone(),
//! );
//!
//! scanner.start().await?;
//! scanner.run().await;
//! # Ok(())
//! # }
//! ```

#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod client;
pub mod config;
pub mod flash;
pub mod metrics;
pub mod pipeline;
pub mod scanner;
pub mod status;

// Re-export commonly used types at crate root
pub use client::{AttendanceApi, AttendanceOutcome, HttpAttendanceClient};
pub use config::FileConfig;
pub use pipeline::{extract, RegistrationId, SubmissionGate, COOLDOWN};
pub use scanner::{DecoderAdapter, LineDecoder, MockDecoder, ScannerController, ScannerError};
pub use status::{StatusIndicator, StatusKind, StatusPresenter, StatusUpdate};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
