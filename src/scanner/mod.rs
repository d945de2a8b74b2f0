//! Scanner lifecycle.
//!
//! Wraps an external decoding engine behind [`DecoderAdapter`] and
//! drives the scan pipeline from its decode events.

mod controller;
mod decoder;

pub use controller::{
    ScannerController, SessionSummary, CAMERA_DENIED_TEXT, DECODER_UNAVAILABLE_TEXT,
};
pub use decoder::{DecoderAdapter, LineDecoder, MockDecoder, ScannerError};
