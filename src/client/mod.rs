//! Attendance endpoint submission.
//!
//! Submissions always resolve to an [`AttendanceOutcome`]; the string
//! statuses the server returns are mapped to that enum right after
//! parsing so downstream code matches exhaustively.

mod http;
mod outcome;

pub use http::{AttendanceApi, ClientError, HttpAttendanceClient};
pub use outcome::{AttendanceOutcome, DEFAULT_REJECTION};
