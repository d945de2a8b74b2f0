//! Classification of attendance endpoint responses.

use serde::Deserialize;

/// Detail shown when the server rejects a scan without explaining why.
pub const DEFAULT_REJECTION: &str = "Scan failed";

const DEFAULT_SUCCESS: &str = "Attendance marked";
const DEFAULT_DUPLICATE: &str = "Attendance already marked";

/// Result of one attendance-marking attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttendanceOutcome {
    /// Attendance recorded; carries the server's message.
    Success(String),
    /// Already marked for today; carries the server's message.
    Duplicate(String),
    /// Server refused the scan; carries the server's detail.
    Rejected(String),
    /// Server unreachable, timed out, or answered with garbage.
    NetworkFailure,
}

impl AttendanceOutcome {
    /// Stable label used in logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            AttendanceOutcome::Success(_) => "success",
            AttendanceOutcome::Duplicate(_) => "duplicate",
            AttendanceOutcome::Rejected(_) => "rejected",
            AttendanceOutcome::NetworkFailure => "network_failure",
        }
    }

    /// Classifies a raw response body.
    ///
    /// The body is interpreted independently of the HTTP status code:
    /// the server reports unknown students as a 404 carrying a JSON
    /// `detail`, which is a rejection rather than a transport problem.
    pub fn from_body(body: &[u8]) -> Self {
        let payload: MarkResponse = match serde_json::from_slice(body) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(error = %e, "Unparseable attendance response");
                return AttendanceOutcome::NetworkFailure;
            }
        };
        payload.classify()
    }
}

/// Wire shape of the attendance endpoint's JSON body.
///
/// Fields are loosely typed so that an unexpected type on one field
/// does not discard the rest of the response.
#[derive(Debug, Default, Deserialize)]
struct MarkResponse {
    #[serde(default)]
    status: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<serde_json::Value>,
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

impl MarkResponse {
    fn classify(self) -> AttendanceOutcome {
        // Messages are shown verbatim, even when empty; an empty detail
        // falls back like an absent one.
        let message = string_of(self.message);
        let detail = string_of(self.detail).filter(|d| !d.is_empty());

        match self.status {
            Some(serde_json::Value::String(status)) => match status.as_str() {
                "success" => AttendanceOutcome::Success(
                    message.unwrap_or_else(|| DEFAULT_SUCCESS.to_string()),
                ),
                "duplicate" => AttendanceOutcome::Duplicate(
                    message.unwrap_or_else(|| DEFAULT_DUPLICATE.to_string()),
                ),
                _ => AttendanceOutcome::Rejected(
                    detail.unwrap_or_else(|| DEFAULT_REJECTION.to_string()),
                ),
            },
            Some(serde_json::Value::Null) | None => match detail {
                Some(detail) => AttendanceOutcome::Rejected(detail),
                None => AttendanceOutcome::NetworkFailure,
            },
            // Non-string status: present but unrecognized.
            Some(_) => AttendanceOutcome::Rejected(
                detail.unwrap_or_else(|| DEFAULT_REJECTION.to_string()),
            ),
        }
    }
}

fn string_of(value: Option<serde_json::Value>) -> Option<String> {
    match value? {
        serde_json::Value::String(s) => Some(s),
        _ => None,
    }
}
