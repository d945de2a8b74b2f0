#![allow(dead_code)]

use qr_attendance::{
    config::ScannerConfig, AttendanceApi, AttendanceOutcome, MockDecoder, RegistrationId,
    ScannerController, StatusPresenter,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Attendance client that answers from a script and records every call.
#[derive(Default)]
pub struct ScriptedClient {
    replies: Mutex<VecDeque<(Duration, AttendanceOutcome)>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a reply delivered `latency` after the request.
    pub fn reply(self, latency: Duration, outcome: AttendanceOutcome) -> Self {
        self.replies
            .lock()
            .expect("replies lock")
            .push_back((latency, outcome));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }
}

impl AttendanceApi for ScriptedClient {
    async fn submit(&self, id: &RegistrationId) -> AttendanceOutcome {
        self.calls.lock().expect("calls lock").push(id.to_string());
        let reply = self.replies.lock().expect("replies lock").pop_front();
        let (latency, outcome) =
            reply.unwrap_or((Duration::ZERO, AttendanceOutcome::NetworkFailure));
        tokio::time::sleep(latency).await;
        outcome
    }
}

pub type TestScanner = ScannerController<MockDecoder, ScriptedClient, Vec<u8>>;

pub fn scanner(decoder: MockDecoder, client: Arc<ScriptedClient>) -> TestScanner {
    ScannerController::new(
        decoder,
        client,
        StatusPresenter::new(Vec::new()),
        ScannerConfig::default(),
    )
}

/// Status lines written so far, without their timestamps.
pub fn status_lines(scanner: &TestScanner) -> Vec<String> {
    String::from_utf8(scanner.presenter().output().clone())
        .expect("utf8 status output")
        .lines()
        .map(|line| line.split_once("] ").map_or(line, |(_, rest)| rest).to_string())
        .collect()
}

/// The last submission outcome shown, as `"<kind> <text>"`.
///
/// Lifecycle lines (running, stopped) are idle and skipped.
pub fn last_result(scanner: &TestScanner) -> String {
    status_lines(scanner)
        .into_iter()
        .rev()
        .find(|line| !line.starts_with("idle"))
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .unwrap_or_default()
}

pub fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}
