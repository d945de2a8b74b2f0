//! Scanner lifecycle and the scan-to-submission event loop.
//!
//! The controller owns the decoder, the submission gate and the status
//! presenter. Decode events and the single in-flight submission are
//! multiplexed on one task, so the gate's check-then-set can never
//! interleave with another event.

use super::{DecoderAdapter, ScannerError};
use crate::client::{AttendanceApi, AttendanceOutcome};
use crate::config::ScannerConfig;
use crate::metrics::ScanMetrics;
use crate::pipeline::{extract, SubmissionGate};
use crate::status::{StatusPresenter, StatusUpdate};
use std::future::Future;
use std::io::Write;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Shown when no decoding engine could be loaded.
pub const DECODER_UNAVAILABLE_TEXT: &str = "Scanner library failed to load";
/// Shown when the camera cannot be opened.
pub const CAMERA_DENIED_TEXT: &str = "Could not access webcam. Please allow camera permission.";

const EVENT_BUFFER: usize = 64;

type Submission = Pin<Box<dyn Future<Output = AttendanceOutcome> + Send>>;

/// Counters for one `run` of the event loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// Payloads received from the decoder.
    pub decoded: u64,
    /// Payloads dropped before reaching the network.
    pub dropped: u64,
    /// Submissions that ran to completion.
    pub submitted: u64,
}

/// Drives one scanner from decoded payload to rendered outcome.
///
/// Payloads from the decoder are extracted and gated; at most one
/// submission to the attendance client is in flight at a time, and
/// every outcome releases the gate.
pub struct ScannerController<D, C, W>
where
    D: DecoderAdapter,
    C: AttendanceApi + 'static,
    W: Write,
{
    decoder: D,
    client: Arc<C>,
    presenter: StatusPresenter<W>,
    gate: SubmissionGate,
    config: ScannerConfig,
    events: Option<mpsc::Receiver<String>>,
    metrics: Option<Arc<ScanMetrics>>,
}

impl<D, C, W> ScannerController<D, C, W>
where
    D: DecoderAdapter,
    C: AttendanceApi + 'static,
    W: Write,
{
    /// Creates a stopped controller. Call [`start`](Self::start) before
    /// running the event loop.
    pub fn new(decoder: D, client: Arc<C>, presenter: StatusPresenter<W>, config: ScannerConfig) -> Self {
        Self {
            decoder,
            client,
            presenter,
            gate: SubmissionGate::new(),
            config,
            events: None,
            metrics: None,
        }
    }

    /// Records decode, drop and submission counts into `metrics`.
    pub fn with_metrics(mut self, metrics: Arc<ScanMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Starts the decoder. A no-op while already scanning.
    ///
    /// Failures are rendered to the status region and returned; there
    /// is no automatic retry.
    pub async fn start(&mut self) -> Result<(), ScannerError> {
        if self.decoder.is_scanning() {
            debug!("Scanner already running");
            return Ok(());
        }

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        match self.decoder.start(self.config.facing, &self.config, tx).await {
            Ok(()) => {
                self.events = Some(rx);
                info!("Scanner started");
                self.presenter.render(StatusUpdate::Running);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Scanner failed to start");
                let text = match e {
                    ScannerError::DecoderUnavailable(_) => DECODER_UNAVAILABLE_TEXT,
                    ScannerError::PermissionDenied(_) | ScannerError::DeviceUnavailable(_) => {
                        CAMERA_DENIED_TEXT
                    }
                };
                self.presenter.render(StatusUpdate::Failure(text.to_string()));
                Err(e)
            }
        }
    }

    /// Stops the decoder if it is running.
    pub async fn stop(&mut self) {
        if self.decoder.is_scanning() {
            self.decoder.stop().await;
            info!("Scanner stopped");
            self.presenter.render(StatusUpdate::Stopped);
        }
    }

    /// Processes decode events until the stream closes, then shows the
    /// scanner as stopped.
    pub async fn run(&mut self) -> SessionSummary {
        self.run_until(std::future::pending()).await
    }

    /// Processes decode events until the stream closes or `shutdown`
    /// resolves.
    ///
    /// Either way the decoder is stopped at once, a submission still in
    /// flight runs to completion, and the stopped status is rendered
    /// last.
    pub async fn run_until(&mut self, shutdown: impl Future<Output = ()>) -> SessionSummary {
        let mut summary = SessionSummary::default();
        let Some(mut events) = self.events.take() else {
            warn!("Scanner not started; nothing to run");
            return summary;
        };

        tokio::pin!(shutdown);
        let mut in_flight: Option<Submission> = None;

        loop {
            tokio::select! {
                biased;

                outcome = wait_for(&mut in_flight), if in_flight.is_some() => {
                    in_flight = None;
                    summary.submitted += 1;
                    self.complete(outcome);
                }
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
                payload = events.recv() => match payload {
                    Some(payload) => {
                        summary.decoded += 1;
                        match self.admit(&payload) {
                            Some(submission) => in_flight = Some(submission),
                            None => summary.dropped += 1,
                        }
                    }
                    None => {
                        info!("Decode stream closed");
                        break;
                    }
                },
            }
        }

        self.decoder.stop().await;
        drop(events);

        if let Some(submission) = in_flight.take() {
            let outcome = submission.await;
            summary.submitted += 1;
            self.complete(outcome);
        }

        info!(
            decoded = summary.decoded,
            dropped = summary.dropped,
            submitted = summary.submitted,
            "Scanner stopped"
        );
        self.presenter.render(StatusUpdate::Stopped);
        summary
    }

    /// Runs one decoded payload through extraction and the gate.
    ///
    /// Returns the submission to drive when the payload was admitted.
    /// Dropped payloads are silent to the operator.
    fn admit(&mut self, payload: &str) -> Option<Submission> {
        if let Some(metrics) = &self.metrics {
            metrics.record_decoded();
        }

        let Some(id) = extract(Some(payload)) else {
            debug!("Decoded payload carries no identifier");
            self.record_drop("no_identifier");
            return None;
        };

        if let Err(reason) = self.gate.check(&id, Instant::now()) {
            debug!(reg_no = %id, reason = reason.as_str(), "Scan dropped");
            self.record_drop(reason.as_str());
            return None;
        }

        info!(reg_no = %id, "Scan admitted");
        if let Some(metrics) = &self.metrics {
            metrics.record_admitted();
        }
        let client = Arc::clone(&self.client);
        let submission: Submission = Box::pin(async move { client.submit(&id).await });
        Some(submission)
    }

    fn complete(&mut self, outcome: AttendanceOutcome) {
        if let Some(metrics) = &self.metrics {
            metrics.record_outcome(outcome.label());
        }
        self.presenter.render(outcome);
        self.gate.release();
    }

    fn record_drop(&self, reason: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.record_dropped(reason);
        }
    }

    pub fn is_scanning(&self) -> bool {
        self.decoder.is_scanning()
    }

    pub fn gate(&self) -> &SubmissionGate {
        &self.gate
    }

    pub fn presenter(&self) -> &StatusPresenter<W> {
        &self.presenter
    }
}

async fn wait_for(in_flight: &mut Option<Submission>) -> AttendanceOutcome {
    match in_flight {
        Some(submission) => submission.await,
        None => std::future::pending().await,
    }
}
