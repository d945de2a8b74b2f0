//! Metrics collection and registry.

use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// Prometheus metrics registry for the scan pipeline.
pub struct ScanMetrics {
    registry: Registry,

    scans_decoded: IntCounter,
    scans_dropped: IntCounterVec,
    submissions: IntCounterVec,
    in_flight: IntGauge,
}

impl ScanMetrics {
    /// Creates a new registry with all pipeline metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let scans_decoded = IntCounter::new(
            "qr_attendance_scans_decoded_total",
            "Total payloads received from the decoder",
        )?;
        let scans_dropped = IntCounterVec::new(
            Opts::new(
                "qr_attendance_scans_dropped_total",
                "Payloads dropped before submission, by reason",
            ),
            &["reason"],
        )?;
        let submissions = IntCounterVec::new(
            Opts::new(
                "qr_attendance_submissions_total",
                "Completed attendance submissions, by outcome",
            ),
            &["outcome"],
        )?;
        let in_flight = IntGauge::new(
            "qr_attendance_submission_in_flight",
            "Whether a submission is currently in flight (1) or not (0)",
        )?;

        registry.register(Box::new(scans_decoded.clone()))?;
        registry.register(Box::new(scans_dropped.clone()))?;
        registry.register(Box::new(submissions.clone()))?;
        registry.register(Box::new(in_flight.clone()))?;

        Ok(Self {
            registry,
            scans_decoded,
            scans_dropped,
            submissions,
            in_flight,
        })
    }

    /// Counts one payload received from the decoder.
    pub fn record_decoded(&self) {
        self.scans_decoded.inc();
    }

    /// Counts one payload dropped before admission.
    pub fn record_dropped(&self, reason: &str) {
        self.scans_dropped.with_label_values(&[reason]).inc();
    }

    /// Marks a submission as started.
    pub fn record_admitted(&self) {
        self.in_flight.set(1);
    }

    /// Counts one finished submission.
    pub fn record_outcome(&self, outcome: &str) {
        self.in_flight.set(0);
        self.submissions.with_label_values(&[outcome]).inc();
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
