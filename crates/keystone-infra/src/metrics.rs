//! Verification metrics
//!
//! Instruments are created from the global meter. Until a meter provider is
//! installed the global meter is a no-op, so recording is always safe.

use opentelemetry::metrics::{Counter, Histogram, Meter};
use opentelemetry::KeyValue;
use std::time::Duration;

const METER_NAME: &str = "keystone-verifier";

#[derive(Clone)]
pub struct VerificationMetrics {
    attempts: Counter<u64>,
    approvals: Counter<u64>,
    failures: Counter<u64>,
    duration: Histogram<f64>,
}

impl VerificationMetrics {
    pub fn new(meter: Meter) -> Self {
        let attempts = meter
            .u64_counter("keystone.verification.attempts")
            .with_description("Verification attempts completed")
            .build();

        let approvals = meter
            .u64_counter("keystone.verification.approvals")
            .with_description("Documents auto-approved")
            .build();

        let failures = meter
            .u64_counter("keystone.verification.failures")
            .with_description("Attempts that fell back to manual review after an error")
            .build();

        let duration = meter
            .f64_histogram("keystone.verification.duration")
            .with_description("End-to-end verification duration in seconds")
            .with_unit("s")
            .build();

        Self {
            attempts,
            approvals,
            failures,
            duration,
        }
    }

    pub fn from_global() -> Self {
        Self::new(opentelemetry::global::meter(METER_NAME))
    }

    /// Record one finished attempt. `outcome` is one of `approved`,
    /// `needs_review`, `rejected` or `failed`.
    pub fn record_attempt(&self, document_type: &str, outcome: &str, elapsed: Duration) {
        let labels = [
            KeyValue::new("document.type", document_type.to_string()),
            KeyValue::new("outcome", outcome.to_string()),
        ];

        self.attempts.add(1, &labels);
        self.duration.record(elapsed.as_secs_f64(), &labels);
        match outcome {
            "approved" => self.approvals.add(1, &labels),
            "failed" => self.failures.add(1, &labels),
            _ => {}
        }
    }
}

impl Default for VerificationMetrics {
    fn default() -> Self {
        Self::from_global()
    }
}
