//! Keystone Infrastructure Library
//!
//! Shared infrastructure for the verifier:
//! - Telemetry initialization (tracing subscriber, optional OpenTelemetry export)
//! - Verification metrics

pub mod metrics;
pub mod telemetry;

pub use metrics::VerificationMetrics;
pub use telemetry::{init_telemetry, shutdown_telemetry};
