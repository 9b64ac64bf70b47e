//! Telemetry initialization
//!
//! Without the `observability-opentelemetry` feature only a formatted tracing
//! subscriber is installed.

use tracing_subscriber::EnvFilter;

#[cfg(feature = "observability-opentelemetry")]
mod init_opentelemetry;

#[cfg(not(feature = "observability-opentelemetry"))]
mod init_basic;

#[cfg(feature = "observability-opentelemetry")]
pub use init_opentelemetry::{init_telemetry, shutdown_telemetry};

#[cfg(not(feature = "observability-opentelemetry"))]
pub use init_basic::{init_telemetry, shutdown_telemetry};

const DEFAULT_FILTER: &str = "keystone=debug,sqlx=warn";

/// `RUST_LOG` when set, otherwise debug output for the keystone crates.
pub(crate) fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into())
}
