use keystone_core::TelemetryConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use super::env_filter;

/// Initialize basic tracing (without OpenTelemetry)
pub fn init_telemetry(
    config: &TelemetryConfig,
    _environment: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    if config.enabled {
        tracing::warn!("OTEL_ENABLED is set but the OpenTelemetry feature is not compiled in");
    } else {
        tracing::info!("OpenTelemetry feature not enabled, using standard tracing");
    }
    Ok(())
}

pub async fn shutdown_telemetry() {
    tracing::debug!("Telemetry shutdown (OpenTelemetry feature not enabled)");
}
