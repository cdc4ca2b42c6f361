//! Observability module for centralized metrics, tracing, and logging setup.
//!
//! This module provides:
//! - Structured logging with configurable levels
//! - Metrics collection and Prometheus export
//! - Optional distributed tracing with OpenTelemetry
//! - Health check endpoints for monitoring

pub mod health_checks;
pub mod metrics;
pub mod tracing_mod;

use std::sync::Arc;

use anyhow::Result;
use opentelemetry_sdk::trace::SdkTracerProvider;

use crate::observability_config::ObservabilityConfig;
use crate::tariffs::TariffCatalogue;

pub use self::metrics::{
    record_command, record_invoice_issued, record_order, record_payment, record_pre_checkout,
};
pub use self::tracing_mod::telegram_span;

/// Initialize logging and span export, before anything else can fail.
///
/// Returns the tracer provider to shut down on exit when OTLP export is on.
pub fn init_logging(config: &ObservabilityConfig) -> Result<Option<SdkTracerProvider>> {
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid observability configuration: {}", e))?;
    tracing_mod::init_tracing_with_config(config)
}

/// Initialize metrics export and the probe server.
///
/// Expects [`init_logging`] to have run.
pub async fn init_observability(
    config: &ObservabilityConfig,
    bot_token: String,
    catalogue: Arc<TariffCatalogue>,
) -> Result<()> {
    if config.enable_metrics_export {
        let metrics_handle = self::metrics::init_metrics_with_config(config)?;
        self::metrics::start_metrics_server(metrics_handle, config, bot_token, catalogue).await?;
    } else {
        tracing::info!("Metrics export disabled");
    }

    tracing::info!(
        environment = %config.environment,
        otlp_endpoint = ?config.otlp_endpoint,
        metrics_port = %config.metrics_port,
        "Observability stack initialized successfully"
    );
    Ok(())
}
