//! Tracing and logging setup module.
//!
//! This module provides:
//! - Structured logging configuration
//! - OpenTelemetry span export bridged from `tracing` spans
//! - Tracing span creation utilities

use anyhow::Result;
use opentelemetry::global;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::{Sampler, SdkTracer, SdkTracerProvider};
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;

use crate::observability_config::{LogFormat, ObservabilityConfig};

/// Instrumentation scope reported with every exported span
const TRACER_NAME: &str = "ad-placement-bot";

/// Initialize structured logging, plus span export when an OTLP endpoint is set.
///
/// The returned provider must be shut down on exit to flush pending spans.
pub fn init_tracing_with_config(config: &ObservabilityConfig) -> Result<Option<SdkTracerProvider>> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("ad_placement_bot={}", config.log_level).parse()?)
        .add_directive("teloxide=warn".parse()?)
        .add_directive("hyper=warn".parse()?);

    let tracer_provider = build_tracer_provider(config)?;
    let span_export = tracer_provider.as_ref().map(otel_layer);

    match config.log_format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(span_export)
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_thread_names(false),
            )
            .try_init()?,
        LogFormat::Json => tracing_subscriber::registry()
            .with(span_export)
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true),
            )
            .try_init()?,
    }

    tracing::info!(
        environment = %config.environment,
        log_level = %config.log_level,
        otlp_export = tracer_provider.is_some(),
        "Tracing initialized with structured logging"
    );
    Ok(tracer_provider)
}

/// Build the OTLP tracer provider, `None` when no endpoint is configured
pub fn build_tracer_provider(config: &ObservabilityConfig) -> Result<Option<SdkTracerProvider>> {
    let Some(endpoint) = &config.otlp_endpoint else {
        return Ok(None);
    };

    let otlp_exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint.clone())
        .build()?;

    let sampler = if config.enable_trace_sampling {
        Sampler::TraceIdRatioBased(config.trace_sampling_ratio)
    } else {
        Sampler::AlwaysOn
    };

    let tracer_provider = SdkTracerProvider::builder()
        .with_batch_exporter(otlp_exporter)
        .with_sampler(sampler)
        .build();

    global::set_tracer_provider(tracer_provider.clone());
    Ok(Some(tracer_provider))
}

/// Layer turning `tracing` spans into OpenTelemetry spans of `provider`
pub fn otel_layer<S>(provider: &SdkTracerProvider) -> OpenTelemetryLayer<S, SdkTracer>
where
    S: tracing::Subscriber + for<'span> LookupSpan<'span>,
{
    tracing_opentelemetry::layer().with_tracer(provider.tracer(TRACER_NAME))
}

/// Create a span for Telegram bot operations
pub fn telegram_span(operation: &str, chat_id: i64) -> tracing::Span {
    tracing::info_span!(
        "telegram_operation",
        operation = operation,
        chat_id = chat_id,
        component = "telegram"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::trace::TraceContextExt;
    use tracing_opentelemetry::OpenTelemetrySpanExt;

    #[test]
    fn test_no_endpoint_means_no_provider() {
        let config = ObservabilityConfig::default();
        assert!(build_tracer_provider(&config).unwrap().is_none());
    }

    #[test]
    fn test_bot_spans_reach_opentelemetry() {
        let provider = SdkTracerProvider::builder().build();
        let subscriber = tracing_subscriber::registry().with(otel_layer(&provider));

        tracing::subscriber::with_default(subscriber, || {
            let span = telegram_span("web_app_order", 4242);
            let _entered = span.enter();

            let context = span.context();
            assert!(context.span().span_context().is_valid());
        });
    }
}
