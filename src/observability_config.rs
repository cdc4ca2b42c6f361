//! # Observability Configuration
//!
//! Settings for logging, the metrics/probe server and OTLP span export.
//! Values come through the same key lookup as the rest of [`crate::config::AppConfig`].

/// Output format of the log subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Observability configuration for different environments
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Environment name (development, staging, production)
    pub environment: String,
    /// Log level for the bot's own targets
    pub log_level: String,
    /// Log output format
    pub log_format: LogFormat,
    /// OTLP collector receiving spans, export is off when unset
    pub otlp_endpoint: Option<String>,
    /// Sample a ratio of traces instead of all of them
    pub enable_trace_sampling: bool,
    /// Trace sampling ratio (0.0-1.0)
    pub trace_sampling_ratio: f64,
    /// Serve metrics and health probes over HTTP
    pub enable_metrics_export: bool,
    /// Port of the metrics/probe server
    pub metrics_port: u16,
    /// Listen on every interface instead of localhost
    pub metrics_bind_all: bool,
    /// Bearer token required by the metrics server, if any
    pub metrics_auth_token: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            otlp_endpoint: None,
            enable_trace_sampling: false,
            trace_sampling_ratio: 1.0,
            enable_metrics_export: true,
            metrics_port: 9090,
            metrics_bind_all: false,
            metrics_auth_token: None,
        }
    }
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl ObservabilityConfig {
    /// Read observability settings through a key lookup.
    ///
    /// Unparsable values fall back to their defaults; [`Self::validate`]
    /// catches values that parse but make no sense.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let environment = non_empty(lookup("ENVIRONMENT")).unwrap_or(defaults.environment);

        // Development logs are for humans unless told otherwise
        let log_format = match lookup("LOG_FORMAT").map(|f| f.to_lowercase()).as_deref() {
            Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            _ if environment == "development" => LogFormat::Pretty,
            _ => LogFormat::Json,
        };

        Self {
            log_level: non_empty(lookup("OBSERVABILITY_LOG_LEVEL"))
                .map(|level| level.to_lowercase())
                .unwrap_or(defaults.log_level),
            log_format,
            otlp_endpoint: non_empty(lookup("OTLP_ENDPOINT")),
            enable_trace_sampling: parse_or(lookup("ENABLE_TRACE_SAMPLING"), false),
            trace_sampling_ratio: parse_or(lookup("TRACE_SAMPLING_RATIO"), 1.0),
            enable_metrics_export: parse_or(lookup("ENABLE_METRICS_EXPORT"), true),
            metrics_port: parse_or(lookup("METRICS_PORT"), defaults.metrics_port),
            metrics_bind_all: parse_or(lookup("METRICS_BIND_ALL_INTERFACES"), false),
            metrics_auth_token: non_empty(lookup("METRICS_AUTH_TOKEN")),
            environment,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if let Some(endpoint) = &self.otlp_endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(format!("Invalid OTLP endpoint format: {}", endpoint));
            }
        }

        if !(0.0..=1.0).contains(&self.trace_sampling_ratio) {
            return Err(format!(
                "Invalid trace sampling ratio: {}",
                self.trace_sampling_ratio
            ));
        }

        if self.metrics_port == 0 {
            return Err(format!("Invalid metrics port: {}", self.metrics_port));
        }

        if !["trace", "debug", "info", "warn", "error"].contains(&self.log_level.as_str()) {
            return Err(format!("Invalid log level: {}", self.log_level));
        }

        Ok(())
    }
}
