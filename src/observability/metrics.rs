//! Metrics collection and Prometheus export module.
//!
//! This module provides:
//! - Prometheus recorder setup
//! - A small HTTP server for `/metrics` and health probes
//! - Recording functions for the order and payment workflow

use anyhow::Result;
use hyper::server::conn::http1;
use hyper_util::rt::TokioIo;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::net::TcpListener;

use super::health_checks::perform_readiness_checks;
use crate::observability_config::ObservabilityConfig;
use crate::tariffs::TariffCatalogue;

/// Per-IP sliding window rate limiter for the metrics server
#[derive(Debug)]
pub struct RateLimiter {
    requests: Mutex<HashMap<IpAddr, Vec<Instant>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            requests: Mutex::new(HashMap::new()),
            max_requests,
            window,
        }
    }

    /// Check if a request from `ip` is allowed right now
    pub fn is_allowed(&self, ip: IpAddr) -> bool {
        let now = Instant::now();
        let mut requests = match self.requests.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        // Forget clients whose whole history fell out of the window
        requests.retain(|_, times| {
            times.retain(|&time| now.duration_since(time) < self.window);
            !times.is_empty()
        });

        let client_requests = requests.entry(ip).or_default();
        if client_requests.len() >= self.max_requests {
            return false;
        }

        client_requests.push(now);
        true
    }

    /// Number of clients with requests inside the window
    pub fn tracked_clients(&self) -> usize {
        match self.requests.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}

/// Check the bearer token, when the server is configured with one
fn is_authorized(headers: &hyper::HeaderMap, expected_token: Option<&str>) -> bool {
    let Some(expected_token) = expected_token else {
        return true;
    };

    headers
        .get(hyper::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .is_some_and(|token| token == expected_token)
}

/// Initialize metrics collection with Prometheus exporter and configuration
pub fn init_metrics_with_config(config: &ObservabilityConfig) -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    tracing::info!(
        metrics_enabled = %config.enable_metrics_export,
        "Metrics collection initialized"
    );
    Ok(handle)
}

fn response(status: hyper::StatusCode, body: impl Into<String>) -> hyper::Response<String> {
    let mut response = hyper::Response::new(body.into());
    *response.status_mut() = status;
    response
}

fn bind_address(config: &ObservabilityConfig) -> SocketAddr {
    // localhost only unless explicitly configured
    if config.metrics_bind_all {
        SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), config.metrics_port)
    } else {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), config.metrics_port)
    }
}

/// Start the metrics server with liveness and readiness probes
pub async fn start_metrics_server(
    metrics_handle: PrometheusHandle,
    config: &ObservabilityConfig,
    bot_token: String,
    catalogue: Arc<TariffCatalogue>,
) -> Result<()> {
    let addr = bind_address(config);
    let bind_all = config.metrics_bind_all;

    let rate_limiter = Arc::new(RateLimiter::new(30, Duration::from_secs(60)));
    let bot_token = Arc::new(bot_token);
    let auth_token: Arc<Option<String>> = Arc::new(config.metrics_auth_token.clone());

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, bind_all, "Metrics server listening");

    tokio::spawn(async move {
        loop {
            let (stream, peer_addr) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    tracing::error!(error = %e, "Error accepting metrics connection");
                    continue;
                }
            };

            let metrics_handle = metrics_handle.clone();
            let rate_limiter = Arc::clone(&rate_limiter);
            let bot_token = Arc::clone(&bot_token);
            let catalogue = Arc::clone(&catalogue);
            let auth_token = Arc::clone(&auth_token);

            tokio::spawn(async move {
                let io = TokioIo::new(stream);

                let service = hyper::service::service_fn(
                    move |req: hyper::Request<hyper::body::Incoming>| {
                        let metrics_handle = metrics_handle.clone();
                        let rate_limiter = Arc::clone(&rate_limiter);
                        let bot_token = Arc::clone(&bot_token);
                        let catalogue = Arc::clone(&catalogue);
                        let auth_token = Arc::clone(&auth_token);
                        async move {
                            if !rate_limiter.is_allowed(peer_addr.ip()) {
                                return Ok::<_, std::convert::Infallible>(response(
                                    hyper::StatusCode::TOO_MANY_REQUESTS,
                                    "Rate limit exceeded",
                                ));
                            }

                            if !is_authorized(req.headers(), auth_token.as_deref()) {
                                return Ok(response(
                                    hyper::StatusCode::UNAUTHORIZED,
                                    "Unauthorized",
                                ));
                            }

                            let reply = match (req.method(), req.uri().path()) {
                                (&hyper::Method::GET, "/metrics") => {
                                    let mut reply = hyper::Response::new(metrics_handle.render());
                                    reply.headers_mut().insert(
                                        "content-type",
                                        hyper::header::HeaderValue::from_static(
                                            "text/plain; version=0.0.4; charset=utf-8",
                                        ),
                                    );
                                    reply
                                }
                                (&hyper::Method::GET, "/health/live") => {
                                    response(hyper::StatusCode::OK, "OK")
                                }
                                (&hyper::Method::GET, "/health/ready") => {
                                    match perform_readiness_checks(&bot_token, &catalogue) {
                                        Ok(()) => response(hyper::StatusCode::OK, "OK"),
                                        Err(e) => response(
                                            hyper::StatusCode::SERVICE_UNAVAILABLE,
                                            format!("NOT READY: {}", e),
                                        ),
                                    }
                                }
                                _ => response(hyper::StatusCode::NOT_FOUND, "Not Found"),
                            };
                            Ok(reply)
                        }
                    },
                );

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    tracing::debug!(error = %err, peer = %peer_addr, "Metrics connection closed with error");
                }
            });
        }
    });

    Ok(())
}

/// Record a handled bot command
pub fn record_command(command: &'static str) {
    metrics::counter!("bot_commands_total", "command" => command).increment(1);
}

/// Record the outcome of an order submitted through the mini-application
pub fn record_order(result: &'static str) {
    metrics::counter!("orders_total", "result" => result).increment(1);
}

/// Record an invoice sent to a user
pub fn record_invoice_issued(plan: &str) {
    let plan = plan.to_string();
    metrics::counter!("invoices_issued_total", "plan" => plan).increment(1);
}

/// Record a pre-checkout decision
pub fn record_pre_checkout(approved: bool) {
    let decision = if approved { "approved" } else { "rejected" };
    metrics::counter!("pre_checkout_queries_total", "decision" => decision).increment(1);
}

/// Record a completed payment; `plan` is `None` when the payload could not be decoded
pub fn record_payment(plan: Option<&str>, amount_units: u64) {
    let plan = plan.unwrap_or("unknown").to_string();
    metrics::counter!("payments_total", "plan" => plan).increment(1);
    metrics::histogram!("payments_amount").record(amount_units as f64);
}
