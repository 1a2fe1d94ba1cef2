//! Metrics collection and exposition.
//!
//! # Metrics
//! - `fallback_cors_preflight_total` (counter): preflights answered by the guard
//! - `fallback_cors_decorated_total` (counter): responses stamped by the guard
//! - `host_rejected_total` (counter): requests refused for their Host
//! - `ssl_redirect_total` (counter): plain-HTTP requests redirected
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Prometheus exporter only runs when `observability.metrics_enabled`

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_fallback_preflight() {
    metrics::counter!("fallback_cors_preflight_total").increment(1);
}

pub fn record_fallback_decorated() {
    metrics::counter!("fallback_cors_decorated_total").increment(1);
}

pub fn record_host_rejected() {
    metrics::counter!("host_rejected_total").increment(1);
}

pub fn record_ssl_redirect() {
    metrics::counter!("ssl_redirect_total").increment(1);
}
