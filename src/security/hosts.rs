//! Allowed-host validation.
//!
//! # Responsibilities
//! - Resolve the request host (`X-Forwarded-Host` behind a proxy, else `Host`)
//! - Match it against `hosts.allowed`
//! - Reject unknown hosts with 400 Bad Request
//!
//! # Design Decisions
//! - Host matching is case-insensitive, port and trailing dot are ignored
//! - `*` allows everything, a leading `.` allows a domain and its subdomains
//! - In debug mode an empty list still allows local development hosts

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header::HOST, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::config::{HostsConfig, SharedSettings};
use crate::observability::metrics;

const X_FORWARDED_HOST: &str = "x-forwarded-host";

/// Hosts allowed when debugging with an empty allow-list.
pub const DEBUG_HOSTS: &[&str] = &[".localhost", "127.0.0.1", "[::1]"];

/// The raw host the client asked for, port included.
pub fn request_host(headers: &HeaderMap, use_x_forwarded_host: bool) -> Option<&str> {
    let forwarded = if use_x_forwarded_host {
        headers
            .get(X_FORWARDED_HOST)
            .and_then(|v| v.to_str().ok())
            // First entry is the one the client sent.
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    } else {
        None
    };

    forwarded.or_else(|| headers.get(HOST).and_then(|v| v.to_str().ok()))
}

/// Lower-cased domain without port or trailing dot.
///
/// Returns `None` for malformed hosts. IPv6 literals keep their brackets.
pub fn split_domain(host: &str) -> Option<String> {
    let host = host.trim().to_ascii_lowercase();
    if host.is_empty() {
        return None;
    }

    let domain = if host.starts_with('[') {
        let end = host.find(']')?;
        let (literal, rest) = host.split_at(end + 1);
        if !(rest.is_empty() || is_port_suffix(rest)) {
            return None;
        }
        literal.to_string()
    } else {
        match host.rsplit_once(':') {
            Some((domain, port)) if port.chars().all(|c| c.is_ascii_digit()) => domain.to_string(),
            Some(_) => return None,
            None => host,
        }
    };

    let domain = domain.strip_suffix('.').unwrap_or(&domain).to_string();
    if domain.is_empty() || domain.contains(['/', '@', ' ']) {
        return None;
    }
    Some(domain)
}

fn is_port_suffix(rest: &str) -> bool {
    rest.strip_prefix(':')
        .is_some_and(|port| port.chars().all(|c| c.is_ascii_digit()))
}

/// Whether `domain` (already normalized) matches a single allow-list entry.
pub fn matches_pattern(domain: &str, pattern: &str) -> bool {
    let pattern = pattern.trim().to_ascii_lowercase();
    if pattern == "*" {
        return true;
    }
    match pattern.strip_prefix('.') {
        Some(parent) => domain == parent || domain.ends_with(&pattern),
        None => domain == pattern,
    }
}

/// Check a raw host against the settings.
pub fn is_allowed(host: &str, hosts: &HostsConfig, debug: bool) -> bool {
    let Some(domain) = split_domain(host) else {
        return false;
    };

    if debug && hosts.allowed.is_empty() {
        return DEBUG_HOSTS.iter().any(|p| matches_pattern(&domain, p));
    }
    hosts.allowed.iter().any(|p| matches_pattern(&domain, p))
}

/// Middleware rejecting requests for hosts the service does not serve.
pub async fn allowed_hosts_middleware(
    State(settings): State<SharedSettings>,
    request: Request,
    next: Next,
) -> Response {
    let (allowed, host) = {
        let settings = settings.load();
        let host = request_host(request.headers(), settings.hosts.use_x_forwarded_host);
        let allowed =
            host.is_some_and(|h| is_allowed(h, &settings.hosts, settings.security.debug));
        (allowed, host.map(str::to_string))
    };

    if allowed {
        return next.run(request).await;
    }

    tracing::warn!(host = ?host, path = %request.uri().path(), "Rejected disallowed host");
    metrics::record_host_rejected();
    let mut response = Response::new(Body::from("Bad Request (400)"));
    *response.status_mut() = StatusCode::BAD_REQUEST;
    response
}
