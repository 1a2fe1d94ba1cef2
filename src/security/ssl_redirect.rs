//! HTTPS redirect for deployments behind a TLS-terminating proxy.
//!
//! # Design Decisions
//! - A request is secure iff the proxy header carries the configured value
//! - Debug mode never redirects
//! - 301 to the same host, path and query over `https://`

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header::LOCATION, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::config::{SecurityConfig, SharedSettings};
use crate::observability::metrics;
use crate::security::hosts::request_host;

/// Whether the TLS-terminating proxy marked the request as HTTPS.
pub fn is_secure(headers: &HeaderMap, security: &SecurityConfig) -> bool {
    headers
        .get(security.proxy_ssl_header.as_str())
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim().eq_ignore_ascii_case(&security.proxy_ssl_value))
}

/// Redirect target, or `None` when the request must pass through.
pub fn redirect_target(
    request: &Request,
    security: &SecurityConfig,
    use_x_forwarded_host: bool,
) -> Option<String> {
    if security.debug || !security.ssl_redirect || is_secure(request.headers(), security) {
        return None;
    }

    let host = request_host(request.headers(), use_x_forwarded_host)?;
    let path = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    Some(format!("https://{}{}", host, path))
}

/// Middleware sending plain-HTTP requests to their HTTPS URL.
pub async fn ssl_redirect_middleware(
    State(settings): State<SharedSettings>,
    request: Request,
    next: Next,
) -> Response {
    let target = {
        let settings = settings.load();
        redirect_target(&request, &settings.security, settings.hosts.use_x_forwarded_host)
    };

    let Some(target) = target else {
        return next.run(request).await;
    };

    match HeaderValue::from_str(&target) {
        Ok(location) => {
            tracing::debug!(location = %target, "Redirecting to HTTPS");
            metrics::record_ssl_redirect();
            let mut response = Response::new(Body::empty());
            *response.status_mut() = StatusCode::MOVED_PERMANENTLY;
            response.headers_mut().insert(LOCATION, location);
            response
        }
        Err(_) => {
            tracing::warn!(location = %target, "Unusable redirect target, serving over HTTP");
            next.run(request).await
        }
    }
}
