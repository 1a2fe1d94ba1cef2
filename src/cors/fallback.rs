//! Fallback CORS guard.
//!
//! # Responsibilities
//! - Answer every preflight (`OPTIONS`) request with a permissive 204
//! - Stamp permissive CORS headers on responses to requests carrying `Origin`
//! - Re-evaluate the on/off switch on every call
//!
//! # Design Decisions
//! - Works when the primary CORS policy is absent, misconfigured or bypassed
//! - Origin is echoed verbatim, never matched against an allow-list
//! - Only inserts or overwrites headers, never removes them
//!
//! # Security
//! While enabled, echoing `Origin` together with
//! `Access-Control-Allow-Credentials: true` lets ANY origin make credentialed
//! cross-origin requests. Keep the guard off unless the primary policy is
//! failing, and never rely on it as the only CORS layer.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS,
            ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE,
            ACCESS_CONTROL_REQUEST_HEADERS, ORIGIN, VARY,
        },
        HeaderMap, HeaderValue, Method, Request, Response, StatusCode,
    },
};

use crate::cors::switch::FallbackSwitch;

/// Methods advertised on every synthesized preflight.
pub const ALLOWED_METHODS: &str = "GET, POST, PUT, PATCH, DELETE, OPTIONS";

/// Allowed headers when the preflight does not list any.
pub const DEFAULT_ALLOWED_HEADERS: &str = "content-type,authorization";

/// Preflight cache lifetime in seconds (one day).
pub const MAX_AGE_SECS: &str = "86400";

/// The parts of an incoming request the guard looks at.
///
/// Captured before the request is handed to the rest of the pipeline so the
/// response hook can still see them.
#[derive(Debug, Clone)]
pub struct CorsRequest {
    method: Method,
    origin: Option<HeaderValue>,
    request_headers: Option<HeaderValue>,
}

impl CorsRequest {
    pub fn new(method: Method, headers: &HeaderMap) -> Self {
        Self {
            method,
            origin: headers.get(ORIGIN).cloned(),
            request_headers: headers.get(ACCESS_CONTROL_REQUEST_HEADERS).cloned(),
        }
    }

    pub fn from_request<B>(request: &Request<B>) -> Self {
        Self::new(request.method().clone(), request.headers())
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn origin(&self) -> Option<&HeaderValue> {
        self.origin.as_ref()
    }

    pub fn is_preflight(&self) -> bool {
        self.method == Method::OPTIONS
    }
}

/// Togglable, permissive CORS layer that backs up the primary policy.
#[derive(Clone)]
pub struct FallbackCors {
    switch: Arc<dyn FallbackSwitch>,
}

impl FallbackCors {
    pub fn new(switch: Arc<dyn FallbackSwitch>) -> Self {
        Self { switch }
    }

    /// Whether the guard is currently active.
    pub fn is_enabled(&self) -> bool {
        self.switch.is_enabled()
    }

    /// Pre-routing hook.
    ///
    /// Returns `Some(response)` when the request must not reach the router:
    /// the guard is enabled and the request is a preflight. Otherwise `None`.
    pub fn handle_request(&self, request: &CorsRequest) -> Option<Response<Body>> {
        if !self.is_enabled() || !request.is_preflight() {
            return None;
        }

        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;

        let headers = response.headers_mut();
        let origin = request
            .origin
            .clone()
            .unwrap_or_else(|| HeaderValue::from_static("*"));
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        headers.insert(VARY, HeaderValue::from_static("Origin"));
        headers.insert(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        );
        let allow_headers = request
            .request_headers
            .clone()
            .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_ALLOWED_HEADERS));
        headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, allow_headers);
        headers.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static(MAX_AGE_SECS));
        headers.insert(
            ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        );

        Some(response)
    }

    /// Post-routing hook. Never fails; worst case is a no-op.
    pub fn handle_response<B>(&self, request: &CorsRequest, mut response: Response<B>) -> Response<B> {
        if self.is_enabled() {
            Self::decorate(request, &mut response);
        }
        response
    }

    /// Stamp the permissive headers regardless of the switch.
    ///
    /// Returns whether anything was written, i.e. the request carried a
    /// non-empty `Origin`.
    pub fn decorate<B>(request: &CorsRequest, response: &mut Response<B>) -> bool {
        let origin = match request.origin() {
            Some(origin) if !origin.is_empty() => origin.clone(),
            _ => return false,
        };

        let headers = response.headers_mut();
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        headers.insert(VARY, HeaderValue::from_static("Origin"));
        headers.insert(
            ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        );
        true
    }
}

impl std::fmt::Debug for FallbackCors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackCors")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard(enabled: bool) -> FallbackCors {
        FallbackCors::new(Arc::new(enabled))
    }

    fn request(method: Method, headers: &[(&'static str, &'static str)]) -> CorsRequest {
        let mut builder = Request::builder().method(method).uri("/api/quiz");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        CorsRequest::from_request(&builder.body(Body::empty()).unwrap())
    }

    fn response_with(headers: &[(&'static str, &'static str)]) -> Response<Body> {
        let mut builder = Response::builder().status(StatusCode::OK);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Body::from("payload")).unwrap()
    }

    fn header<'a, B>(response: &'a Response<B>, name: &str) -> Option<&'a str> {
        response.headers().get(name).and_then(|v| v.to_str().ok())
    }

    #[test]
    fn test_disabled_never_intercepts() {
        let guard = guard(false);
        for method in [Method::OPTIONS, Method::GET, Method::POST, Method::DELETE] {
            let req = request(
                method,
                &[
                    ("Origin", "https://example.com"),
                    ("Access-Control-Request-Headers", "x-custom-header"),
                ],
            );
            assert!(guard.handle_request(&req).is_none());

            let response = guard.handle_response(&req, response_with(&[("x-app", "1")]));
            assert_eq!(response.headers().len(), 1);
            assert!(response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
        }
    }

    #[test]
    fn test_preflight_sets_all_headers() {
        let req = request(Method::OPTIONS, &[("Origin", "https://example.com")]);
        let response = guard(true).handle_request(&req).expect("preflight handled");

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(header(&response, "access-control-allow-origin"), Some("https://example.com"));
        assert_eq!(header(&response, "vary"), Some("Origin"));
        assert_eq!(
            header(&response, "access-control-allow-methods"),
            Some("GET, POST, PUT, PATCH, DELETE, OPTIONS")
        );
        assert_eq!(
            header(&response, "access-control-allow-headers"),
            Some("content-type,authorization")
        );
        assert_eq!(header(&response, "access-control-max-age"), Some("86400"));
        assert_eq!(header(&response, "access-control-allow-credentials"), Some("true"));
        assert_eq!(response.headers().len(), 6);
    }

    #[test]
    fn test_preflight_without_origin_uses_wildcard() {
        let req = request(Method::OPTIONS, &[]);
        let response = guard(true).handle_request(&req).unwrap();
        assert_eq!(header(&response, "access-control-allow-origin"), Some("*"));
    }

    #[test]
    fn test_preflight_echoes_requested_headers_verbatim() {
        let req = request(
            Method::OPTIONS,
            &[("Access-Control-Request-Headers", "x-custom-header")],
        );
        let response = guard(true).handle_request(&req).unwrap();
        assert_eq!(header(&response, "access-control-allow-headers"), Some("x-custom-header"));
    }

    #[test]
    fn test_non_preflight_is_not_intercepted() {
        let req = request(Method::GET, &[("Origin", "https://example.com")]);
        assert!(guard(true).handle_request(&req).is_none());
    }

    #[test]
    fn test_response_decorated_when_origin_present() {
        let req = request(Method::POST, &[("Origin", "https://foo.bar")]);
        let original = response_with(&[
            ("content-type", "application/json"),
            ("access-control-allow-origin", "https://primary.example"),
        ]);

        let response = guard(true).handle_response(&req, original);

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(header(&response, "access-control-allow-origin"), Some("https://foo.bar"));
        assert_eq!(header(&response, "vary"), Some("Origin"));
        assert_eq!(header(&response, "access-control-allow-credentials"), Some("true"));
        assert_eq!(header(&response, "content-type"), Some("application/json"));
        assert_eq!(response.headers().len(), 4);
    }

    #[test]
    fn test_response_untouched_without_origin() {
        let req = request(Method::GET, &[]);
        let response = guard(true).handle_response(&req, response_with(&[("x-app", "1")]));
        assert_eq!(response.headers().len(), 1);
        assert_eq!(header(&response, "x-app"), Some("1"));
    }

    #[test]
    fn test_response_untouched_with_empty_origin() {
        let req = request(Method::GET, &[("Origin", "")]);
        let response = guard(true).handle_response(&req, response_with(&[]));
        assert!(response.headers().is_empty());
    }

    #[test]
    fn test_decorate_reports_whether_headers_were_written() {
        let mut response = response_with(&[]);
        let req = request(Method::GET, &[("Origin", "https://foo.bar")]);
        assert!(FallbackCors::decorate(&req, &mut response));
        assert_eq!(header(&response, "access-control-allow-origin"), Some("https://foo.bar"));

        let mut response = response_with(&[]);
        let req = request(Method::GET, &[("Origin", "")]);
        assert!(!FallbackCors::decorate(&req, &mut response));
        assert!(response.headers().is_empty());
    }

    #[test]
    fn test_response_decoration_is_idempotent() {
        let guard = guard(true);
        let req = request(Method::PUT, &[("Origin", "https://foo.bar")]);

        let once = guard.handle_response(&req, response_with(&[("x-app", "1")]));
        let once_headers = once.headers().clone();
        let twice = guard.handle_response(&req, once);

        assert_eq!(twice.headers(), &once_headers);
    }
}
