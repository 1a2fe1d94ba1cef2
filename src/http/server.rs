//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the application routes
//! - Wire up middleware (request ID, tracing, timeout, CORS, security)
//! - Bind server to listener
//! - Drain in-flight requests on shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::from_fn_with_state,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::SharedSettings;
use crate::cors::{self, FallbackCors, FallbackSwitch};
use crate::http::handlers;
use crate::http::request::{x_request_id, RequestIdExt, UuidRequestId};
use crate::lifecycle::shutdown;
use crate::security::{hosts, ssl_redirect};

/// HTTP server fronted by the fallback CORS guard.
pub struct HttpServer {
    router: Router,
    settings: SharedSettings,
}

impl HttpServer {
    /// Serve the built-in routes.
    pub fn new(settings: SharedSettings, switch: Arc<dyn FallbackSwitch>) -> Self {
        Self::with_routes(settings, switch, handlers::routes())
    }

    /// Serve `routes` behind the full middleware stack.
    pub fn with_routes(
        settings: SharedSettings,
        switch: Arc<dyn FallbackSwitch>,
        routes: Router,
    ) -> Self {
        let guard = FallbackCors::new(switch);
        let router = Self::build_router(&settings, guard, routes);
        Self { router, settings }
    }

    /// Build the router with all middleware layers.
    ///
    /// Outermost first: request ID, trace, fallback guard, timeout, primary
    /// CORS, allowed hosts, HTTPS redirect, routes.
    ///
    /// The guard wraps the timeout so a 408 still carries its headers.
    fn build_router(settings: &SharedSettings, guard: FallbackCors, routes: Router) -> Router {
        let snapshot = settings.load();

        let outer = ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(x_request_id(), UuidRequestId))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = request.request_id().unwrap_or("unknown"),
                )
            }))
            .layer(PropagateRequestIdLayer::new(x_request_id()));

        routes
            .layer(from_fn_with_state(
                settings.clone(),
                ssl_redirect::ssl_redirect_middleware,
            ))
            .layer(from_fn_with_state(
                settings.clone(),
                hosts::allowed_hosts_middleware,
            ))
            .layer(cors::primary::layer(&snapshot.cors))
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                Duration::from_secs(snapshot.listener.request_timeout_secs),
            ))
            .layer(from_fn_with_state(guard, cors::middleware::fallback_cors))
            .layer(outer)
    }

    /// The fully layered router, for embedding or in-process tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn settings(&self) -> &SharedSettings {
        &self.settings
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{shared, Settings};
    use axum::routing::get;
    use tower::ServiceExt;

    fn server(enabled: bool, settings: Settings) -> HttpServer {
        HttpServer::new(shared(settings), Arc::new(enabled))
    }

    fn debug_settings() -> Settings {
        let mut settings = Settings::default();
        settings.security.debug = true;
        settings
    }

    #[tokio::test]
    async fn test_health_gets_request_id() {
        let response = server(false, debug_settings())
            .router()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("Host", "localhost")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], br#"{"status":"ok"}"#);
    }

    #[tokio::test]
    async fn test_guard_answers_preflight_before_https_redirect() {
        // Production settings: the redirect would catch a plain-HTTP preflight.
        let response = server(true, Settings::default())
            .router()
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/health")
                    .header("Host", "quiz.up.railway.app")
                    .header("Origin", "https://evil.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            response.headers()["access-control-allow-origin"],
            "https://evil.example"
        );
    }

    #[tokio::test]
    async fn test_disabled_guard_leaves_preflight_to_primary_policy() {
        let response = server(false, debug_settings())
            .router()
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/health")
                    .header("Host", "localhost")
                    .header("Origin", "https://evil.example")
                    .header("Access-Control-Request-Method", "GET")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get("access-control-allow-origin").is_none());
    }

    #[tokio::test]
    async fn test_timed_out_response_is_decorated() {
        let mut settings = debug_settings();
        settings.listener.request_timeout_secs = 1;
        let routes = Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late"
            }),
        );

        let response = HttpServer::with_routes(shared(settings), Arc::new(true), routes)
            .router()
            .oneshot(
                Request::builder()
                    .uri("/slow")
                    .header("Host", "localhost")
                    .header("Origin", "https://foo.bar")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(response.headers()["access-control-allow-origin"], "https://foo.bar");
        assert_eq!(response.headers()["access-control-allow-credentials"], "true");
        assert!(response.headers().contains_key("x-request-id"));
    }
}
