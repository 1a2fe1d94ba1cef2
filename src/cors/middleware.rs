//! Axum middleware wiring for the fallback guard.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::cors::fallback::{CorsRequest, FallbackCors};
use crate::observability::metrics;

/// Runs the guard around the rest of the pipeline.
///
/// Register with `axum::middleware::from_fn_with_state(guard, fallback_cors)`.
pub async fn fallback_cors(
    State(guard): State<FallbackCors>,
    request: Request,
    next: Next,
) -> Response {
    let cors_request = CorsRequest::from_request(&request);

    if let Some(preflight) = guard.handle_request(&cors_request) {
        tracing::debug!(
            path = %request.uri().path(),
            origin = ?cors_request.origin(),
            "Fallback CORS answered preflight"
        );
        metrics::record_fallback_preflight();
        return preflight;
    }

    let mut response = next.run(request).await;

    // One read of the switch per response, so the count matches the headers.
    if guard.is_enabled() && FallbackCors::decorate(&cors_request, &mut response) {
        tracing::trace!(origin = ?cors_request.origin(), "Fallback CORS decorated response");
        metrics::record_fallback_decorated();
    }
    response
}
