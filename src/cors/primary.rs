//! Primary allow-list CORS policy.
//!
//! Built once at startup from [`CorsSettings`] on top of
//! `tower_http::cors::CorsLayer`. Origins are checked against the exact list
//! and the wildcard patterns; `allow_all_origins` mirrors the request origin
//! instead of sending `*` so it stays valid when credentials are allowed.

use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::CorsSettings;
use crate::cors::origin::{OriginAllowList, OriginPattern};

/// Compile the origin settings. Entries that fail to parse are skipped with a
/// warning; validation reports them before this point in normal startup.
pub fn allow_list(settings: &CorsSettings) -> OriginAllowList {
    let exact = settings
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Skipping unusable CORS origin");
                None
            }
        })
        .collect();

    let patterns = settings
        .allowed_origin_patterns
        .iter()
        .filter_map(|pattern| match OriginPattern::parse(pattern) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                tracing::warn!(pattern = %pattern, error = %e, "Skipping unusable CORS origin pattern");
                None
            }
        })
        .collect();

    OriginAllowList::new(exact, patterns)
}

/// Entries of `values`, minus `*` when credentials are allowed.
///
/// `CorsLayer` panics on that combination; validation rejects it on the
/// normal load path, this covers settings built in code.
fn usable_entries<'a>(
    settings: &CorsSettings,
    field: &'static str,
    values: &'a [String],
) -> impl Iterator<Item = &'a String> {
    let credentials = settings.allow_credentials;
    values.iter().filter(move |value| {
        let wildcard = credentials && value.trim() == "*";
        if wildcard {
            tracing::warn!(field, "Ignoring '*' while credentials are allowed");
        }
        !wildcard
    })
}

/// Build the primary CORS layer.
pub fn layer(settings: &CorsSettings) -> CorsLayer {
    let allow_origin = if settings.allow_all_origins {
        AllowOrigin::mirror_request()
    } else {
        let origins = allow_list(settings);
        AllowOrigin::predicate(move |origin: &HeaderValue, _| origins.is_allowed(origin))
    };

    let methods: Vec<Method> = usable_entries(settings, "allow_methods", &settings.allow_methods)
        .filter_map(|m| m.parse().ok())
        .collect();
    let headers: Vec<HeaderName> = usable_entries(settings, "allow_headers", &settings.allow_headers)
        .filter_map(|h| h.parse().ok())
        .collect();

    tracing::debug!(
        allow_all_origins = settings.allow_all_origins,
        origins = settings.allowed_origins.len(),
        patterns = settings.allowed_origin_patterns.len(),
        credentials = settings.allow_credentials,
        "Primary CORS policy built"
    );

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(methods)
        .allow_headers(headers)
        .allow_credentials(settings.allow_credentials)
        .max_age(Duration::from_secs(settings.preflight_max_age_secs))
}
