//! Settings validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that addresses, origins, methods and header names parse
//! - Validate value ranges (timeouts > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: Settings → Result<(), Vec<ValidationError>>
//! - Runs before settings are accepted into the system

use std::net::SocketAddr;

use axum::http::{HeaderName, Method};
use url::Url;

use crate::config::schema::Settings;
use crate::cors::origin::{OriginPattern, PatternError};

/// A single semantic problem in the settings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),

    #[error("listener.request_timeout_secs must be greater than zero")]
    ZeroTimeout,

    #[error("cors.allowed_origins entry '{origin}' is invalid: {reason}")]
    Origin { origin: String, reason: String },

    #[error("cors.allowed_origin_patterns entry '{pattern}' is invalid: {source}")]
    OriginPattern {
        pattern: String,
        source: PatternError,
    },

    #[error("cors.allow_methods entry '{0}' is not an HTTP method")]
    Method(String),

    #[error("cors.allow_headers entry '{0}' is not a header name")]
    HeaderName(String),

    #[error("cors.{field} cannot contain '*' while cors.allow_credentials is true")]
    CredentialsWildcard { field: &'static str },

    #[error("security.proxy_ssl_header '{0}' is not a header name")]
    ProxySslHeader(String),

    #[error("observability.metrics_address '{0}' is not a socket address")]
    MetricsAddress(String),
}

pub fn validate_settings(settings: &Settings) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if settings.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            settings.listener.bind_address.clone(),
        ));
    }
    if settings.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    for origin in &settings.cors.allowed_origins {
        if let Err(reason) = check_origin(origin) {
            errors.push(ValidationError::Origin {
                origin: origin.clone(),
                reason,
            });
        }
    }
    for pattern in &settings.cors.allowed_origin_patterns {
        if let Err(source) = OriginPattern::parse(pattern) {
            errors.push(ValidationError::OriginPattern {
                pattern: pattern.clone(),
                source,
            });
        }
    }
    for method in &settings.cors.allow_methods {
        if method.parse::<Method>().is_err() {
            errors.push(ValidationError::Method(method.clone()));
        }
    }
    for header in &settings.cors.allow_headers {
        if header.parse::<HeaderName>().is_err() {
            errors.push(ValidationError::HeaderName(header.clone()));
        }
    }
    if settings.cors.allow_credentials {
        // Browsers reject wildcards on credentialed requests.
        if settings.cors.allow_methods.iter().any(|m| m.trim() == "*") {
            errors.push(ValidationError::CredentialsWildcard {
                field: "allow_methods",
            });
        }
        if settings.cors.allow_headers.iter().any(|h| h.trim() == "*") {
            errors.push(ValidationError::CredentialsWildcard {
                field: "allow_headers",
            });
        }
    }

    if settings.security.proxy_ssl_header.parse::<HeaderName>().is_err() {
        errors.push(ValidationError::ProxySslHeader(
            settings.security.proxy_ssl_header.clone(),
        ));
    }

    if settings.observability.metrics_enabled
        && settings
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            settings.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// An origin is `scheme://host[:port]` with nothing after it.
fn check_origin(origin: &str) -> Result<(), String> {
    let url = Url::parse(origin).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    if url.path() != "/" || url.query().is_some() || url.fragment().is_some() || origin.ends_with('/') {
        return Err("origins must not carry a path, query or trailing slash".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(validate_settings(&Settings::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut settings = Settings::default();
        settings.listener.bind_address = "localhost".into();
        settings.cors.allowed_origins = vec![
            "https://quiz.example".into(),
            "https://quiz.example/".into(),
            "ftp://files.example".into(),
            "quiz.example".into(),
        ];
        settings.cors.allowed_origin_patterns = vec!["*.vercel.app".into()];
        settings.cors.allow_methods = vec!["GET".into(), "NOT A METHOD".into()];
        settings.cors.allow_headers = vec!["content-type".into(), "bad header".into()];

        let errors = validate_settings(&settings).unwrap_err();
        assert_eq!(errors.len(), 7);
        assert_eq!(errors[0], ValidationError::BindAddress("localhost".into()));
        assert!(matches!(
            errors[4],
            ValidationError::OriginPattern {
                source: PatternError::MissingScheme,
                ..
            }
        ));
    }

    #[test]
    fn test_wildcards_rejected_with_credentials() {
        let mut settings = Settings::default();
        settings.cors.allow_methods = vec!["*".into()];
        settings.cors.allow_headers = vec!["content-type".into(), "*".into()];

        assert_eq!(
            validate_settings(&settings),
            Err(vec![
                ValidationError::CredentialsWildcard {
                    field: "allow_methods"
                },
                ValidationError::CredentialsWildcard {
                    field: "allow_headers"
                },
            ])
        );

        settings.cors.allow_credentials = false;
        assert_eq!(validate_settings(&settings), Ok(()));
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut settings = Settings::default();
        settings.observability.metrics_address = "nowhere".into();
        assert!(validate_settings(&settings).is_ok());

        settings.observability.metrics_enabled = true;
        assert_eq!(
            validate_settings(&settings),
            Err(vec![ValidationError::MetricsAddress("nowhere".into())])
        );
    }
}
