//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files. Every
//! section falls back to its defaults so a minimal file is valid.

use serde::{Deserialize, Serialize};

/// Root settings for the service.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Listener configuration (bind address, request timeout).
    pub listener: ListenerConfig,

    /// Host header validation.
    pub hosts: HostsConfig,

    /// Primary CORS policy and fallback guard.
    pub cors: CorsSettings,

    /// Production hardening.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,

    /// Request timeout (total time for request/response) in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Host header validation.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct HostsConfig {
    /// Allowed hosts. `*` allows all, a leading `.` allows a domain and
    /// its subdomains.
    pub allowed: Vec<String>,

    /// Trust `X-Forwarded-Host` over `Host` (service runs behind a proxy).
    pub use_x_forwarded_host: bool,
}

pub const DEFAULT_ALLOWED_HOSTS: &[&str] = &[".railway.app", "localhost", "127.0.0.1"];

impl Default for HostsConfig {
    fn default() -> Self {
        Self {
            allowed: DEFAULT_ALLOWED_HOSTS.iter().map(|h| h.to_string()).collect(),
            use_x_forwarded_host: true,
        }
    }
}

/// Where the fallback guard reads its on/off flag from.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FallbackSource {
    /// `ENABLE_FALLBACK_CORS`, re-read on every request.
    #[default]
    Environment,
    /// `cors.fallback_enabled` from the live (hot-reloaded) settings.
    Settings,
}

impl std::str::FromStr for FallbackSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "environment" | "env" => Ok(Self::Environment),
            "settings" => Ok(Self::Settings),
            other => Err(format!("unknown fallback source '{}'", other)),
        }
    }
}

/// CORS configuration: the primary allow-list policy plus the fallback guard.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct CorsSettings {
    /// Exact origins allowed by the primary policy.
    pub allowed_origins: Vec<String>,

    /// Wildcard origins, e.g. `https://*.vercel.app`.
    pub allowed_origin_patterns: Vec<String>,

    /// Allow every origin (the request origin is mirrored back).
    pub allow_all_origins: bool,

    pub allow_credentials: bool,

    pub allow_methods: Vec<String>,

    pub allow_headers: Vec<String>,

    /// Preflight cache lifetime in seconds.
    pub preflight_max_age_secs: u64,

    /// Fallback guard flag (used with `fallback_source = "settings"`).
    pub fallback_enabled: bool,

    pub fallback_source: FallbackSource,
}

pub const DEFAULT_ALLOWED_ORIGINS: &[&str] = &["http://localhost:3000", "http://127.0.0.1:3000"];

impl Default for CorsSettings {
    fn default() -> Self {
        Self {
            allowed_origins: DEFAULT_ALLOWED_ORIGINS.iter().map(|o| o.to_string()).collect(),
            allowed_origin_patterns: vec!["https://*.vercel.app".to_string()],
            allow_all_origins: false,
            allow_credentials: true,
            allow_methods: ["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"]
                .iter()
                .map(|m| m.to_string())
                .collect(),
            allow_headers: [
                "accept",
                "accept-encoding",
                "authorization",
                "content-type",
                "origin",
                "user-agent",
                "x-csrftoken",
                "x-requested-with",
            ]
            .iter()
            .map(|h| h.to_string())
            .collect(),
            preflight_max_age_secs: 86_400,
            fallback_enabled: false,
            fallback_source: FallbackSource::Environment,
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SecurityConfig {
    /// Development mode. Disables the HTTPS redirect and relaxes host checks.
    pub debug: bool,

    /// Redirect plain-HTTP requests to HTTPS (ignored in debug mode).
    pub ssl_redirect: bool,

    /// Header set by the TLS-terminating proxy.
    pub proxy_ssl_header: String,

    /// Value of `proxy_ssl_header` that marks a request as secure.
    pub proxy_ssl_value: String,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            debug: false,
            ssl_redirect: true,
            proxy_ssl_header: "x-forwarded-proto".to_string(),
            proxy_ssl_value: "https".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
