//! Environment variable overlay.
//!
//! Variables override whatever the defaults or the config file set. Lookups
//! go through a closure so tests never touch the process environment.
//!
//! | Variable | Setting |
//! |---|---|
//! | `BIND_ADDRESS` | `listener.bind_address` |
//! | `DEBUG` | `security.debug` |
//! | `ALLOWED_HOSTS` | `hosts.allowed` (CSV) |
//! | `FRONTEND_URL` | prepended to `cors.allowed_origins` |
//! | `CORS_ALLOWED_ORIGINS` | `cors.allowed_origins` (CSV, wins over `FRONTEND_URL`) |
//! | `CORS_ALLOW_ALL_ORIGINS` | `cors.allow_all_origins` |
//! | `ENABLE_FALLBACK_CORS` | `cors.fallback_enabled` |
//! | `FALLBACK_CORS_SOURCE` | `cors.fallback_source` |
//! | `LOG_LEVEL` | `observability.log_level` |

use crate::config::loader::ConfigError;
use crate::config::schema::{FallbackSource, Settings};

/// Split a comma separated value, trimming items and dropping empty ones.
pub fn csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// `"true"` in any ASCII case is true, everything else is false.
///
/// Shared with `EnvSwitch`, so values are not trimmed.
pub fn flag(raw: &str) -> bool {
    raw.eq_ignore_ascii_case("true")
}

/// Apply environment overrides using `lookup` to resolve variables.
pub fn apply_env<F>(settings: &mut Settings, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(addr) = lookup("BIND_ADDRESS") {
        settings.listener.bind_address = addr.trim().to_string();
    }

    if let Some(raw) = lookup("DEBUG") {
        settings.security.debug = flag(&raw);
    }

    if let Some(raw) = lookup("ALLOWED_HOSTS") {
        settings.hosts.allowed = csv(&raw);
    }

    match lookup("CORS_ALLOWED_ORIGINS") {
        Some(raw) => settings.cors.allowed_origins = csv(&raw),
        None => {
            if let Some(frontend) = lookup("FRONTEND_URL") {
                let frontend = frontend.trim().to_string();
                if !frontend.is_empty() && !settings.cors.allowed_origins.contains(&frontend) {
                    settings.cors.allowed_origins.insert(0, frontend);
                }
            }
        }
    }

    if let Some(raw) = lookup("CORS_ALLOW_ALL_ORIGINS") {
        settings.cors.allow_all_origins = flag(&raw);
    }

    if let Some(raw) = lookup("ENABLE_FALLBACK_CORS") {
        settings.cors.fallback_enabled = flag(&raw);
    }

    if let Some(raw) = lookup("FALLBACK_CORS_SOURCE") {
        settings.cors.fallback_source = raw
            .parse::<FallbackSource>()
            .map_err(|message| ConfigError::Env {
                var: "FALLBACK_CORS_SOURCE",
                message,
            })?;
    }

    if let Some(level) = lookup("LOG_LEVEL") {
        settings.observability.log_level = level.trim().to_string();
    }

    Ok(())
}
