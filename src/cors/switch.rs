//! On/off switches for the fallback guard.
//!
//! The guard asks its switch on every call, so whatever backs the switch is
//! re-evaluated per request.

use std::sync::Arc;

use crate::config::env::flag;
use crate::config::{FallbackSource, SharedSettings};

/// Environment variable read by [`EnvSwitch::default`].
pub const ENABLE_FALLBACK_CORS: &str = "ENABLE_FALLBACK_CORS";

/// Source of the `fallback_enabled` flag.
pub trait FallbackSwitch: Send + Sync {
    fn is_enabled(&self) -> bool;
}

impl FallbackSwitch for bool {
    fn is_enabled(&self) -> bool {
        *self
    }
}

/// Reads an environment variable on every call.
///
/// Enabled iff the value equals `"true"` ignoring ASCII case; unset or any
/// other value means disabled.
#[derive(Debug, Clone)]
pub struct EnvSwitch {
    var: String,
}

impl EnvSwitch {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    pub fn var(&self) -> &str {
        &self.var
    }
}

impl Default for EnvSwitch {
    fn default() -> Self {
        Self::new(ENABLE_FALLBACK_CORS)
    }
}

impl FallbackSwitch for EnvSwitch {
    fn is_enabled(&self) -> bool {
        std::env::var(&self.var)
            .map(|value| flag(&value))
            .unwrap_or(false)
    }
}

/// Reads `cors.fallback_enabled` from the live settings on every call.
#[derive(Debug, Clone)]
pub struct SettingsSwitch {
    settings: SharedSettings,
}

impl SettingsSwitch {
    pub fn new(settings: SharedSettings) -> Self {
        Self { settings }
    }
}

impl FallbackSwitch for SettingsSwitch {
    fn is_enabled(&self) -> bool {
        self.settings.load().cors.fallback_enabled
    }
}

/// The switch selected by `cors.fallback_source`.
pub fn from_settings(settings: &SharedSettings) -> Arc<dyn FallbackSwitch> {
    match settings.load().cors.fallback_source {
        FallbackSource::Environment => Arc::new(EnvSwitch::default()),
        FallbackSource::Settings => Arc::new(SettingsSwitch::new(settings.clone())),
    }
}
