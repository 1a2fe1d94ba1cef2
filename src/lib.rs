//! Fallback CORS guard and the HTTP service around it.
//!
//! The guard ([`cors::FallbackCors`]) answers preflights and stamps
//! permissive CORS headers when switched on, backing up the primary
//! allow-list policy. See `cors::fallback` for the security trade-off.

pub mod config;
pub mod cors;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::Settings;
pub use cors::{CorsRequest, EnvSwitch, FallbackCors, FallbackSwitch, SettingsSwitch};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
