//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults
//!     → settings file (TOML, optional)
//!     → env.rs (environment variable overlay)
//!     → validation.rs (semantic checks)
//!     → Settings (validated)
//!     → shared via Arc<ArcSwap<Settings>> to middleware
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads and validates new settings
//!     → atomic swap of the shared Settings
//!     → middleware observes new settings on the next request
//! ```
//!
//! # Design Decisions
//! - Settings are immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Listener settings are only read at startup

use std::sync::Arc;

use arc_swap::ArcSwap;

pub mod env;
pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_settings, ConfigError};
pub use schema::{CorsSettings, FallbackSource, HostsConfig, SecurityConfig, Settings};

/// Live settings shared between the reload task and request handlers.
pub type SharedSettings = Arc<ArcSwap<Settings>>;

pub fn shared(settings: Settings) -> SharedSettings {
    Arc::new(ArcSwap::from_pointee(settings))
}
