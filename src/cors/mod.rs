//! Cross-origin handling subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → middleware.rs (fallback guard, when switched on)
//!         OPTIONS → synthesized 204, pipeline skipped
//!     → primary.rs (allow-list policy, tower_http::cors)
//!     → security, routing, handler
//!     → middleware.rs (fallback guard stamps response headers)
//!     → client
//! ```
//!
//! # Design Decisions
//! - The fallback guard sits outside the primary policy so it can answer
//!   preflights even when the primary policy rejects or never sees them
//! - The guard's on/off flag is consulted on every request (switch.rs)
//! - The primary policy is built once at startup

pub mod fallback;
pub mod middleware;
pub mod origin;
pub mod primary;
pub mod switch;

pub use fallback::{CorsRequest, FallbackCors};
pub use switch::{EnvSwitch, FallbackSwitch, SettingsSwitch};
