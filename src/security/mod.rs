//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (after CORS):
//!     → hosts.rs (reject hosts not in the allow-list)
//!     → ssl_redirect.rs (send plain HTTP to HTTPS in production)
//!     → Pass to routing
//! ```
//!
//! # Design Decisions
//! - Both layers read the live settings on every request
//! - Fail closed: unknown hosts are rejected
//! - Preflights are answered by the CORS layers before reaching these checks

pub mod hosts;
pub mod ssl_redirect;
