//! fallback-cors service binary.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client Request
//!   ──────────────▶ request id ─▶ trace
//!                                   │
//!                                   ▼
//!                      ┌────────────────────────┐
//!                      │  fallback CORS guard   │── OPTIONS ──▶ 204 preflight
//!                      └───────────┬────────────┘   (when switched on)
//!                                  ▼
//!                               timeout
//!                                  ▼
//!                      ┌────────────────────────┐
//!                      │  primary CORS policy   │
//!                      └───────────┬────────────┘
//!                                  ▼
//!                      allowed hosts ─▶ HTTPS redirect ─▶ routes
//!
//!   settings: defaults → TOML file → environment, hot reloaded via ArcSwap
//! ```

use clap::Parser;

use fallback_cors::lifecycle::startup::{self, Args};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    startup::run(Args::parse()).await
}
