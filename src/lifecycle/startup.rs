//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate settings
//! - Initialize logging and metrics
//! - Start the settings watcher when a file is in use
//! - Bind the listener and serve until a shutdown signal
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener starts last (traffic only when ready)

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use crate::config::{self, watcher};
use crate::cors::switch;
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::{logging, metrics};

/// Command line arguments.
#[derive(Debug, Parser)]
#[command(name = "fallback-cors")]
#[command(about = "HTTP service fronted by a togglable fallback CORS guard", long_about = None)]
pub struct Args {
    /// TOML settings file, watched for changes.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    pub bind: Option<SocketAddr>,
}

pub async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut settings = config::load_settings(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        settings.listener.bind_address = bind.to_string();
    }

    logging::init(&settings.observability);
    tracing::info!("fallback-cors v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %settings.listener.bind_address,
        allowed_hosts = ?settings.hosts.allowed,
        allowed_origins = ?settings.cors.allowed_origins,
        fallback_source = ?settings.cors.fallback_source,
        debug = settings.security.debug,
        "Configuration loaded"
    );

    if settings.observability.metrics_enabled {
        if let Ok(addr) = settings.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %settings.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let bind_address = settings.listener.bind_address.clone();
    let shared = config::shared(settings);
    let shutdown = Shutdown::new();

    // Keep the watcher handle alive for the lifetime of the server.
    let _watcher = match &args.config {
        Some(path) => {
            let (config_watcher, updates) = watcher::ConfigWatcher::new(path, args.bind);
            let handle = config_watcher.run()?;
            tokio::spawn(watcher::apply_updates(
                shared.clone(),
                updates,
                shutdown.subscribe(),
            ));
            Some(handle)
        }
        None => None,
    };

    let fallback_switch = switch::from_settings(&shared);
    if fallback_switch.is_enabled() {
        tracing::warn!("Fallback CORS enabled: any origin may make credentialed requests");
    }
    let server = HttpServer::new(shared.clone(), fallback_switch);

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    tokio::spawn(signals::listen(shutdown.clone()));
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
