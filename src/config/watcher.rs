//! Settings file watcher.
//!
//! A notify watcher reloads the file on change and sends the result over a
//! channel; [`apply_updates`] swaps each update into the shared settings.
//! Overrides given at startup (such as `--bind`) are re-applied to every
//! reload so they survive it.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{broadcast, mpsc};

use crate::config::loader::{load_settings, ConfigError};
use crate::config::schema::Settings;

/// Reload `path` and re-apply the startup overrides.
pub fn reload(path: &Path, bind_override: Option<SocketAddr>) -> Result<Settings, ConfigError> {
    let mut settings = load_settings(Some(path))?;
    if let Some(bind) = bind_override {
        settings.listener.bind_address = bind.to_string();
    }
    Ok(settings)
}

/// Watches one settings file.
pub struct ConfigWatcher {
    path: PathBuf,
    bind_override: Option<SocketAddr>,
    updates: mpsc::UnboundedSender<Settings>,
}

impl ConfigWatcher {
    /// Returns the watcher and the receiving end for [`apply_updates`].
    pub fn new(
        path: &Path,
        bind_override: Option<SocketAddr>,
    ) -> (Self, mpsc::UnboundedReceiver<Settings>) {
        let (updates, rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            bind_override,
            updates,
        };
        (watcher, rx)
    }

    /// Start watching. Reloads stop when the returned handle is dropped.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self {
            path,
            bind_override,
            updates,
        } = self;
        let reload_path = path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let event = match res {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::error!(error = %e, "Settings watch error");
                        return;
                    }
                };
                if !(event.kind.is_modify() || event.kind.is_create()) {
                    return;
                }

                tracing::info!(path = ?reload_path, "Settings file changed, reloading");
                match reload(&reload_path, bind_override) {
                    Ok(settings) => {
                        let _ = updates.send(settings);
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Settings reload failed, keeping current settings")
                    }
                }
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&path, RecursiveMode::NonRecursive)?;
        tracing::info!(path = ?path, "Settings watcher started");
        Ok(watcher)
    }
}

/// Swap every received update into `shared` until shutdown or the sender closes.
pub async fn apply_updates(
    shared: Arc<ArcSwap<Settings>>,
    mut updates: mpsc::UnboundedReceiver<Settings>,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Some(settings) => {
                    if settings.listener != shared.load().listener {
                        tracing::warn!("Listener settings changed; restart required to apply them");
                    }
                    tracing::info!(
                        fallback_enabled = settings.cors.fallback_enabled,
                        debug = settings.security.debug,
                        "Settings reloaded"
                    );
                    shared.store(Arc::new(settings));
                }
                None => break,
            },
            _ = shutdown.recv() => break,
        }
    }
}
