//! Presets file watcher for hot reload.
//!
//! Watches the directory holding the presets file rather than the file
//! itself: editors that save by writing a sibling and renaming it over the
//! original replace the inode, and a file-level watch goes silent after the
//! first such save.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use sha2::{Digest, Sha256};
use tokio::sync::mpsc;

use crate::config::loader::parse_config;
use crate::config::schema::ConnectorConfig;

/// Sends a freshly loaded config whenever the presets file changes.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<ConnectorConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and a receiver for reloaded configurations.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<ConnectorConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching. The returned watcher must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let dir = watch_dir(&self.path);
        let file_name = self.path.file_name().map(|name| name.to_os_string()).ok_or_else(|| {
            notify::Error::generic("presets path has no file name").add_path(self.path.clone())
        })?;

        let reload = Reload {
            path: self.path.clone(),
            file_name,
            // Seeded so the events of the initial write are not a reload.
            last_digest: Mutex::new(digest_of(&self.path)),
            tx: self.update_tx,
        };

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => reload.on_event(&event),
                Err(e) => tracing::error!(error = %e, "Presets watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, dir = ?dir, "Presets watcher started");
        Ok(watcher)
    }
}

struct Reload {
    path: PathBuf,
    file_name: OsString,
    last_digest: Mutex<Option<[u8; 32]>>,
    tx: mpsc::UnboundedSender<ConnectorConfig>,
}

impl Reload {
    fn on_event(&self, event: &Event) {
        if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
            return;
        }
        if !event.paths.iter().any(|p| p.file_name() == Some(self.file_name.as_os_str())) {
            return;
        }

        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            // Mid-rename the file may briefly be absent; the create event follows.
            Err(e) => {
                tracing::debug!(path = ?self.path, error = %e, "Presets file not readable yet");
                return;
            }
        };

        let digest: [u8; 32] = Sha256::digest(content.as_bytes()).into();
        {
            let Ok(mut last) = self.last_digest.lock() else { return };
            if last.as_ref() == Some(&digest) {
                return;
            }
            *last = Some(digest);
        }

        match parse_config(&content) {
            Ok(config) => {
                tracing::info!(presets = config.presets.len(), "Presets file changed, reloaded");
                let _ = self.tx.send(config);
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to reload presets, keeping current configuration");
            }
        }
    }
}

fn watch_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn digest_of(path: &Path) -> Option<[u8; 32]> {
    std::fs::read(path).ok().map(|bytes| Sha256::digest(&bytes).into())
}
