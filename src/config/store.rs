//! Lock-free holder of the current configuration.

use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::sync::{mpsc, watch};

use crate::config::loader::ConfigError;
use crate::config::schema::{ConnectorConfig, EndpointConfig};

/// Current presets, swapped atomically on reload.
///
/// Readers take a snapshot per call; a reload never mutates a config a
/// caller already holds.
#[derive(Debug)]
pub struct PresetStore {
    current: ArcSwap<ConnectorConfig>,
}

impl PresetStore {
    pub fn new(config: ConnectorConfig) -> Self {
        Self {
            current: ArcSwap::from_pointee(config),
        }
    }

    /// Snapshot of the current configuration.
    pub fn current(&self) -> Arc<ConnectorConfig> {
        self.current.load_full()
    }

    /// Replace the configuration wholesale.
    pub fn replace(&self, config: ConnectorConfig) {
        self.current.store(Arc::new(config));
    }

    /// Resolve a preset from the current configuration.
    pub fn preset(&self, name: &str) -> Result<EndpointConfig, ConfigError> {
        self.current.load().preset(name).cloned()
    }

    /// Apply every config received on `updates` until the channel closes.
    ///
    /// The returned receiver carries the number of reloads applied so far;
    /// its sender is dropped once `updates` closes.
    pub fn follow(self: Arc<Self>, mut updates: mpsc::UnboundedReceiver<ConnectorConfig>) -> watch::Receiver<u64> {
        let (reloaded_tx, reloaded_rx) = watch::channel(0);
        tokio::spawn(async move {
            while let Some(config) = updates.recv().await {
                tracing::info!(presets = config.presets.len(), "Presets reloaded");
                self.replace(config);
                reloaded_tx.send_modify(|generation| *generation += 1);
            }
        });
        reloaded_rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(rest: &str) -> EndpointConfig {
        EndpointConfig {
            rpc_endpoint: "https://a".to_string(),
            rest_endpoint: rest.to_string(),
            chain_id: "a-1".to_string(),
            address_prefix: "secret".to_string(),
            gas_price: "0.25".to_string(),
            denom: "uscrt".to_string(),
            hd_path: None,
        }
    }

    #[tokio::test]
    async fn test_follow_swaps_config() {
        let mut initial = ConnectorConfig::default();
        initial.presets.insert("main".to_string(), endpoint("https://a-q"));
        let store = Arc::new(PresetStore::new(initial));
        let before = store.current();

        let (tx, rx) = mpsc::unbounded_channel();
        let mut reloads = store.clone().follow(rx);

        let mut next = ConnectorConfig::default();
        next.presets.insert("main".to_string(), endpoint("https://b-q"));
        tx.send(next).unwrap();
        reloads.changed().await.unwrap();
        assert_eq!(*reloads.borrow_and_update(), 1);

        drop(tx);
        assert!(reloads.changed().await.is_err());

        assert_eq!(store.preset("main").unwrap().rest_endpoint, "https://b-q");
        // Earlier snapshots are unaffected.
        assert_eq!(before.presets["main"].rest_endpoint, "https://a-q");
        assert!(matches!(store.preset("other"), Err(ConfigError::UnknownPreset(_))));
    }
}
