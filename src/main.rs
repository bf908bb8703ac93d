//! `ledger-connect` command line tool.
//!
//! Inspects presets and exercises the connection manager against live
//! endpoints:
//!
//! ```text
//! ledger-connect presets                 list configured presets
//! ledger-connect probe --preset NAME     open a query session, print node info
//! ledger-connect address --preset NAME   derive the local account address
//! ledger-connect watch --preset NAME     re-probe whenever the presets file changes
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};

use ledger_connect::config::watcher::ConfigWatcher;
use ledger_connect::config::{load_config, ConnectorConfig, PresetStore};
use ledger_connect::ledger::client::QueryClient;
use ledger_connect::ledger::wallet::{LocalWallet, Mnemonic};
use ledger_connect::observability::{logging, metrics};
use ledger_connect::session::Session;
use ledger_connect::{ConnectionManager, EndpointConfig};

#[derive(Parser)]
#[command(name = "ledger-connect")]
#[command(about = "Query and signing session manager for ledger endpoints", long_about = None)]
struct Cli {
    /// Presets file
    #[arg(short, long, default_value = "ledger-connect.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured presets
    Presets,
    /// Open a query session and print the node's info
    Probe {
        #[arg(short, long)]
        preset: String,
        /// Rebuild the query session even if one is cached
        #[arg(long)]
        force: bool,
    },
    /// Derive the local account address from LEDGER_CONNECT_MNEMONIC
    Address {
        #[arg(short, long)]
        preset: String,
    },
    /// Reload presets on file change and re-probe the chosen preset
    Watch {
        #[arg(short, long)]
        preset: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    logging::init(&config.observability);

    tracing::info!(
        path = %cli.config.display(),
        presets = config.presets.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    match cli.command {
        Commands::Presets => list_presets(&config),
        Commands::Probe { preset, force } => {
            let manager = ConnectionManager::from_settings(config.client.clone())?;
            let endpoint = config.preset(&preset)?;
            probe(&manager, endpoint, force).await?;
        }
        Commands::Address { preset } => {
            let endpoint = config.preset(&preset)?;
            let mnemonic = Mnemonic::from_env()?;
            let wallet = LocalWallet::from_mnemonic(&mnemonic, &endpoint.address_prefix, endpoint.hd_path())?;
            println!("{}", wallet.address());
        }
        Commands::Watch { preset } => watch(&cli.config, config, &preset).await?,
    }

    Ok(())
}

fn list_presets(config: &ConnectorConfig) {
    if config.presets.is_empty() {
        println!("No presets configured");
        return;
    }

    for (name, preset) in &config.presets {
        println!(
            "{:<16} {:<20} rpc={} rest={} gas={}{}",
            name, preset.chain_id, preset.rpc_endpoint, preset.rest_endpoint, preset.gas_price, preset.denom
        );
    }
}

async fn probe(
    manager: &ConnectionManager,
    endpoint: &EndpointConfig,
    force: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = manager.get_query_session(endpoint, force).await?;
    let info = session.client().node_info().await?;

    println!("Endpoints: {}", session.endpoints());
    println!("Network:   {}", info.network);
    println!("Version:   {}", info.version);
    println!("Moniker:   {}", info.moniker);

    if info.network != endpoint.chain_id {
        eprintln!(
            "Warning: preset chain id {} does not match node network {}",
            endpoint.chain_id, info.network
        );
    }
    Ok(())
}

async fn watch(path: &Path, config: ConnectorConfig, preset: &str) -> Result<(), Box<dyn std::error::Error>> {
    let manager = ConnectionManager::from_settings(config.client.clone())?;
    let store = Arc::new(PresetStore::new(config));

    let (watcher, updates) = ConfigWatcher::new(path);
    let _watcher = watcher.run()?;
    let mut reloads = store.clone().follow(updates);

    report(&manager, &store, preset).await;

    loop {
        tokio::select! {
            changed = reloads.changed() => {
                if changed.is_err() {
                    break;
                }
                report(&manager, &store, preset).await;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, stopping watcher");
                break;
            }
        }
    }
    Ok(())
}

async fn report(manager: &ConnectionManager, store: &PresetStore, preset: &str) {
    let endpoint = match store.preset(preset) {
        Ok(endpoint) => endpoint,
        Err(e) => {
            eprintln!("{}", e);
            return;
        }
    };

    let before = manager.cache().query_endpoints();
    match manager.get_query_session(&endpoint, false).await {
        Ok(session) => {
            let rebuilt = before.as_ref() != Some(session.endpoints());
            println!(
                "{} {}",
                if rebuilt { "connected" } else { "unchanged" },
                session.endpoints()
            );
        }
        Err(e) => eprintln!("{}: {}", preset, e),
    }
}
