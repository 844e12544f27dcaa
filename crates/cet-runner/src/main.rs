//! # cet-runner
//!
//! Main entry point for the coin exchange tracker.
//!
//! Loads a JSON configuration file (or the built-in defaults), opens the
//! metadata store, makes sure every exchange has its document, then runs one
//! connector per configured exchange until Ctrl+C.
//!
//! # Usage
//!
//! ```bash
//! cet-runner config.json --log-level info --store-path /var/lib/cet/exchanges.json
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use cet_core::config::{AppConfig, load_config};
use cet_core::sink::{IngestionSink, setup_exchanges};
use cet_core::store::{FileStore, MemoryStore, MetadataStore};
use cet_core::types::CoinTable;
use clap::Parser;
use tracing::{error, info, warn};

/// Coin Exchange Tracker.
#[derive(Parser)]
#[command(name = "cet-runner", about = "Coin exchange quote tracker")]
struct Cli {
    /// Configuration file path (JSON). Built-in defaults when omitted.
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Optional log directory for file output.
    #[arg(long)]
    log_dir: Option<String>,

    /// Document file; overrides `storage.path` from the config.
    #[arg(long)]
    store_path: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Load configuration
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    // 2. Initialize logging
    let log_dir = cli.log_dir.clone().or_else(|| config.log_path());
    cet_core::logging::init_logging(&cli.log_level, log_dir.as_deref(), &config.module_name())?;

    match &cli.config {
        Some(path) => {
            info!("cet-runner starting — config={}, log_level={}", path.display(), cli.log_level)
        }
        None => info!("cet-runner starting — built-in config, log_level={}", cli.log_level),
    }

    // 3. Open the store
    let store_path = cli.store_path.clone().or_else(|| config.storage.path.clone());
    let store: Arc<dyn MetadataStore> = match store_path {
        Some(path) => {
            info!("using document file {path}");
            Arc::new(FileStore::open(&path).await?)
        }
        None => {
            warn!("no storage path configured — documents are kept in memory only");
            Arc::new(MemoryStore::new())
        }
    };

    // 4. Create connectors from the exchanges array
    let mut connectors: Vec<Box<dyn cet_feed::Connector>> = Vec::new();
    for (idx, ex_config) in config.enabled_exchanges().enumerate() {
        match cet_feed::registry::create_connector(ex_config) {
            Ok(connector) => {
                info!(
                    "exchange[{idx}]: created connector '{}' ({} coins, market {})",
                    connector.exchange(),
                    connector.coin_table().len(),
                    connector.coin_table().market(),
                );
                connectors.push(connector);
            }
            Err(e) => {
                error!(
                    "exchange[{idx}]: failed to create connector for '{}': {e:#}",
                    ex_config.exchange
                );
            }
        }
    }

    // 5. One-time setup pass; ingestion must not start without it
    let tables: Vec<CoinTable> = connectors.iter().map(|c| c.coin_table().clone()).collect();
    setup_exchanges(store.as_ref(), &tables).await?;
    info!("setup pass complete for {} exchange(s)", tables.len());

    // 6. Start every connector
    let sink = IngestionSink::spawn(Arc::clone(&store));
    let (trigger, _signal) = cet_core::shutdown::channel();
    let mut tasks = Vec::with_capacity(connectors.len());
    for connector in connectors {
        let quotes = sink.sender(connector.exchange());
        let signal = trigger.subscribe();
        tasks.push(tokio::spawn(async move {
            connector.run(quotes, signal).await;
        }));
    }

    info!("all {} connector(s) started — press Ctrl+C to stop", tasks.len());

    // 7. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    trigger.trigger();

    for task in tasks {
        if let Err(e) = task.await {
            error!("connector task failed: {e}");
        }
    }

    // 8. Flush queued writes
    let stats = sink.drain().await;
    info!(
        "all connectors stopped — applied={}, no_document={}, failed={} — goodbye",
        stats.applied, stats.no_document, stats.failed
    );
    Ok(())
}
