//! Configuration parsing for the tracker.
//!
//! The process reads its settings from a single JSON config file. The
//! top-level structure contains logging metadata, the storage location, and an
//! `exchanges` array where each entry describes one connector instance.
//!
//! # Example config
//!
//! ```json
//! {
//!   "tracker": { "module_name": "cet-runner", "log_path": "/tmp/log" },
//!   "storage": { "path": "/var/lib/cet/exchanges.json" },
//!   "exchanges": [
//!     { "exchange": "bitstamp", "request_interval_ms": 8000, "per_request_interval_ms": 200 },
//!     { "exchange": "kraken", "reconnect_interval_ms": 10000 },
//!     { "exchange": "coinbase" },
//!     { "exchange": "bittrex", "keepalive_interval_ms": 8000 }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::error::CetError;

/// Default quote market.
pub const DEFAULT_MARKET: &str = "USD";

/// Exchanges enabled when no config file is given.
pub const DEFAULT_EXCHANGES: &[&str] = &["bitstamp", "bittrex", "coinbase", "kraken"];

/// Top-level application config, deserialized from a JSON file.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Module metadata (name, log path).
    #[serde(default)]
    pub tracker: Option<ModuleMeta>,

    /// Where exchange documents are kept.
    #[serde(default)]
    pub storage: StorageConfig,

    /// One entry per exchange connector.
    pub exchanges: Vec<ExchangeConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tracker: None,
            storage: StorageConfig::default(),
            exchanges: DEFAULT_EXCHANGES.iter().map(|e| ExchangeConfig::named(e)).collect(),
        }
    }
}

impl AppConfig {
    /// Enabled exchange entries, in config order.
    pub fn enabled_exchanges(&self) -> impl Iterator<Item = &ExchangeConfig> {
        self.exchanges.iter().filter(|e| e.is_enabled())
    }

    /// Reject duplicate exchange names (each exchange owns exactly one
    /// connector) and zero reconnect or keep-alive intervals.
    pub fn validate(&self) -> Result<(), CetError> {
        let mut seen = std::collections::HashSet::new();
        for ex in self.enabled_exchanges() {
            if !seen.insert(ex.exchange.to_lowercase()) {
                let msg = format!("exchange '{}' configured twice", ex.exchange);
                return Err(CetError::Config(msg));
            }
            ex.validate()?;
        }
        Ok(())
    }

    pub fn module_name(&self) -> String {
        self.tracker
            .as_ref()
            .and_then(|m| m.module_name.clone())
            .unwrap_or_else(|| "cet-runner".to_string())
    }

    pub fn log_path(&self) -> Option<String> {
        self.tracker.as_ref().and_then(|m| m.log_path.clone())
    }
}

/// Module metadata block.
#[derive(Debug, Clone, Deserialize)]
pub struct ModuleMeta {
    pub module_name: Option<String>,
    pub log_path: Option<String>,
}

/// Storage settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    /// JSON file holding every exchange document. `None` keeps documents in
    /// memory only.
    pub path: Option<String>,
}

/// A single exchange connector configuration.
///
/// Everything except `exchange` is optional; the exchange module supplies
/// its own endpoint, symbol list, and coin table when not overridden.
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeConfig {
    /// Exchange identifier: `"bitstamp"`, `"kraken"`, `"coinbase"`, `"bittrex"`.
    pub exchange: String,

    /// Set to `false` to skip this exchange entirely.
    pub enabled: Option<bool>,

    /// Endpoint override (REST base URL or WebSocket URL).
    pub url: Option<String>,

    /// Tracked quote market (default: `"USD"`).
    pub market: Option<String>,

    /// Polling: pause between full cycles.
    pub request_interval_ms: Option<u64>,

    /// Polling: pause between two consecutive requests.
    pub per_request_interval_ms: Option<u64>,

    /// Polling: per-request HTTP timeout.
    pub request_timeout_ms: Option<u64>,

    /// Streaming: backoff before reconnecting.
    pub reconnect_interval_ms: Option<u64>,

    /// Streaming: keep-alive / poll call interval (multiplexed feeds).
    pub keepalive_interval_ms: Option<u64>,

    /// Supported coins override: ticker -> display name.
    pub coins: Option<BTreeMap<String, String>>,

    /// Exchange-native symbols to track, overriding the built-in list.
    pub symbols: Option<Vec<String>>,
}

impl ExchangeConfig {
    /// Config entry with every override unset.
    pub fn named(exchange: &str) -> Self {
        Self {
            exchange: exchange.to_string(),
            enabled: None,
            url: None,
            market: None,
            request_interval_ms: None,
            per_request_interval_ms: None,
            request_timeout_ms: None,
            reconnect_interval_ms: None,
            keepalive_interval_ms: None,
            coins: None,
            symbols: None,
        }
    }

    fn validate(&self) -> Result<(), CetError> {
        let intervals = [
            ("reconnect_interval_ms", self.reconnect_interval_ms),
            ("keepalive_interval_ms", self.keepalive_interval_ms),
        ];
        for (key, value) in intervals {
            if value == Some(0) {
                let msg = format!("exchange '{}': {key} must be greater than zero", self.exchange);
                return Err(CetError::Config(msg));
            }
        }
        Ok(())
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    pub fn effective_market(&self) -> String {
        self.market.clone().unwrap_or_else(|| DEFAULT_MARKET.to_string())
    }

    /// Cycle interval (default: 8 s).
    pub fn effective_request_interval(&self) -> Duration {
        Duration::from_millis(self.request_interval_ms.unwrap_or(8_000))
    }

    /// Per-item delay (default: 200 ms).
    pub fn effective_per_request_interval(&self) -> Duration {
        Duration::from_millis(self.per_request_interval_ms.unwrap_or(200))
    }

    /// HTTP timeout (default: 10 s).
    pub fn effective_request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms.unwrap_or(10_000))
    }

    /// Reconnect backoff (default: 10 s).
    pub fn effective_reconnect_interval(&self) -> Duration {
        Duration::from_millis(self.reconnect_interval_ms.unwrap_or(10_000))
    }

    /// Keep-alive interval (default: 8 s).
    pub fn effective_keepalive_interval(&self) -> Duration {
        Duration::from_millis(self.keepalive_interval_ms.unwrap_or(8_000))
    }
}

/// Load and parse a JSON config file.
pub fn load_config(path: &std::path::Path) -> anyhow::Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&content)?;
    config.validate()?;
    Ok(config)
}
