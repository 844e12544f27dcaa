//! Kraken connector: ticker channel over the public WebSocket feed.

pub mod market;
pub mod parser;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use cet_core::config::ExchangeConfig;
use cet_core::shutdown::ShutdownSignal;
use cet_core::sink::QuoteSender;
use cet_core::types::CoinTable;
use cet_core::ws::WsConnConfig;

use crate::Connector;
use crate::registry::coin_table;
use crate::stream::{StreamParams, run_stream};

pub struct KrakenConnector {
    table: Arc<CoinTable>,
    pairs: Vec<String>,
    url: String,
    reconnect_interval: Duration,
}

impl KrakenConnector {
    pub fn from_config(config: &ExchangeConfig) -> Result<Self> {
        let table = coin_table(config, market::EXCHANGE, market::COINS, market::ALIASES);
        let pairs = match &config.symbols {
            Some(pairs) => pairs.clone(),
            None => market::PAIRS.iter().map(|p| p.to_string()).collect(),
        };
        Ok(Self {
            table: Arc::new(table),
            pairs,
            url: config.url.clone().unwrap_or_else(|| market::WS_URL.to_string()),
            reconnect_interval: config.effective_reconnect_interval(),
        })
    }

    fn ws_config(&self) -> WsConnConfig {
        let mut config =
            WsConnConfig::new(market::EXCHANGE, self.url.as_str(), self.reconnect_interval);
        config.subscribe_msg = Some(parser::build_subscribe(&self.pairs));
        config
    }
}

#[async_trait]
impl Connector for KrakenConnector {
    fn exchange(&self) -> &str {
        market::EXCHANGE
    }

    fn coin_table(&self) -> &CoinTable {
        &self.table
    }

    async fn run(&self, sink: QuoteSender, shutdown: ShutdownSignal) {
        let params = StreamParams {
            config: self.ws_config(),
            table: Arc::clone(&self.table),
            decode: parser::decode,
            sink,
        };
        run_stream(params, shutdown).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ws_config_carries_subscription() {
        let conn = KrakenConnector::from_config(&ExchangeConfig::named("kraken")).unwrap();
        let cfg = conn.ws_config();
        assert_eq!(cfg.label, "kraken");
        assert_eq!(cfg.reconnect_interval, Duration::from_secs(10));
        assert!(cfg.keepalive.is_none());
        let sub = cfg.subscribe_msg.unwrap();
        assert!(sub.contains("\"XBT/USD\""));
        assert!(sub.contains("\"ticker\""));
    }
}
