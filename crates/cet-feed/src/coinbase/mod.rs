//! Coinbase connector: ticker channel over the exchange WebSocket feed.

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

pub struct CoinbaseConnector {
    table: Arc<CoinTable>,
    products: Vec<String>,
    url: String,
    reconnect_interval: Duration,
}

impl CoinbaseConnector {
    pub fn from_config(config: &ExchangeConfig) -> Result<Self> {
        let table = coin_table(config, market::EXCHANGE, market::COINS, &[]);
        let products = match &config.symbols {
            Some(products) => products.clone(),
            None => market::PRODUCTS.iter().map(|p| p.to_string()).collect(),
        };
        Ok(Self {
            table: Arc::new(table),
            products,
            url: config.url.clone().unwrap_or_else(|| market::WS_URL.to_string()),
            reconnect_interval: config.effective_reconnect_interval(),
        })
    }

    fn ws_config(&self) -> WsConnConfig {
        let mut config =
            WsConnConfig::new(market::EXCHANGE, self.url.as_str(), self.reconnect_interval);
        config.subscribe_msg = Some(parser::build_subscribe(&self.products));
        config
    }
}

#[async_trait]
impl Connector for CoinbaseConnector {
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
        let conn = CoinbaseConnector::from_config(&ExchangeConfig::named("coinbase")).unwrap();
        let cfg = conn.ws_config();
        assert_eq!(cfg.label, "coinbase");
        assert_eq!(cfg.reconnect_interval, Duration::from_secs(10));
        assert!(cfg.keepalive.is_none());
        let sub: serde_json::Value = serde_json::from_str(&cfg.subscribe_msg.unwrap()).unwrap();
        let products = sub["channels"][0]["product_ids"].as_array().unwrap();
        assert_eq!(products.len(), market::PRODUCTS.len());
    }

    #[test]
    fn product_override() {
        let mut cfg = ExchangeConfig::named("coinbase");
        cfg.symbols = Some(vec!["BTC-USD".into()]);
        cfg.url = Some("ws://127.0.0.1:1".into());
        let conn = CoinbaseConnector::from_config(&cfg).unwrap();
        assert_eq!(conn.products, ["BTC-USD"]);
        assert_eq!(conn.ws_config().label, "coinbase");
        assert_eq!(conn.url, "ws://127.0.0.1:1");
    }
}
