//! Bitstamp connector: sequential REST polling of per-pair tickers.
//!
//! Bitstamp allows 600 requests per 10 minutes, so pairs are fetched one at a
//! time with a fixed delay between requests and a pause between cycles.

pub mod market;
pub mod parser;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use cet_core::config::ExchangeConfig;
use cet_core::error::CetError;
use cet_core::poll::{PollSchedule, run_poll_loop};
use cet_core::shutdown::ShutdownSignal;
use cet_core::sink::QuoteSender;
use cet_core::types::{CoinTable, Quote, SymbolDescriptor};
use serde_json::Value;
use tracing::info;

use crate::Connector;
use crate::payload::RawPayload;
use crate::registry::coin_table;

pub struct BitstampConnector {
    table: CoinTable,
    symbols: Vec<SymbolDescriptor>,
    base_url: String,
    schedule: PollSchedule,
    client: reqwest::Client,
}

impl BitstampConnector {
    pub fn from_config(config: &ExchangeConfig) -> Result<Self> {
        let table = coin_table(config, market::EXCHANGE, market::COINS, &[]);
        let pairs: Vec<String> = match &config.symbols {
            Some(pairs) => pairs.clone(),
            None => market::PAIRS.iter().map(|p| p.to_string()).collect(),
        };
        let symbols = pairs
            .iter()
            .map(|p| market::descriptor(p).ok_or_else(|| anyhow!("invalid bitstamp pair '{p}'")))
            .collect::<Result<Vec<_>>>()?;

        let client = reqwest::Client::builder()
            .timeout(config.effective_request_timeout())
            .build()
            .context("failed to build bitstamp http client")?;

        Ok(Self {
            table,
            symbols,
            base_url: config.url.clone().unwrap_or_else(|| market::TICKER_URL.to_string()),
            schedule: PollSchedule {
                per_item_delay: config.effective_per_request_interval(),
                cycle_interval: config.effective_request_interval(),
            },
            client,
        })
    }

    pub fn symbols(&self) -> &[SymbolDescriptor] {
        &self.symbols
    }

    async fn fetch(&self, symbol: SymbolDescriptor) -> Result<Option<Quote>> {
        let url = parser::ticker_url(&self.base_url, &symbol.native);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CetError::Http(format!("{url}: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(CetError::Http(format!("{url} returned {status}")).into());
        }
        let body: Value = resp.json().await.map_err(|e| CetError::Decode(format!("{url}: {e}")))?;
        Ok(RawPayload::Bitstamp { symbol, body }.normalize(&self.table).pop())
    }
}

#[async_trait]
impl Connector for BitstampConnector {
    fn exchange(&self) -> &str {
        market::EXCHANGE
    }

    fn coin_table(&self) -> &CoinTable {
        &self.table
    }

    async fn run(&self, sink: QuoteSender, shutdown: ShutdownSignal) {
        info!("[{}] polling {}", market::EXCHANGE, self.base_url);
        let fetch = |s| self.fetch(s);
        run_poll_loop(market::EXCHANGE, &self.symbols, self.schedule, fetch, &sink, shutdown).await;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use cet_core::shutdown;
    use cet_core::sink::quote_channel;
    use httpmock::prelude::*;
    use serde_json::json;
    use tokio::time::timeout;

    use super::*;

    fn config(url: String, pairs: &[&str]) -> ExchangeConfig {
        let mut cfg = ExchangeConfig::named("bitstamp");
        cfg.url = Some(url);
        cfg.symbols = Some(pairs.iter().map(|p| p.to_string()).collect());
        cfg.per_request_interval_ms = Some(10);
        cfg.request_interval_ms = Some(60_000);
        cfg.request_timeout_ms = Some(2_000);
        cfg
    }

    #[test]
    fn defaults_from_config() {
        let conn = BitstampConnector::from_config(&ExchangeConfig::named("bitstamp")).unwrap();
        assert_eq!(conn.symbols().len(), market::PAIRS.len());
        assert_eq!(conn.schedule.per_item_delay, Duration::from_millis(200));
        assert_eq!(conn.schedule.cycle_interval, Duration::from_millis(8000));
        assert_eq!(conn.coin_table().len(), market::COINS.len());
        assert_eq!(conn.base_url, market::TICKER_URL);
    }

    #[test]
    fn bad_pair_is_a_config_error() {
        let mut cfg = ExchangeConfig::named("bitstamp");
        cfg.symbols = Some(vec!["x".into()]);
        assert!(BitstampConnector::from_config(&cfg).is_err());
    }

    #[tokio::test]
    async fn polls_and_forwards_quotes_despite_failures() {
        let server = MockServer::start_async().await;
        let ltc = server
            .mock_async(|when, then| {
                when.method(GET).path("/ticker/ltcusd/");
                then.status(500);
            })
            .await;
        let btc = server
            .mock_async(|when, then| {
                when.method(GET).path("/ticker/btcusd/");
                then.status(200).json_body(json!({"last": "100", "open": "90", "volume": "5.7"}));
            })
            .await;
        let eth = server
            .mock_async(|when, then| {
                when.method(GET).path("/ticker/ethusd/");
                then.status(200).json_body(json!({"last": "10.5", "open": "0", "volume": "3"}));
            })
            .await;

        let pairs = ["ltcusd", "btcusd", "ethusd"];
        let conn = BitstampConnector::from_config(&config(server.url("/ticker"), &pairs)).unwrap();

        let (tx, mut rx) = quote_channel();
        let (trigger, signal) = shutdown::channel();
        let sink = QuoteSender::new("bitstamp", tx);
        let task = tokio::spawn(async move { conn.run(sink, signal).await });

        let first = timeout(Duration::from_secs(5), rx.recv()).await.unwrap().unwrap();
        let second = timeout(Duration::from_secs(5), rx.recv()).await.unwrap().unwrap();
        assert_eq!(first.quote.ticker(), "BTC");
        assert_eq!(first.quote.volume24h(), 6.0);
        assert_eq!(second.quote.ticker(), "ETH");
        assert_eq!(second.quote.open_price(), Some(0.0));

        // One cycle, one request per pair, in order.
        ltc.assert_async().await;
        btc.assert_async().await;
        eth.assert_async().await;

        trigger.trigger();
        timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn unparsable_body_is_a_decode_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/ticker/btcusd/");
                then.status(200).body("<html>maintenance</html>");
            })
            .await;
        let cfg = config(server.url("/ticker"), &["btcusd"]);
        let conn = BitstampConnector::from_config(&cfg).unwrap();

        let symbol = conn.symbols()[0].clone();
        let err = conn.fetch(symbol).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<CetError>(), Some(CetError::Decode(_))));
    }
}
