//! Bittrex connector: compressed summary feed over the SignalR `c2` hub.
//!
//! Every connect attempt negotiates a fresh connection token over HTTP.
//! While connected, a `QuerySummaryState` invocation is sent each keep-alive
//! interval; its reply carries every market summary. An error reply drops the
//! connection into the normal backoff path.

pub mod market;
pub mod parser;
pub mod signalr;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use cet_core::config::ExchangeConfig;
use cet_core::shutdown::ShutdownSignal;
use cet_core::sink::QuoteSender;
use cet_core::types::CoinTable;
use cet_core::ws::{KeepAlive, ResolveUrl, WsConnConfig, WsEndpoint};
use futures_util::FutureExt;

use crate::Connector;
use crate::registry::coin_table;
use crate::stream::{StreamParams, run_stream};

pub struct BittrexConnector {
    table: Arc<CoinTable>,
    base_url: String,
    reconnect_interval: Duration,
    keepalive_interval: Duration,
    client: reqwest::Client,
}

impl BittrexConnector {
    pub fn from_config(config: &ExchangeConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.effective_request_timeout())
            .build()
            .context("failed to build bittrex http client")?;
        Ok(Self {
            table: Arc::new(coin_table(config, market::EXCHANGE, market::COINS, &[])),
            base_url: config.url.clone().unwrap_or_else(|| market::SIGNALR_URL.to_string()),
            reconnect_interval: config.effective_reconnect_interval(),
            keepalive_interval: config.effective_keepalive_interval(),
            client,
        })
    }

    fn ws_config(&self) -> WsConnConfig {
        let client = self.client.clone();
        let base = self.base_url.clone();
        let resolve: ResolveUrl = Arc::new(move || {
            let client = client.clone();
            let base = base.clone();
            async move {
                let token = signalr::negotiate(&client, &base).await?;
                signalr::connect_url(&base, &token)
            }
            .boxed()
        });

        // Invocation ids only need to be unique per connection; a shared
        // counter across reconnects satisfies that.
        let next_id = Arc::new(AtomicU64::new(0));
        let keepalive = KeepAlive {
            interval: self.keepalive_interval,
            message: Arc::new(move || {
                signalr::query_summary_state(next_id.fetch_add(1, Ordering::Relaxed))
            }),
        };

        WsConnConfig {
            label: market::EXCHANGE.to_string(),
            endpoint: WsEndpoint::Resolved(resolve),
            subscribe_msg: None,
            keepalive: Some(keepalive),
            reconnect_interval: self.reconnect_interval,
        }
    }
}

#[async_trait]
impl Connector for BittrexConnector {
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
