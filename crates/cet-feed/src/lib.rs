//! # cet-feed
//!
//! Exchange connectors for the tracker.
//!
//! ## Architecture
//!
//! Each exchange module builds one [`Connector`] from its
//! [`ExchangeConfig`](cet_core::config::ExchangeConfig). A connector composes
//! either the polling scheduler ([`cet_core::poll`]) or the reconnecting
//! stream client ([`cet_core::ws`]) with the exchange's payload decoder and
//! coin table. Connectors share nothing with each other.
//!
//! ## Shared infrastructure
//!
//! - [`payload`] — per-exchange raw payload union and its normalization
//! - [`stream`] — glue from stream frames to the ingestion sink
//! - [`json_util`] — JSON number helpers
//! - [`registry`] — factory keyed by exchange name

pub mod bitstamp;
pub mod bittrex;
pub mod coinbase;
pub mod json_util;
pub mod kraken;
pub mod payload;
pub mod registry;
pub mod stream;

use async_trait::async_trait;
use cet_core::shutdown::ShutdownSignal;
use cet_core::sink::QuoteSender;
use cet_core::types::CoinTable;

/// Trait implemented by every exchange connector.
///
/// The runner starts each connector exactly once; running the same instance
/// twice concurrently is not supported.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Exchange name, also the document key.
    fn exchange(&self) -> &str;
    /// Supported coins, aliases, and tracked market.
    fn coin_table(&self) -> &CoinTable;
    /// Produce quotes into `sink` until `shutdown` fires.
    async fn run(&self, sink: QuoteSender, shutdown: ShutdownSignal);
}
