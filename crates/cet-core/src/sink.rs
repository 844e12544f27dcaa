//! Ingestion sink: canonical quotes in, partial document updates out.
//!
//! ```text
//! connector --send--> unbounded channel --> writer task --> MetadataStore::update
//! (never blocks)      (arrival order)       (one write per quote)
//! ```
//!
//! Connectors only enqueue; the writer task owns every storage call. A failed
//! write is logged and dropped, and the next quote for the same ticker/market
//! rewrites the same fields.
//!
//! [`setup_exchanges`] is the one-time pass that guarantees every configured
//! exchange has a document with an entry per configured ticker before any
//! connector starts.

use std::sync::Arc;

use anyhow::Result;
use futures_util::future::try_join_all;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::CetError;
use crate::store::{FieldUpdate, MetadataStore};
use crate::time_util;
use crate::types::{Change24h, CoinMetadata, CoinTable, ExchangeMetadataDocument, Quote};

// ---------------------------------------------------------------------------
// Quote channel
// ---------------------------------------------------------------------------

/// One quote tagged with the exchange that produced it.
#[derive(Debug, Clone)]
pub struct SinkRecord {
    pub exchange: Arc<str>,
    pub quote: Quote,
}

/// Create the raw channel a sink consumes.
pub fn quote_channel() -> (mpsc::UnboundedSender<SinkRecord>, mpsc::UnboundedReceiver<SinkRecord>) {
    mpsc::unbounded_channel()
}

/// Per-exchange handle connectors use to hand quotes to the sink.
#[derive(Debug, Clone)]
pub struct QuoteSender {
    exchange: Arc<str>,
    tx: mpsc::UnboundedSender<SinkRecord>,
}

impl QuoteSender {
    pub fn new(exchange: &str, tx: mpsc::UnboundedSender<SinkRecord>) -> Self {
        Self { exchange: Arc::from(exchange), tx }
    }

    pub fn exchange(&self) -> &str {
        &self.exchange
    }

    /// Enqueue a quote. Never blocks; returns `false` if the sink is gone.
    pub fn send(&self, quote: Quote) -> bool {
        let record = SinkRecord { exchange: Arc::clone(&self.exchange), quote };
        if self.tx.send(record).is_err() {
            warn!("[{}] sink closed, quote dropped", self.exchange);
            return false;
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Update construction
// ---------------------------------------------------------------------------

/// Build the partial update for one quote.
///
/// Touches the document's `last_update`, the quote's per-market `price`,
/// `open_price`, `volume24h`, `change24h`, `last_update`, and nulls the
/// coin's `market_cap`.
pub fn quote_update(quote: &Quote) -> Result<FieldUpdate, CetError> {
    let coin = format!("coins.{}", quote.ticker());
    let market = quote.market();
    let change = Change24h::compute(Some(quote.price()), quote.open_price());

    let mut update = FieldUpdate::new();
    update
        .set("last_update", time_util::now_utc())?
        .set(format!("{coin}.price.{market}"), quote.price())?
        .set(format!("{coin}.open_price.{market}"), quote.open_price())?
        .set(format!("{coin}.volume24h.{market}"), quote.volume24h())?
        .set(format!("{coin}.change24h.{market}"), change)?
        .set(format!("{coin}.last_update.{market}"), quote.last_update())?
        .set(format!("{coin}.market_cap"), Option::<f64>::None)?;
    Ok(update)
}

/// Outcome of applying one quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Applied,
    /// The exchange has no document; the setup pass did not run for it.
    NoDocument,
    Failed,
}

/// Apply one quote to `store`, logging instead of propagating failures.
pub async fn apply_quote(store: &dyn MetadataStore, exchange: &str, quote: &Quote) -> WriteOutcome {
    let update = match quote_update(quote) {
        Ok(update) => update,
        Err(e) => {
            warn!("[{exchange}] cannot build update for {}: {e}", quote.ticker());
            return WriteOutcome::Failed;
        }
    };
    match store.update(exchange, &update).await {
        Ok(true) => {
            debug!("[{exchange}] {} {} = {}", quote.ticker(), quote.market(), quote.price());
            WriteOutcome::Applied
        }
        Ok(false) => {
            warn!("[{exchange}] no document to update for {}", quote.ticker());
            WriteOutcome::NoDocument
        }
        Err(e) => {
            warn!("[{exchange}] write for {} failed, next quote retries: {e}", quote.ticker());
            WriteOutcome::Failed
        }
    }
}

// ---------------------------------------------------------------------------
// IngestionSink — the writer task
// ---------------------------------------------------------------------------

/// Counters reported when the sink drains.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkStats {
    pub applied: u64,
    pub no_document: u64,
    pub failed: u64,
}

/// Owns the writer task that applies quotes to the store.
pub struct IngestionSink {
    tx: mpsc::UnboundedSender<SinkRecord>,
    task: tokio::task::JoinHandle<SinkStats>,
}

impl IngestionSink {
    /// Spawn the writer task over `store`.
    pub fn spawn(store: Arc<dyn MetadataStore>) -> Self {
        let (tx, rx) = quote_channel();
        let task = tokio::spawn(run_writer(store, rx));
        Self { tx, task }
    }

    /// Handle for one exchange's connector.
    pub fn sender(&self, exchange: &str) -> QuoteSender {
        QuoteSender::new(exchange, self.tx.clone())
    }

    /// Stop accepting quotes and wait until queued ones are written.
    ///
    /// Completes once every [`QuoteSender`] has been dropped.
    pub async fn drain(self) -> SinkStats {
        drop(self.tx);
        match self.task.await {
            Ok(stats) => stats,
            Err(e) => {
                warn!("[sink] writer task failed: {e}");
                SinkStats::default()
            }
        }
    }
}

async fn run_writer(
    store: Arc<dyn MetadataStore>,
    mut rx: mpsc::UnboundedReceiver<SinkRecord>,
) -> SinkStats {
    let mut stats = SinkStats::default();
    while let Some(record) = rx.recv().await {
        match apply_quote(store.as_ref(), &record.exchange, &record.quote).await {
            WriteOutcome::Applied => stats.applied += 1,
            WriteOutcome::NoDocument => stats.no_document += 1,
            WriteOutcome::Failed => stats.failed += 1,
        }
    }
    info!(
        "[sink] drained — applied={}, no_document={}, failed={}",
        stats.applied, stats.no_document, stats.failed
    );
    stats
}

// ---------------------------------------------------------------------------
// One-time setup pass
// ---------------------------------------------------------------------------

/// What the setup pass did for one exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupOutcome {
    /// No document existed; a seeded one was inserted.
    Created,
    /// The document existed; these tickers were added.
    Extended(Vec<String>),
    /// The document already covered every configured ticker.
    Unchanged,
}

/// Ensure `table`'s exchange has a document listing every configured ticker.
///
/// Existing per-coin entries are never replaced or removed.
pub async fn setup_exchange(
    store: &dyn MetadataStore,
    table: &CoinTable,
) -> Result<SetupOutcome, CetError> {
    let exchange = table.exchange();
    let setup_err =
        |e: CetError| CetError::Setup { exchange: exchange.to_string(), reason: e.to_string() };

    let Some(existing) = store.find(exchange).await.map_err(setup_err)? else {
        let doc = ExchangeMetadataDocument::seeded(exchange, table.coins());
        store.insert(&doc).await.map_err(setup_err)?;
        return Ok(SetupOutcome::Created);
    };

    let mut update = FieldUpdate::new();
    let mut added = Vec::new();
    for (ticker, name) in table.coins() {
        if !existing.coins.contains_key(ticker) {
            update.set(format!("coins.{ticker}"), CoinMetadata::blank(name)).map_err(setup_err)?;
            added.push(ticker.to_string());
        }
    }
    if added.is_empty() {
        return Ok(SetupOutcome::Unchanged);
    }

    let matched = store.update(exchange, &update).await.map_err(setup_err)?;
    if !matched {
        return Err(CetError::Setup {
            exchange: exchange.to_string(),
            reason: "document vanished during setup".into(),
        });
    }
    Ok(SetupOutcome::Extended(added))
}

/// Run [`setup_exchange`] for every table concurrently.
///
/// Any failure aborts the whole pass; ingestion must not start without it.
pub async fn setup_exchanges(store: &dyn MetadataStore, tables: &[CoinTable]) -> Result<()> {
    let outcomes = try_join_all(tables.iter().map(|t| setup_exchange(store, t))).await?;
    for (table, outcome) in tables.iter().zip(outcomes) {
        match outcome {
            SetupOutcome::Created => {
                info!("[{}] document created ({} coins)", table.exchange(), table.len())
            }
            SetupOutcome::Extended(added) => {
                info!("[{}] document extended with {added:?}", table.exchange())
            }
            SetupOutcome::Unchanged => debug!("[{}] document up to date", table.exchange()),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::store::MemoryStore;

    /// Wraps a `MemoryStore` and counts writes.
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryStore,
        inserts: AtomicUsize,
        updates: AtomicUsize,
        fail_updates: bool,
    }

    impl CountingStore {
        fn writes(&self) -> usize {
            self.inserts.load(Ordering::SeqCst) + self.updates.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MetadataStore for CountingStore {
        async fn find(&self, key: &str) -> Result<Option<ExchangeMetadataDocument>, CetError> {
            self.inner.find(key).await
        }

        async fn insert(&self, doc: &ExchangeMetadataDocument) -> Result<(), CetError> {
            self.inserts.fetch_add(1, Ordering::SeqCst);
            self.inner.insert(doc).await
        }

        async fn update(&self, key: &str, update: &FieldUpdate) -> Result<bool, CetError> {
            self.updates.fetch_add(1, Ordering::SeqCst);
            if self.fail_updates {
                return Err(CetError::Store("injected".into()));
            }
            self.inner.update(key, update).await
        }
    }

    fn kraken_table() -> CoinTable {
        CoinTable::new("kraken", "USD").with_coins([("BTC", "Bitcoin"), ("ETH", "Ethereum")])
    }

    #[test]
    fn update_touches_only_quote_fields() {
        let quote = Quote::new("BTC", "USD", 100.0, Some(90.0), 6.0).unwrap();
        let up = quote_update(&quote).unwrap();

        assert_eq!(up.len(), 7);
        assert_eq!(up.get("coins.BTC.price.USD"), Some(&serde_json::json!(100.0)));
        assert_eq!(up.get("coins.BTC.open_price.USD"), Some(&serde_json::json!(90.0)));
        assert_eq!(up.get("coins.BTC.volume24h.USD"), Some(&serde_json::json!(6.0)));
        assert_eq!(up.get("coins.BTC.change24h.USD"), Some(&serde_json::json!(11.11)));
        assert_eq!(up.get("coins.BTC.market_cap"), Some(&serde_json::Value::Null));
        assert!(up.get("coins.BTC.last_update.USD").is_some());
        assert!(up.get("last_update").is_some());
    }

    #[test]
    fn zero_open_price_gives_not_applicable() {
        let quote = Quote::new("BTC", "USD", 100.0, Some(0.0), 1.0).unwrap();
        let up = quote_update(&quote).unwrap();
        assert_eq!(up.get("coins.BTC.change24h.USD"), Some(&serde_json::json!("N/A")));
    }

    #[test]
    fn missing_open_price_gives_not_applicable() {
        let quote = Quote::new("BTC", "USD", 100.0, None, 1.0).unwrap();
        let up = quote_update(&quote).unwrap();
        assert_eq!(up.get("coins.BTC.open_price.USD"), Some(&serde_json::Value::Null));
        assert_eq!(up.get("coins.BTC.change24h.USD"), Some(&serde_json::json!("N/A")));
    }

    #[tokio::test]
    async fn setup_creates_then_is_idempotent() {
        let store = CountingStore::default();
        let table = kraken_table();

        assert_eq!(setup_exchange(&store, &table).await.unwrap(), SetupOutcome::Created);
        let writes = store.writes();
        assert_eq!(writes, 1);

        assert_eq!(setup_exchange(&store, &table).await.unwrap(), SetupOutcome::Unchanged);
        assert_eq!(store.writes(), writes);
    }

    #[tokio::test]
    async fn setup_adds_missing_tickers_without_touching_existing() {
        let store = MemoryStore::new();
        setup_exchange(&store, &kraken_table()).await.unwrap();

        let quote = Quote::new("BTC", "USD", 50.0, Some(40.0), 3.0).unwrap();
        assert_eq!(apply_quote(&store, "kraken", &quote).await, WriteOutcome::Applied);

        let grown = kraken_table().with_coins([("XLM", "Stellar")]);
        let outcome = setup_exchange(&store, &grown).await.unwrap();
        assert_eq!(outcome, SetupOutcome::Extended(vec!["XLM".to_string()]));

        let doc = store.find("kraken").await.unwrap().unwrap();
        assert_eq!(doc.coins.len(), 3);
        assert_eq!(doc.coins["BTC"].price["USD"], 50.0);
        assert_eq!(doc.coins["XLM"].name, "Stellar");

        // Shrinking the configured set never deletes stored coins.
        let shrunk = CoinTable::new("kraken", "USD").with_coins([("BTC", "Bitcoin")]);
        assert_eq!(setup_exchange(&store, &shrunk).await.unwrap(), SetupOutcome::Unchanged);
        assert_eq!(store.find("kraken").await.unwrap().unwrap().coins.len(), 3);
    }

    #[tokio::test]
    async fn setup_all_surfaces_failures() {
        let store = MemoryStore::new();
        // A scalar where the coins map should be makes the document unreadable.
        let bad = ExchangeMetadataDocument::seeded("bitstamp", [("BTC", "Bitcoin")]);
        store.insert(&bad).await.unwrap();
        let mut up = FieldUpdate::new();
        up.set("coins", 7).unwrap();
        store.update("bitstamp", &up).await.unwrap();

        let bitstamp = CoinTable::new("bitstamp", "USD").with_coins([("BTC", "Bitcoin")]);
        let tables = [kraken_table(), bitstamp];
        let err = setup_exchanges(&store, &tables).await.unwrap_err();
        assert!(err.to_string().contains("bitstamp"));
    }

    #[tokio::test]
    async fn sink_applies_quotes_in_order() {
        let store = Arc::new(MemoryStore::new());
        setup_exchange(store.as_ref(), &kraken_table()).await.unwrap();

        let sink = IngestionSink::spawn(store.clone());
        let tx = sink.sender("kraken");
        assert!(tx.send(Quote::new("BTC", "USD", 100.0, Some(90.0), 6.0).unwrap()));
        assert!(tx.send(Quote::new("BTC", "USD", 105.0, Some(90.0), 7.0).unwrap()));
        assert!(tx.send(Quote::new("ETH", "USD", 10.0, Some(0.0), 1.0).unwrap()));
        drop(tx);

        let stats = sink.drain().await;
        assert_eq!(stats.applied, 3);

        let doc = store.find("kraken").await.unwrap().unwrap();
        assert_eq!(doc.coins["BTC"].price["USD"], 105.0);
        assert_eq!(doc.coins["BTC"].volume24h["USD"], 7.0);
        assert_eq!(doc.coins["BTC"].change24h["USD"], Change24h::Percent(16.67));
        assert_eq!(doc.coins["ETH"].change24h["USD"], Change24h::NotApplicable);
        assert_eq!(doc.coins["ETH"].market_cap, None);
    }

    #[tokio::test]
    async fn sink_survives_write_failures() {
        let store = Arc::new(CountingStore { fail_updates: true, ..Default::default() });
        let doc = ExchangeMetadataDocument::seeded("kraken", [("BTC", "Bitcoin")]);
        store.inner.insert(&doc).await.unwrap();

        let sink = IngestionSink::spawn(store.clone());
        let tx = sink.sender("kraken");
        tx.send(Quote::new("BTC", "USD", 1.0, Some(1.0), 1.0).unwrap());
        tx.send(Quote::new("BTC", "USD", 2.0, Some(1.0), 1.0).unwrap());
        drop(tx);

        let stats = sink.drain().await;
        assert_eq!(stats.failed, 2);
        assert_eq!(store.updates.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn quote_for_unknown_exchange_matches_nothing() {
        let store = MemoryStore::new();
        let quote = Quote::new("BTC", "USD", 1.0, Some(1.0), 1.0).unwrap();
        assert_eq!(apply_quote(&store, "ghost", &quote).await, WriteOutcome::NoDocument);
    }
}
