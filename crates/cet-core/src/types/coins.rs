//! Per-exchange supported-coin table.
//!
//! Holds what an exchange is configured to track: the canonical tickers with
//! their display names, the exchange-native aliases that map onto those
//! tickers, and the single quote market that is tracked.

use std::collections::BTreeMap;

use ahash::AHashMap;

/// Static coin configuration for one exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinTable {
    exchange: String,
    market: String,
    coins: BTreeMap<String, String>,
    aliases: AHashMap<String, String>,
}

impl CoinTable {
    /// Empty table tracking `market` on `exchange`.
    pub fn new(exchange: impl Into<String>, market: impl Into<String>) -> Self {
        Self {
            exchange: exchange.into(),
            market: market.into(),
            coins: BTreeMap::new(),
            aliases: AHashMap::new(),
        }
    }

    /// Add `(ticker, display name)` pairs.
    pub fn with_coins<I, T, N>(mut self, coins: I) -> Self
    where
        I: IntoIterator<Item = (T, N)>,
        T: Into<String>,
        N: Into<String>,
    {
        self.coins.extend(coins.into_iter().map(|(t, n)| (t.into(), n.into())));
        self
    }

    /// Add `(native code, canonical ticker)` aliases.
    pub fn with_aliases<I, A, T>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = (A, T)>,
        A: Into<String>,
        T: Into<String>,
    {
        self.aliases.extend(aliases.into_iter().map(|(a, t)| (a.into(), t.into())));
        self
    }

    /// Replace the supported coins wholesale (config override).
    pub fn replace_coins(&mut self, coins: BTreeMap<String, String>) {
        self.coins = coins;
    }

    pub fn exchange(&self) -> &str {
        &self.exchange
    }

    /// The one quote market tracked on this exchange.
    pub fn market(&self) -> &str {
        &self.market
    }

    /// Map an exchange-native code to its canonical ticker.
    ///
    /// Codes without an alias are already canonical.
    pub fn resolve<'a>(&'a self, native: &'a str) -> &'a str {
        self.aliases.get(native).map(String::as_str).unwrap_or(native)
    }

    pub fn supports(&self, ticker: &str) -> bool {
        self.coins.contains_key(ticker)
    }

    pub fn tracks_market(&self, market: &str) -> bool {
        self.market == market
    }

    /// Resolve `native` and check both filters.
    ///
    /// Returns the canonical ticker, or `None` if the market is not tracked
    /// or the resolved ticker is not supported.
    pub fn accept(&self, native: &str, market: &str) -> Option<String> {
        if !self.tracks_market(market) {
            return None;
        }
        let ticker = self.resolve(native);
        self.supports(ticker).then(|| ticker.to_string())
    }

    /// Supported `(ticker, display name)` pairs in ticker order.
    pub fn coins(&self) -> impl Iterator<Item = (&str, &str)> {
        self.coins.iter().map(|(t, n)| (t.as_str(), n.as_str()))
    }

    pub fn len(&self) -> usize {
        self.coins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coins.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> CoinTable {
        CoinTable::new("kraken", "USD")
            .with_coins([("BTC", "Bitcoin"), ("XLM", "Stellar")])
            .with_aliases([("XBT", "BTC"), ("STR", "XLM")])
    }

    #[test]
    fn alias_resolves_before_support_check() {
        let t = table();
        assert_eq!(t.resolve("XBT"), "BTC");
        assert_eq!(t.accept("XBT", "USD").as_deref(), Some("BTC"));
        assert_eq!(t.accept("STR", "USD").as_deref(), Some("XLM"));
        assert_eq!(t.accept("BTC", "USD").as_deref(), Some("BTC"));
    }

    #[test]
    fn unsupported_ticker_rejected() {
        assert!(table().accept("DOGE", "USD").is_none());
    }

    #[test]
    fn untracked_market_rejected() {
        assert!(table().accept("BTC", "EUR").is_none());
        assert!(table().accept("XBT", "BTC").is_none());
    }

    #[test]
    fn replace_coins_overrides() {
        let mut t = table();
        t.replace_coins(BTreeMap::from([("ETH".to_string(), "Ethereum".to_string())]));
        assert!(!t.supports("BTC"));
        assert!(t.supports("ETH"));
        assert_eq!(t.len(), 1);
    }
}
