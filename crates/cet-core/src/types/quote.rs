//! The canonical quote record handed from any connector to the sink.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::time_util;

/// One validated market observation for a single ticker/market pair.
///
/// Fields are private: a `Quote` can only be obtained through [`Quote::new`],
/// which refuses partially-populated or non-finite input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    ticker: String,
    market: String,
    price: f64,
    open_price: Option<f64>,
    volume24h: f64,
    last_update: DateTime<Utc>,
}

impl Quote {
    /// Build a quote stamped with the current UTC instant.
    ///
    /// Returns `None` when `ticker` or `market` is empty, `price` is not a
    /// positive finite number, `open_price` is present but not finite, or
    /// `volume24h` is negative or not finite.
    pub fn new(
        ticker: impl Into<String>,
        market: impl Into<String>,
        price: f64,
        open_price: Option<f64>,
        volume24h: f64,
    ) -> Option<Self> {
        let ticker = ticker.into();
        let market = market.into();
        if ticker.is_empty() || market.is_empty() {
            return None;
        }
        if !price.is_finite() || price <= 0.0 {
            return None;
        }
        if open_price.is_some_and(|o| !o.is_finite()) {
            return None;
        }
        if !volume24h.is_finite() || volume24h < 0.0 {
            return None;
        }

        Some(Self {
            ticker,
            market,
            price,
            open_price,
            volume24h,
            last_update: time_util::now_utc(),
        })
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn market(&self) -> &str {
        &self.market
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn open_price(&self) -> Option<f64> {
        self.open_price
    }

    pub fn volume24h(&self) -> f64 {
        self.volume24h
    }

    /// When the connector validated this quote.
    pub fn last_update(&self) -> DateTime<Utc> {
        self.last_update
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_complete_input() {
        let q = Quote::new("BTC", "USD", 100.0, Some(90.0), 6.0).unwrap();
        assert_eq!(q.ticker(), "BTC");
        assert_eq!(q.market(), "USD");
        assert_eq!(q.price(), 100.0);
        assert_eq!(q.open_price(), Some(90.0));
        assert_eq!(q.volume24h(), 6.0);
    }

    #[test]
    fn rejects_bad_numbers() {
        assert!(Quote::new("BTC", "USD", f64::NAN, Some(1.0), 1.0).is_none());
        assert!(Quote::new("BTC", "USD", 0.0, Some(1.0), 1.0).is_none());
        assert!(Quote::new("BTC", "USD", 1.0, Some(f64::INFINITY), 1.0).is_none());
        assert!(Quote::new("BTC", "USD", 1.0, Some(1.0), -1.0).is_none());
    }

    #[test]
    fn rejects_empty_identifiers() {
        assert!(Quote::new("", "USD", 1.0, None, 1.0).is_none());
        assert!(Quote::new("BTC", "", 1.0, None, 1.0).is_none());
    }

    #[test]
    fn open_price_may_be_absent() {
        let q = Quote::new("ETH", "USD", 10.0, None, 0.0).unwrap();
        assert_eq!(q.open_price(), None);
    }
}
