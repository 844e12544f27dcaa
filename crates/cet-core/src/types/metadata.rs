//! Persisted per-exchange metadata documents and the 24h change figure.
//!
//! One [`ExchangeMetadataDocument`] exists per exchange, keyed by exchange
//! name. Its `coins` map holds a [`CoinMetadata`] per configured ticker, and
//! every per-market figure inside it is a `market -> value` map so several
//! quote currencies can coexist.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::time_util;

/// Stored text for a change that cannot be computed.
pub const NOT_APPLICABLE: &str = "N/A";

/// 24h percentage change of price against the 24h reference price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Change24h {
    /// Percentage, rounded to two decimals.
    Percent(f64),
    /// A missing or non-positive operand makes the change meaningless.
    NotApplicable,
}

impl Change24h {
    /// `((price - open) / |open|) * 100`, rounded to two decimals.
    ///
    /// Yields [`Change24h::NotApplicable`] if either operand is missing,
    /// non-finite, or not strictly positive.
    pub fn compute(price: Option<f64>, open_price: Option<f64>) -> Self {
        match (price, open_price) {
            (Some(p), Some(o)) if p.is_finite() && o.is_finite() && p > 0.0 && o > 0.0 => {
                Self::Percent(time_util::round2((p - o) / o.abs() * 100.0))
            }
            _ => Self::NotApplicable,
        }
    }
}

impl fmt::Display for Change24h {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Percent(v) => write!(f, "{v:.2}%"),
            Self::NotApplicable => f.write_str(NOT_APPLICABLE),
        }
    }
}

impl Serialize for Change24h {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Percent(v) => serializer.serialize_f64(*v),
            Self::NotApplicable => serializer.serialize_str(NOT_APPLICABLE),
        }
    }
}

impl<'de> Deserialize<'de> for Change24h {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(f64),
            Text(String),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Number(v) => Self::Percent(v),
            Repr::Text(_) => Self::NotApplicable,
        })
    }
}

/// Per-coin metadata embedded in an exchange document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinMetadata {
    /// Display name, e.g. `"Bitcoin"`.
    pub name: String,
    #[serde(default)]
    pub price: BTreeMap<String, f64>,
    #[serde(default)]
    pub open_price: BTreeMap<String, Option<f64>>,
    #[serde(default)]
    pub change24h: BTreeMap<String, Change24h>,
    #[serde(default)]
    pub volume24h: BTreeMap<String, f64>,
    /// Reserved; circulating supply is never sourced.
    #[serde(default)]
    pub supply: f64,
    /// Always null while `supply` is unset.
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub last_update: BTreeMap<String, DateTime<Utc>>,
}

impl CoinMetadata {
    /// Fresh entry with no market data yet.
    pub fn blank(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            price: BTreeMap::new(),
            open_price: BTreeMap::new(),
            change24h: BTreeMap::new(),
            volume24h: BTreeMap::new(),
            supply: 0.0,
            market_cap: None,
            last_update: BTreeMap::new(),
        }
    }
}

/// The stored document for one exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeMetadataDocument {
    /// Exchange name; the document key.
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub last_update: DateTime<Utc>,
    #[serde(default)]
    pub coins: BTreeMap<String, CoinMetadata>,
}

impl ExchangeMetadataDocument {
    /// New document seeded with a blank entry for every `(ticker, name)`.
    pub fn seeded<'a>(exchange: &str, coins: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            id: exchange.to_string(),
            name: exchange.to_string(),
            last_update: time_util::now_utc(),
            coins: coins
                .into_iter()
                .map(|(ticker, name)| (ticker.to_string(), CoinMetadata::blank(name)))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_matches_formula() {
        assert_eq!(Change24h::compute(Some(100.0), Some(90.0)), Change24h::Percent(11.11));
        assert_eq!(Change24h::compute(Some(90.0), Some(100.0)), Change24h::Percent(-10.0));
        assert_eq!(Change24h::compute(Some(1.0), Some(3.0)), Change24h::Percent(-66.67));
    }

    #[test]
    fn change_not_applicable_for_non_positive_operands() {
        assert_eq!(Change24h::compute(Some(100.0), Some(0.0)), Change24h::NotApplicable);
        assert_eq!(Change24h::compute(Some(0.0), Some(10.0)), Change24h::NotApplicable);
        assert_eq!(Change24h::compute(Some(-1.0), Some(10.0)), Change24h::NotApplicable);
        assert_eq!(Change24h::compute(Some(5.0), Some(-10.0)), Change24h::NotApplicable);
        assert_eq!(Change24h::compute(Some(5.0), None), Change24h::NotApplicable);
        assert_eq!(Change24h::compute(None, Some(5.0)), Change24h::NotApplicable);
    }

    #[test]
    fn change_serializes_as_number_or_sentinel() {
        let pct = serde_json::to_value(Change24h::Percent(1.5)).unwrap();
        assert_eq!(pct, serde_json::json!(1.5));
        let na = serde_json::to_value(Change24h::NotApplicable).unwrap();
        assert_eq!(na, serde_json::json!("N/A"));

        let back: Change24h = serde_json::from_value(na).unwrap();
        assert_eq!(back, Change24h::NotApplicable);
    }

    #[test]
    fn seeded_document_has_blank_coins() {
        let coins = [("BTC", "Bitcoin"), ("ETH", "Ethereum")];
        let doc = ExchangeMetadataDocument::seeded("kraken", coins);
        assert_eq!(doc.id, "kraken");
        assert_eq!(doc.coins.len(), 2);
        let btc = &doc.coins["BTC"];
        assert_eq!(btc.name, "Bitcoin");
        assert!(btc.price.is_empty());
        assert_eq!(btc.market_cap, None);
        assert_eq!(btc.supply, 0.0);
    }

    #[test]
    fn document_key_is_underscore_id() {
        let doc = ExchangeMetadataDocument::seeded("bitstamp", [("BTC", "Bitcoin")]);
        let v = serde_json::to_value(&doc).unwrap();
        assert_eq!(v["_id"], "bitstamp");
        assert_eq!(v["coins"]["BTC"]["market_cap"], serde_json::Value::Null);
    }
}
