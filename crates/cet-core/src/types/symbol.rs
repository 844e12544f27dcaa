//! Tracked symbol descriptors.
//!
//! A descriptor ties an exchange-native symbol (what goes on the wire, e.g.
//! `btcusd`, `XBT/USD`, `BTC-USD`) to the canonical ticker/market pair it
//! stands for.

/// One exchange-native symbol and the canonical pair behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolDescriptor {
    /// Wire symbol as the exchange spells it.
    pub native: String,
    /// Canonical base ticker (post alias resolution).
    pub ticker: String,
    /// Quote currency code.
    pub market: String,
}

impl SymbolDescriptor {
    pub fn new(
        native: impl Into<String>,
        ticker: impl Into<String>,
        market: impl Into<String>,
    ) -> Self {
        Self { native: native.into(), ticker: ticker.into(), market: market.into() }
    }
}

/// Split a `BASE<sep>QUOTE` pair such as `XBT/USD` or `BTC-USD`.
///
/// Returns `None` when the separator is missing or either side is empty.
#[inline]
pub fn split_pair(pair: &str, sep: char) -> Option<(&str, &str)> {
    let (base, quote) = pair.split_once(sep)?;
    if base.is_empty() || quote.is_empty() {
        return None;
    }
    Some((base, quote))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_slash_and_dash() {
        assert_eq!(split_pair("XBT/USD", '/'), Some(("XBT", "USD")));
        assert_eq!(split_pair("BTC-USD", '-'), Some(("BTC", "USD")));
    }

    #[test]
    fn split_rejects_malformed() {
        assert_eq!(split_pair("BTCUSD", '-'), None);
        assert_eq!(split_pair("-USD", '-'), None);
        assert_eq!(split_pair("BTC-", '-'), None);
    }
}
