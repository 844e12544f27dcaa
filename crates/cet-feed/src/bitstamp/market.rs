//! Bitstamp tracked pairs and supported coins.

use cet_core::types::SymbolDescriptor;

pub const EXCHANGE: &str = "bitstamp";

/// REST ticker endpoint; the pair is appended as a path segment.
pub const TICKER_URL: &str = "https://www.bitstamp.net/api/v2/ticker";

pub const PAIRS: &[&str] = &["btcusd", "ethusd", "ltcusd", "xrpusd", "bchusd"];

pub const COINS: &[(&str, &str)] = &[
    ("BCH", "Bitcoin Cash"),
    ("BTC", "Bitcoin"),
    ("ETH", "Ethereum"),
    ("LTC", "Litecoin"),
    ("XRP", "Ripple"),
];

/// Turn a Bitstamp pair (`btcusd`) into a descriptor (`BTC`/`USD`).
///
/// Bitstamp quote currencies are always three letters.
pub fn descriptor(pair: &str) -> Option<SymbolDescriptor> {
    let pair = pair.trim().to_ascii_lowercase();
    if pair.len() <= 3 || !pair.is_ascii() {
        return None;
    }
    let (base, quote) = pair.split_at(pair.len() - 3);
    Some(SymbolDescriptor::new(pair.clone(), base.to_ascii_uppercase(), quote.to_ascii_uppercase()))
}
