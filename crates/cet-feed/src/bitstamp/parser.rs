//! Bitstamp REST ticker parser.
//!
//! Body shape (only the used keys):
//! `{"last": "100.00", "open": "90.00", "volume": "5.7", ...}`

use cet_core::types::{CoinTable, Quote, SymbolDescriptor};
use serde_json::Value;

use crate::json_util::{parse_f64_field, round_volume};

/// Ticker URL for one pair.
pub fn ticker_url(base: &str, pair: &str) -> String {
    format!("{}/{pair}/", base.trim_end_matches('/'))
}

/// Validate a ticker body fetched for `symbol`.
pub fn normalize(symbol: &SymbolDescriptor, body: &Value, table: &CoinTable) -> Option<Quote> {
    let ticker = table.accept(&symbol.ticker, &symbol.market)?;
    let price = parse_f64_field(body, "last")?;
    let volume = parse_f64_field(body, "volume")?;
    let open = parse_f64_field(body, "open")?;
    Quote::new(ticker, symbol.market.as_str(), price, Some(open), round_volume(volume))
}
