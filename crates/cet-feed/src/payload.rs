//! Raw exchange payloads and their normalization into [`Quote`]s.
//!
//! Every connector wraps what it received in its own [`RawPayload`] variant;
//! the variant picks the decoder. Normalization is pure: no I/O, no errors,
//! a rejected payload simply yields no quotes.

use cet_core::types::{CoinTable, Quote, SymbolDescriptor};
use serde_json::Value;

use crate::{bitstamp, bittrex, coinbase, kraken};

/// One received payload, already parsed into JSON, tagged by source.
#[derive(Debug, Clone)]
pub enum RawPayload {
    /// REST ticker body for one requested pair.
    Bitstamp { symbol: SymbolDescriptor, body: Value },
    /// Positional ticker array `[chanId, {...}, "ticker", "XBT/USD"]`.
    Kraken(Value),
    /// `type: "ticker"` object.
    Coinbase(Value),
    /// Inflated `QuerySummaryState` body `{"s": [...]}`.
    Bittrex(Value),
}

impl RawPayload {
    /// Validate against `table` and build every quote this payload carries.
    pub fn normalize(&self, table: &CoinTable) -> Vec<Quote> {
        match self {
            Self::Bitstamp { symbol, body } => {
                bitstamp::parser::normalize(symbol, body, table).into_iter().collect()
            }
            Self::Kraken(v) => kraken::parser::normalize(v, table).into_iter().collect(),
            Self::Coinbase(v) => coinbase::parser::normalize(v, table).into_iter().collect(),
            Self::Bittrex(v) => bittrex::parser::normalize(v, table),
        }
    }

    pub fn source(&self) -> &'static str {
        match self {
            Self::Bitstamp { .. } => "bitstamp",
            Self::Kraken(_) => "kraken",
            Self::Coinbase(_) => "coinbase",
            Self::Bittrex(_) => "bittrex",
        }
    }
}

/// Result of decoding one stream frame.
#[derive(Debug, Clone)]
pub enum Decoded {
    /// A candidate quote payload.
    Payload(RawPayload),
    /// Control traffic: acks, heartbeats, status events.
    Ignore,
    /// The exchange reported a failure that must drop the connection.
    Fault(String),
}
