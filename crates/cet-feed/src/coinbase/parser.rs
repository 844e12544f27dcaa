//! Coinbase exchange feed ticker parser.

use cet_core::error::CetError;
use cet_core::types::{CoinTable, Quote, split_pair};
use cet_core::ws::Frame;
use serde_json::Value;
use tracing::{debug, warn};

use crate::json_util::parse_f64_field;
use crate::payload::{Decoded, RawPayload};

/// Build the ticker-channel subscription for `product_ids`.
pub fn build_subscribe(product_ids: &[String]) -> String {
    serde_json::json!({
        "type": "subscribe",
        "channels": [{ "name": "ticker", "product_ids": product_ids }]
    })
    .to_string()
}

pub fn decode(frame: Frame<'_>) -> Result<Decoded, CetError> {
    let Frame::Text(text) = frame else {
        return Ok(Decoded::Ignore);
    };
    let v: Value =
        serde_json::from_str(text).map_err(|e| CetError::Decode(format!("coinbase: {e}")))?;
    match v.get("type").and_then(Value::as_str) {
        Some("ticker") => Ok(Decoded::Payload(RawPayload::Coinbase(v))),
        Some("error") => {
            warn!("[coinbase] feed error: {}", v.get("message").unwrap_or(&serde_json::Value::Null));
            Ok(Decoded::Ignore)
        }
        other => {
            debug!("[coinbase] skipping message type {other:?}");
            Ok(Decoded::Ignore)
        }
    }
}

/// Validate a `ticker` message. Volume is kept as reported.
pub fn normalize(v: &Value, table: &CoinTable) -> Option<Quote> {
    if v.get("type").and_then(Value::as_str) != Some("ticker") {
        return None;
    }
    let product_id = v.get("product_id")?.as_str()?;
    let (native, market) = split_pair(product_id, '-')?;
    let ticker = table.accept(native, market)?;

    let price = parse_f64_field(v, "price")?;
    let open = parse_f64_field(v, "open_24h")?;
    let volume = parse_f64_field(v, "volume_24h")?;
    Quote::new(ticker, market, price, Some(open), volume)
}
