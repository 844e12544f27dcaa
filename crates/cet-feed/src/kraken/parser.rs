//! Kraken WebSocket ticker parser.
//!
//! Ticker updates arrive as positional arrays:
//!
//! ```text
//! [channelID, {"c": [price, lot], "v": [today, 24h], "o": [today, 24h], ...}, "ticker", "XBT/USD"]
//! ```
//!
//! Everything sent as a JSON object (`heartbeat`, `systemStatus`,
//! `subscriptionStatus`) is control traffic.

use cet_core::error::CetError;
use cet_core::types::{CoinTable, Quote, split_pair};
use cet_core::ws::Frame;
use serde_json::Value;
use tracing::{debug, warn};

use super::market::SUBSCRIBE_REQID;
use crate::json_util::{parse_f64_at, round_volume};
use crate::payload::{Decoded, RawPayload};

/// Build the ticker subscription for `pairs`.
pub fn build_subscribe(pairs: &[String]) -> String {
    serde_json::json!({
        "event": "subscribe",
        "reqid": SUBSCRIBE_REQID,
        "pair": pairs,
        "subscription": { "name": "ticker" }
    })
    .to_string()
}

/// Decode one frame into a payload candidate.
pub fn decode(frame: Frame<'_>) -> Result<Decoded, CetError> {
    let Frame::Text(text) = frame else {
        return Ok(Decoded::Ignore);
    };
    let v: Value =
        serde_json::from_str(text).map_err(|e| CetError::Decode(format!("kraken: {e}")))?;
    if v.is_array() {
        return Ok(Decoded::Payload(RawPayload::Kraken(v)));
    }

    match v.get("event").and_then(Value::as_str) {
        Some("heartbeat") => {}
        Some("subscriptionStatus") if v.get("status").and_then(Value::as_str) == Some("error") => {
            let reason = v.get("errorMessage").unwrap_or(&Value::Null);
            warn!("[kraken] subscription rejected: {reason}");
        }
        Some(event) => debug!("[kraken] event {event}"),
        None => debug!("[kraken] unrecognized message: {text}"),
    }
    Ok(Decoded::Ignore)
}

/// Validate a ticker array.
pub fn normalize(v: &Value, table: &CoinTable) -> Option<Quote> {
    let arr = v.as_array()?;
    if arr.len() < 4 {
        return None;
    }
    let data = arr.get(1).filter(|d| d.is_object())?;
    let pair = arr.get(3)?.as_str()?;

    let (native, market) = split_pair(pair, '/')?;
    let ticker = table.accept(native, market)?;

    let price = parse_f64_at(data, "c", 0)?;
    let open = parse_f64_at(data, "o", 1)?;
    let volume = parse_f64_at(data, "v", 1)?;
    Quote::new(ticker, market, price, Some(open), round_volume(volume))
}
