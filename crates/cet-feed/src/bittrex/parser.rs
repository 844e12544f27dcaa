//! Bittrex hub frame decoding and summary normalization.
//!
//! Each `QuerySummaryState` reply inflates to
//! `{"N": nonce, "s": [{"M": "USD-BTC", "l": last, "m": volume, "PD": prev day, ...}]}`.
//! Market names put the quote currency first.

use cet_core::error::CetError;
use cet_core::types::{CoinTable, Quote, split_pair};
use cet_core::ws::Frame;
use serde_json::Value;
use tracing::trace;

use super::signalr;
use crate::json_util::{parse_f64_field, round_volume};
use crate::payload::{Decoded, RawPayload};

/// Decode one hub frame.
///
/// An invocation error (`E`) faults the connection; a string result (`R`)
/// is unwrapped into the summary body. Everything else is transport noise.
pub fn decode(frame: Frame<'_>) -> Result<Decoded, CetError> {
    let Frame::Text(text) = frame else {
        return Ok(Decoded::Ignore);
    };
    let v: Value =
        serde_json::from_str(text).map_err(|e| CetError::Decode(format!("bittrex: {e}")))?;

    if let Some(err) = v.get("E") {
        let id = v.get("I").unwrap_or(&Value::Null);
        return Ok(Decoded::Fault(format!("invocation {id} failed: {err}")));
    }
    match v.get("R") {
        Some(Value::String(b64)) => {
            Ok(Decoded::Payload(RawPayload::Bittrex(signalr::inflate_json(b64)?)))
        }
        _ => {
            trace!("[bittrex] control frame: {text}");
            Ok(Decoded::Ignore)
        }
    }
}

/// Every tracked quote in a summary body.
pub fn normalize(v: &Value, table: &CoinTable) -> Vec<Quote> {
    let Some(summaries) = v.get("s").and_then(Value::as_array) else {
        return Vec::new();
    };
    summaries.iter().filter_map(|s| normalize_summary(s, table)).collect()
}

fn normalize_summary(s: &Value, table: &CoinTable) -> Option<Quote> {
    let name = s.get("M")?.as_str()?;
    let (market, native) = split_pair(name, '-')?;
    let ticker = table.accept(native, market)?;

    let price = parse_f64_field(s, "l")?;
    let open = parse_f64_field(s, "PD")?;
    let volume = parse_f64_field(s, "m")?;
    parse_f64_field(s, "V")?;
    Quote::new(ticker, market, price, Some(open), round_volume(volume))
}
