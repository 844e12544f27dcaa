//! Glue between a reconnecting WebSocket and the ingestion sink.
//!
//! The exchange supplies a frame decoder; this module turns decoded payloads
//! into quotes and forwards them in arrival order. Decode failures drop the
//! frame and keep the connection; a [`Decoded::Fault`] closes it.

use std::sync::Arc;

use cet_core::error::CetError;
use cet_core::shutdown::ShutdownSignal;
use cet_core::sink::QuoteSender;
use cet_core::types::CoinTable;
use cet_core::ws::{Dispatch, Frame, OnFrameCallback, WsConnConfig, WsConnection};
use tracing::{trace, warn};

use crate::payload::Decoded;

/// Parameters for one stream connector.
pub struct StreamParams<D> {
    pub config: WsConnConfig,
    pub table: Arc<CoinTable>,
    pub decode: D,
    pub sink: QuoteSender,
}

/// Build the frame callback: decode, normalize, forward.
pub fn frame_handler<D>(
    label: String,
    table: Arc<CoinTable>,
    decode: D,
    sink: QuoteSender,
) -> OnFrameCallback
where
    D: Fn(Frame<'_>) -> Result<Decoded, CetError> + Send + Sync + 'static,
{
    Arc::new(move |frame: Frame<'_>| match decode(frame) {
        Ok(Decoded::Payload(raw)) => {
            let quotes = raw.normalize(&table);
            if quotes.is_empty() {
                trace!("[{label}] payload carried no tracked quote");
            }
            for quote in quotes {
                sink.send(quote);
            }
            Dispatch::Continue
        }
        Ok(Decoded::Ignore) => Dispatch::Continue,
        Ok(Decoded::Fault(reason)) => Dispatch::Close(reason),
        Err(e) => {
            warn!("[{label}] dropped frame: {e}");
            Dispatch::Continue
        }
    })
}

/// Run a stream connection until `shutdown` fires, then close it.
pub async fn run_stream<D>(params: StreamParams<D>, mut shutdown: ShutdownSignal)
where
    D: Fn(Frame<'_>) -> Result<Decoded, CetError> + Send + Sync + 'static,
{
    let StreamParams { config, table, decode, sink } = params;

    let on_frame = frame_handler(config.label.clone(), table, decode, sink);
    let mut conn = WsConnection::new(config);
    conn.start(on_frame);
    shutdown.wait().await;
    conn.stop().await;
}

#[cfg(test)]
mod tests {
    use cet_core::sink::{SinkRecord, quote_channel};
    use serde_json::Value;
    use tokio::sync::mpsc::UnboundedReceiver;

    use super::*;
    use crate::payload::RawPayload;

    fn decode(frame: Frame<'_>) -> Result<Decoded, CetError> {
        let Frame::Text(text) = frame else { return Ok(Decoded::Ignore) };
        let v: Value = serde_json::from_str(text).map_err(|e| CetError::Decode(e.to_string()))?;
        if v.get("error").is_some() {
            return Ok(Decoded::Fault("exchange error".into()));
        }
        Ok(Decoded::Payload(RawPayload::Coinbase(v)))
    }

    fn handler() -> (OnFrameCallback, UnboundedReceiver<SinkRecord>) {
        let (tx, rx) = quote_channel();
        let table = Arc::new(CoinTable::new("coinbase", "USD").with_coins([("BTC", "Bitcoin")]));
        (frame_handler("coinbase".into(), table, decode, QuoteSender::new("coinbase", tx)), rx)
    }

    #[test]
    fn missing_field_produces_nothing_and_keeps_connection() {
        let (on_frame, mut rx) = handler();
        let frame = r#"{"type":"ticker","product_id":"BTC-USD","price":"100","volume_24h":"1"}"#;
        assert_eq!(on_frame(Frame::Text(frame)), Dispatch::Continue);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn malformed_json_is_dropped() {
        let (on_frame, mut rx) = handler();
        assert_eq!(on_frame(Frame::Text("{\"type\":")), Dispatch::Continue);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn valid_frame_is_forwarded() {
        let (on_frame, mut rx) = handler();
        let frame = r#"{"type":"ticker","product_id":"BTC-USD","price":"100","open_24h":"90",
            "volume_24h":"1.5"}"#;
        assert_eq!(on_frame(Frame::Text(frame)), Dispatch::Continue);
        let rec = rx.try_recv().unwrap();
        assert_eq!(&*rec.exchange, "coinbase");
        assert_eq!(rec.quote.price(), 100.0);
        assert_eq!(rec.quote.volume24h(), 1.5);
    }

    #[test]
    fn fault_closes_connection() {
        let (on_frame, _rx) = handler();
        let dispatch = on_frame(Frame::Text(r#"{"error":"boom"}"#));
        assert_eq!(dispatch, Dispatch::Close("exchange error".into()));
    }

    #[test]
    fn binary_frames_are_ignored() {
        let (on_frame, mut rx) = handler();
        assert_eq!(on_frame(Frame::Binary(&[1, 2, 3])), Dispatch::Continue);
        assert!(rx.try_recv().is_err());
    }
}
