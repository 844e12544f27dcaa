//! Minimal SignalR (ASP.NET, protocol 1.5) client pieces for the `c2` hub.
//!
//! ```text
//! GET  {base}/negotiate?clientProtocol=1.5&connectionData=[{"name":"c2"}]  -> ConnectionToken
//! WSS  {base}/connect?transport=webSockets&clientProtocol=1.5
//!          &connectionToken=..&connectionData=..&tid=10
//! send {"H":"c2","M":"QuerySummaryState","A":[],"I":n}
//! recv {"R":"<base64 raw deflate>","I":"n"}  |  {"E":"...","I":"n"}
//! ```

use std::io::Read;

use anyhow::{Context, Result, anyhow};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use cet_core::error::CetError;
use flate2::read::DeflateDecoder;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

pub const HUB: &str = "c2";
pub const CLIENT_PROTOCOL: &str = "1.5";
pub const QUERY_SUMMARY_STATE: &str = "QuerySummaryState";

#[derive(Debug, Deserialize)]
struct NegotiateResponse {
    #[serde(rename = "ConnectionToken")]
    connection_token: String,
}

/// `[{"name":"c2"}]`
pub fn connection_data() -> String {
    serde_json::json!([{ "name": HUB }]).to_string()
}

pub fn negotiate_url(base: &str) -> Result<Url> {
    let url = Url::parse_with_params(
        &format!("{}/negotiate", base.trim_end_matches('/')),
        &[("clientProtocol", CLIENT_PROTOCOL), ("connectionData", connection_data().as_str())],
    )?;
    Ok(url)
}

/// Fetch a fresh connection token.
pub async fn negotiate(client: &reqwest::Client, base: &str) -> Result<String> {
    let url = negotiate_url(base)?;
    let resp = client.get(url).send().await.map_err(|e| CetError::Http(format!("negotiate: {e}")))?;
    let status = resp.status();
    if !status.is_success() {
        return Err(CetError::Http(format!("negotiate returned {status}")).into());
    }
    let body: NegotiateResponse =
        resp.json().await.context("negotiate response missing ConnectionToken")?;
    Ok(body.connection_token)
}

/// WebSocket URL for `token`; `http(s)` bases become `ws(s)`.
pub fn connect_url(base: &str, token: &str) -> Result<String> {
    let data = connection_data();
    let mut url = Url::parse_with_params(
        &format!("{}/connect", base.trim_end_matches('/')),
        &[
            ("transport", "webSockets"),
            ("clientProtocol", CLIENT_PROTOCOL),
            ("connectionToken", token),
            ("connectionData", data.as_str()),
            ("tid", "10"),
        ],
    )?;
    let scheme = match url.scheme() {
        "https" | "wss" => "wss",
        "http" | "ws" => "ws",
        other => return Err(anyhow!("unsupported scheme {other}")),
    };
    url.set_scheme(scheme).map_err(|_| anyhow!("cannot switch {base} to {scheme}"))?;
    Ok(url.into())
}

/// Hub invocation for the summary poll.
pub fn query_summary_state(id: u64) -> String {
    serde_json::json!({ "H": HUB, "M": QUERY_SUMMARY_STATE, "A": [], "I": id }).to_string()
}

/// Decode a base64 raw-deflate JSON body.
pub fn inflate_json(b64: &str) -> Result<Value, CetError> {
    let compressed = STANDARD.decode(b64).map_err(|e| CetError::Decode(format!("base64: {e}")))?;
    let mut inflated = Vec::new();
    DeflateDecoder::new(compressed.as_slice())
        .read_to_end(&mut inflated)
        .map_err(|e| CetError::Decode(format!("inflate: {e}")))?;
    serde_json::from_slice(&inflated).map_err(|e| CetError::Decode(format!("summary json: {e}")))
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::Write;

    use flate2::Compression;
    use flate2::write::DeflateEncoder;

    use super::*;

    /// Compress and encode `json` the way the hub does.
    pub(crate) fn deflate_b64(json: &str) -> String {
        let mut enc = DeflateEncoder::new(Vec::new(), Compression::default());
        enc.write_all(json.as_bytes()).unwrap();
        STANDARD.encode(enc.finish().unwrap())
    }

    #[test]
    fn negotiate_query() {
        let url = negotiate_url("https://socket.bittrex.com/signalr").unwrap();
        assert_eq!(url.path(), "/signalr/negotiate");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs[0], ("clientProtocol".into(), "1.5".into()));
        assert_eq!(pairs[1], ("connectionData".into(), r#"[{"name":"c2"}]"#.into()));
    }

    #[test]
    fn connect_url_switches_scheme_and_encodes_token() {
        let url = connect_url("https://socket.bittrex.com/signalr/", "a+b/c=").unwrap();
        assert!(url.starts_with("wss://socket.bittrex.com/signalr/connect?transport=webSockets"));
        let parsed = Url::parse(&url).unwrap();
        let (_, token) = parsed.query_pairs().find(|(k, _)| k == "connectionToken").unwrap();
        assert_eq!(token, "a+b/c=");
        assert!(url.ends_with("tid=10"));

        let plain = connect_url("http://127.0.0.1:8080/signalr", "t").unwrap();
        assert!(plain.starts_with("ws://127.0.0.1:8080/"));
        assert!(connect_url("ftp://x/signalr", "t").is_err());
    }

    #[test]
    fn invocation_shape() {
        let v: Value = serde_json::from_str(&query_summary_state(7)).unwrap();
        assert_eq!(v, serde_json::json!({"H": "c2", "M": "QuerySummaryState", "A": [], "I": 7}));
    }

    #[test]
    fn inflate_round_trip_and_errors() {
        let v = inflate_json(&deflate_b64(r#"{"s":[]}"#)).unwrap();
        assert_eq!(v, serde_json::json!({"s": []}));
        assert!(matches!(inflate_json("***"), Err(CetError::Decode(_))));
        assert!(matches!(inflate_json(&STANDARD.encode(b"not deflate")), Err(CetError::Decode(_))));
    }
}
