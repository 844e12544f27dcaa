//! Bittrex endpoint and supported coins.
//!
//! `QuerySummaryState` returns every market at once, so there is no per-pair
//! subscription list; the coin table does all the filtering.

pub const EXCHANGE: &str = "bittrex";

/// SignalR base; `negotiate` and `connect` are appended.
pub const SIGNALR_URL: &str = "https://socket.bittrex.com/signalr";

pub const COINS: &[(&str, &str)] = &[
    ("ADA", "Cardano"),
    ("BCH", "Bitcoin Cash"),
    ("BSV", "Bitcoin SV"),
    ("BTC", "Bitcoin"),
    ("DGB", "DigiByte"),
    ("ETC", "Ethereum Classic"),
    ("ETH", "Ethereum"),
    ("LTC", "Litecoin"),
    ("SC", "Siacoin"),
    ("TRX", "TRON"),
    ("TUSD", "TrueUSD"),
    ("USDT", "Tether"),
    ("XRP", "Ripple"),
    ("ZEC", "Zcash"),
];
