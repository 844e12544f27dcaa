//! Coinbase tracked products and supported coins.

pub const EXCHANGE: &str = "coinbase";

pub const WS_URL: &str = "wss://ws-feed.exchange.coinbase.com";

pub const PRODUCTS: &[&str] = &[
    "ALGO-USD", "BCH-USD", "BTC-USD", "DASH-USD", "EOS-USD", "ETC-USD", "ETH-USD", "LINK-USD",
    "LTC-USD", "REP-USD", "XLM-USD", "XRP-USD", "XTZ-USD", "ZRX-USD",
];

pub const COINS: &[(&str, &str)] = &[
    ("ALGO", "Algorand"),
    ("BCH", "Bitcoin Cash"),
    ("BTC", "Bitcoin"),
    ("DASH", "Dash"),
    ("EOS", "EOS"),
    ("ETC", "Ethereum Classic"),
    ("ETH", "Ethereum"),
    ("LINK", "Chainlink"),
    ("LTC", "Litecoin"),
    ("REP", "Augur"),
    ("XLM", "Stellar"),
    ("XRP", "Ripple"),
    ("XTZ", "Tezos"),
    ("ZRX", "0x"),
];
