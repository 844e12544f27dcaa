//! Kraken tracked pairs, supported coins, and native-code aliases.

pub const EXCHANGE: &str = "kraken";

pub const WS_URL: &str = "wss://ws.kraken.com";

/// `reqid` echoed back in the subscription acknowledgement.
pub const SUBSCRIBE_REQID: u64 = 123_456_789;

/// Kraken spells a few assets differently from everyone else.
pub const ALIASES: &[(&str, &str)] = &[("XBT", "BTC"), ("XDG", "DOGE"), ("STR", "XLM")];

pub const PAIRS: &[&str] = &[
    "ADA/USD", "ATOM/USD", "BAT/USD", "BCH/USD", "BTC/USD", "DAI/USD", "DASH/USD", "EOS/USD",
    "ETC/USD", "ETH/USD", "GNO/USD", "ICX/USD", "LINK/USD", "LTC/USD", "QTUM/USD", "REP/USD",
    "SC/USD", "STR/USD", "USDT/USD", "WAVES/USD", "XBT/USD", "XLM/USD", "XMR/USD", "XRP/USD",
    "XTZ/USD", "ZEC/USD",
];

pub const COINS: &[(&str, &str)] = &[
    ("ADA", "Cardano"),
    ("ATOM", "Cosmos"),
    ("BAT", "Basic Attention Token"),
    ("BCH", "Bitcoin Cash"),
    ("BTC", "Bitcoin"),
    ("DAI", "Dai"),
    ("DASH", "Dash"),
    ("EOS", "EOS"),
    ("ETC", "Ethereum Classic"),
    ("ETH", "Ethereum"),
    ("GNO", "Gnosis"),
    ("ICX", "ICON"),
    ("LINK", "Chainlink"),
    ("LTC", "Litecoin"),
    ("QTUM", "Qtum"),
    ("REP", "Augur"),
    ("SC", "Siacoin"),
    ("USDT", "Tether"),
    ("WAVES", "Waves"),
    ("XLM", "Stellar"),
    ("XMR", "Monero"),
    ("XRP", "Ripple"),
    ("XTZ", "Tezos"),
    ("ZEC", "Zcash"),
];
