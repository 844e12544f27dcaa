//! Connector registry — factory for creating connectors from config.

use anyhow::{Result, anyhow};
use cet_core::config::ExchangeConfig;
use cet_core::types::CoinTable;

use crate::Connector;
use crate::bitstamp::BitstampConnector;
use crate::bittrex::BittrexConnector;
use crate::coinbase::CoinbaseConnector;
use crate::kraken::KrakenConnector;

/// Exchanges this crate has connectors for.
pub const SUPPORTED_EXCHANGES: &[&str] = &["bitstamp", "bittrex", "coinbase", "kraken"];

/// Create a `Connector` based on the `exchange` field in the config.
pub fn create_connector(config: &ExchangeConfig) -> Result<Box<dyn Connector>> {
    let exchange = config.exchange.to_lowercase();

    let connector: Box<dyn Connector> = match exchange.as_str() {
        "bitstamp" => Box::new(BitstampConnector::from_config(config)?),
        "bittrex" => Box::new(BittrexConnector::from_config(config)?),
        "coinbase" => Box::new(CoinbaseConnector::from_config(config)?),
        "kraken" => Box::new(KrakenConnector::from_config(config)?),
        other => return Err(anyhow!("Unknown exchange: {other}")),
    };
    Ok(connector)
}

/// Coin table for `exchange`: built-in coins unless the config overrides
/// them, plus the exchange's aliases and the configured market.
pub(crate) fn coin_table(
    config: &ExchangeConfig,
    exchange: &str,
    default_coins: &[(&str, &str)],
    aliases: &[(&str, &str)],
) -> CoinTable {
    let mut table = CoinTable::new(exchange, config.effective_market())
        .with_coins(default_coins.iter().copied())
        .with_aliases(aliases.iter().copied());
    if let Some(ref coins) = config.coins {
        table.replace_coins(coins.clone());
    }
    table
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn creates_every_supported_exchange() {
        for name in SUPPORTED_EXCHANGES {
            let conn = create_connector(&ExchangeConfig::named(name)).unwrap();
            assert_eq!(conn.exchange(), *name);
            assert_eq!(conn.coin_table().exchange(), *name);
            assert_eq!(conn.coin_table().market(), "USD");
            assert!(!conn.coin_table().is_empty());
        }
    }

    #[test]
    fn name_is_case_insensitive() {
        let connector = create_connector(&ExchangeConfig::named("Kraken")).unwrap();
        assert_eq!(connector.exchange(), "kraken");
    }

    #[test]
    fn unknown_exchange_fails() {
        let err = create_connector(&ExchangeConfig::named("mtgox")).err().unwrap();
        assert!(err.to_string().contains("mtgox"));
    }

    #[test]
    fn config_overrides_coins_and_market() {
        let mut cfg = ExchangeConfig::named("kraken");
        cfg.market = Some("EUR".into());
        cfg.coins = Some(BTreeMap::from([("BTC".to_string(), "Bitcoin".to_string())]));
        let table = coin_table(&cfg, "kraken", &[("ETH", "Ethereum")], &[("XBT", "BTC")]);
        assert_eq!(table.market(), "EUR");
        assert_eq!(table.len(), 1);
        assert_eq!(table.accept("XBT", "EUR").as_deref(), Some("BTC"));
        assert!(table.accept("ETH", "EUR").is_none());
    }
}
