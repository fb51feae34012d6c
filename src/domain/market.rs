//! Market: one tradable instrument, spot pair or derivative contract.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

use crate::error::PreciseError;
use crate::shared::precision::{to_precision, Rounding};
use crate::shared::{MarketType, PrecisionMode};

/// Lower and upper bound. `None` means unknown; zero is a real bound.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MinMax {
    pub min: Option<Decimal>,
    pub max: Option<Decimal>,
}

impl MinMax {
    pub fn new(min: Option<Decimal>, max: Option<Decimal>) -> Self {
        Self { min, max }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketLimits {
    pub amount: MinMax,
    pub price: MinMax,
    pub cost: MinMax,
    pub leverage: MinMax,
}

/// Digit counts or tick sizes, depending on the adapter's precision mode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketPrecision {
    pub amount: Option<Decimal>,
    pub price: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Market {
    /// Exchange-native symbol.
    pub id: String,
    /// `BASE/QUOTE`, or `BASE/QUOTE:SETTLE` for settled contracts.
    pub symbol: String,
    pub base: String,
    pub quote: String,
    pub settle: Option<String>,
    pub base_id: String,
    pub quote_id: String,
    pub settle_id: Option<String>,
    #[serde(rename = "type")]
    pub market_type: MarketType,
    pub spot: bool,
    pub margin: bool,
    pub swap: bool,
    pub future: bool,
    pub option: bool,
    pub contract: bool,
    pub linear: Option<bool>,
    pub inverse: Option<bool>,
    pub active: bool,
    pub contract_size: Option<Decimal>,
    pub expiry: Option<i64>,
    pub taker: Option<Decimal>,
    pub maker: Option<Decimal>,
    pub precision: MarketPrecision,
    pub limits: MarketLimits,
    pub created: Option<i64>,
    pub info: Value,
}

impl Market {
    /// Canonical symbol for a `(base, quote, settle, type)` tuple.
    pub fn symbol_for(base: &str, quote: &str, settle: Option<&str>, market_type: MarketType) -> String {
        match (market_type, settle) {
            (MarketType::Spot, _) | (_, None) => format!("{}/{}", base, quote),
            (_, Some(settle)) => format!("{}/{}:{}", base, quote, settle),
        }
    }

    /// Derive the type flags and symbol from the identifying fields.
    ///
    /// A market whose base or quote is empty keeps its id as symbol and is
    /// marked inactive instead of being dropped.
    pub fn complete(mut self) -> Self {
        self.spot = self.market_type == MarketType::Spot;
        self.swap = self.market_type == MarketType::Swap;
        self.future = self.market_type == MarketType::Future;
        self.option = self.market_type == MarketType::Option;
        self.contract = self.market_type.is_contract();

        if self.base.is_empty() || self.quote.is_empty() {
            tracing::warn!(id = %self.id, "cannot derive symbol, keeping market inactive");
            self.active = false;
            if self.symbol.is_empty() {
                self.symbol = self.id.clone();
            }
            return self;
        }

        let mut symbol = Self::symbol_for(
            &self.base,
            &self.quote,
            self.settle.as_deref(),
            self.market_type,
        );
        if self.future {
            if let Some(expiry) = self.expiry.and_then(DateTime::<Utc>::from_timestamp_millis) {
                symbol = format!("{}-{}", symbol, expiry.format("%y%m%d"));
            }
        }
        self.symbol = symbol;

        if self.contract {
            if let Some(settle) = self.settle.as_deref() {
                self.linear.get_or_insert(settle == self.quote);
                self.inverse.get_or_insert(settle == self.base);
            }
        }
        self
    }

    /// Truncate an order amount to this market's precision.
    pub fn amount_to_precision(&self, amount: Decimal, mode: PrecisionMode) -> Result<Decimal, PreciseError> {
        match self.precision.amount {
            Some(precision) => to_precision(amount, precision, mode, Rounding::Truncate),
            None => Ok(amount),
        }
    }

    /// Round an order price to this market's precision.
    pub fn price_to_precision(&self, price: Decimal, mode: PrecisionMode) -> Result<Decimal, PreciseError> {
        match self.precision.price {
            Some(precision) => to_precision(price, precision, mode, Rounding::Round),
            None => Ok(price),
        }
    }
}

// ─── Index ───────────────────────────────────────────────────────────────────

/// Loaded markets, addressable by unified symbol or exchange id.
#[derive(Debug, Clone, Default)]
pub struct MarketIndex {
    by_symbol: BTreeMap<String, Market>,
    symbol_by_id: HashMap<String, String>,
}

impl MarketIndex {
    pub fn new(markets: Vec<Market>) -> Self {
        let mut index = Self::default();
        for market in markets {
            index
                .symbol_by_id
                .entry(market.id.clone())
                .or_insert_with(|| market.symbol.clone());
            index.by_symbol.insert(market.symbol.clone(), market);
        }
        index
    }

    pub fn market(&self, symbol: &str) -> Option<&Market> {
        self.by_symbol.get(symbol)
    }

    pub fn by_id(&self, id: &str) -> Option<&Market> {
        self.by_symbol.get(self.symbol_by_id.get(id)?)
    }

    /// Look up by symbol first, then by exchange id.
    pub fn resolve(&self, symbol_or_id: &str) -> Option<&Market> {
        self.market(symbol_or_id).or_else(|| self.by_id(symbol_or_id))
    }

    /// Unified symbol for a raw market id.
    ///
    /// Unknown ids are split on `delimiter` into an uppercase `BASE/QUOTE`;
    /// without a delimiter the id is returned as is.
    pub fn safe_symbol(&self, id: Option<&str>, delimiter: Option<&str>) -> Option<String> {
        let id = id?;
        if let Some(market) = self.by_id(id) {
            return Some(market.symbol.clone());
        }
        if let Some((base, quote)) = delimiter.and_then(|d| id.split_once(d)) {
            return Some(format!("{}/{}", base.to_uppercase(), quote.to_uppercase()));
        }
        Some(id.to_string())
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.by_symbol.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Market> {
        self.by_symbol.values()
    }

    pub fn len(&self) -> usize {
        self.by_symbol.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_symbol.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn spot(id: &str, base: &str, quote: &str) -> Market {
        Market {
            id: id.into(),
            base: base.into(),
            quote: quote.into(),
            active: true,
            ..Default::default()
        }
        .complete()
    }

    #[test]
    fn test_spot_symbol() {
        let market = spot("BTC_USDT", "BTC", "USDT");
        assert_eq!(market.symbol, "BTC/USDT");
        assert!(market.spot);
        assert!(!market.contract);
    }

    #[test]
    fn test_linear_swap_symbol() {
        let market = Market {
            id: "ETH-USDT".into(),
            base: "ETH".into(),
            quote: "USDT".into(),
            settle: Some("USDT".into()),
            market_type: MarketType::Swap,
            active: true,
            ..Default::default()
        }
        .complete();
        assert_eq!(market.symbol, "ETH/USDT:USDT");
        assert!(market.swap && market.contract);
        assert_eq!(market.linear, Some(true));
        assert_eq!(market.inverse, Some(false));
    }

    #[test]
    fn test_future_symbol_carries_expiry() {
        let market = Market {
            id: "BTC-USDT-240628".into(),
            base: "BTC".into(),
            quote: "USDT".into(),
            settle: Some("USDT".into()),
            market_type: MarketType::Future,
            expiry: Some(1719561600000),
            ..Default::default()
        }
        .complete();
        assert_eq!(market.symbol, "BTC/USDT:USDT-240628");
    }

    #[test]
    fn test_malformed_market_kept_inactive() {
        let market = Market {
            id: "weird".into(),
            quote: "USDT".into(),
            active: true,
            ..Default::default()
        }
        .complete();
        assert!(!market.active);
        assert_eq!(market.symbol, "weird");
    }

    #[test]
    fn test_amount_and_price_to_precision() {
        let mut market = spot("BTC_USDT", "BTC", "USDT");
        market.precision.amount = Some(dec("0.001"));
        market.precision.price = Some(dec("0.5"));
        assert_eq!(
            market.amount_to_precision(dec("1.23456"), PrecisionMode::TickSize).unwrap(),
            dec("1.234")
        );
        assert_eq!(
            market.price_to_precision(dec("100.3"), PrecisionMode::TickSize).unwrap(),
            dec("100.5")
        );
    }

    #[test]
    fn test_index_resolves_symbol_and_id() {
        let index = MarketIndex::new(vec![spot("btc_usdt", "BTC", "USDT")]);
        assert_eq!(index.resolve("BTC/USDT").map(|m| m.id.as_str()), Some("btc_usdt"));
        assert_eq!(index.resolve("btc_usdt").map(|m| m.symbol.as_str()), Some("BTC/USDT"));
        assert!(index.resolve("ETH/USDT").is_none());
        assert_eq!(
            index.safe_symbol(Some("eth_btc"), Some("_")).as_deref(),
            Some("ETH/BTC")
        );
        assert_eq!(index.safe_symbol(Some("btc_usdt"), Some("_")).as_deref(), Some("BTC/USDT"));
    }
}
