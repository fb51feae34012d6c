//! Shared vocabulary and helper layers used across all domain modules.
//!
//! The enums here serialize to the lowercase unified vocabulary (`"buy"`,
//! `"swap"`, `"cross"`, ...) so canonical entities render the same way no
//! matter which exchange they came from.

pub mod precise;
pub mod precision;
pub mod safe;
pub mod time;

pub use precision::PrecisionMode;

use serde::{Deserialize, Serialize};
use std::fmt;

// ─── Side ────────────────────────────────────────────────────────────────────

/// Order or trade side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Parse the common native spellings (`buy`, `BID`, `Sell`, `ask`, ...).
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "buy" | "bid" | "b" | "long" => Some(Side::Buy),
            "sell" | "ask" | "s" | "short" => Some(Side::Sell),
            _ => None,
        }
    }

    pub fn from_is_buy(is_buy: bool) -> Self {
        if is_buy {
            Side::Buy
        } else {
            Side::Sell
        }
    }

    /// The opposite side.
    pub fn flip(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── TakerOrMaker ────────────────────────────────────────────────────────────

/// Liquidity role of one side of a fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TakerOrMaker {
    Taker,
    Maker,
}

impl TakerOrMaker {
    /// Accepts `taker`/`maker` and the single-letter `T`/`M` codes.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "taker" | "t" => Some(TakerOrMaker::Taker),
            "maker" | "m" => Some(TakerOrMaker::Maker),
            _ => None,
        }
    }
}

// ─── MarketType ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketType {
    #[default]
    Spot,
    Swap,
    Future,
    Option,
}

impl MarketType {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "spot" => Some(MarketType::Spot),
            "swap" | "perpetual" | "perp" => Some(MarketType::Swap),
            "future" | "futures" => Some(MarketType::Future),
            "option" | "options" => Some(MarketType::Option),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MarketType::Spot => "spot",
            MarketType::Swap => "swap",
            MarketType::Future => "future",
            MarketType::Option => "option",
        }
    }

    pub fn is_contract(&self) -> bool {
        !matches!(self, MarketType::Spot)
    }
}

impl fmt::Display for MarketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── MarginMode ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarginMode {
    Cross,
    Isolated,
}

impl MarginMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "cross" | "crossed" => Some(MarginMode::Cross),
            "isolated" | "fixed" => Some(MarginMode::Isolated),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MarginMode::Cross => "cross",
            MarginMode::Isolated => "isolated",
        }
    }
}

// ─── Timeframe ───────────────────────────────────────────────────────────────

/// Unified candle timeframe code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[default]
    #[serde(rename = "1m")]
    Minute1,
    #[serde(rename = "3m")]
    Minute3,
    #[serde(rename = "5m")]
    Minute5,
    #[serde(rename = "15m")]
    Minute15,
    #[serde(rename = "30m")]
    Minute30,
    #[serde(rename = "1h")]
    Hour1,
    #[serde(rename = "2h")]
    Hour2,
    #[serde(rename = "4h")]
    Hour4,
    #[serde(rename = "6h")]
    Hour6,
    #[serde(rename = "12h")]
    Hour12,
    #[serde(rename = "1d")]
    Day1,
    #[serde(rename = "1w")]
    Week1,
    #[serde(rename = "1M")]
    Month1,
}

impl Timeframe {
    pub const ALL: [Timeframe; 13] = [
        Self::Minute1,
        Self::Minute3,
        Self::Minute5,
        Self::Minute15,
        Self::Minute30,
        Self::Hour1,
        Self::Hour2,
        Self::Hour4,
        Self::Hour6,
        Self::Hour12,
        Self::Day1,
        Self::Week1,
        Self::Month1,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Minute1 => "1m",
            Self::Minute3 => "3m",
            Self::Minute5 => "5m",
            Self::Minute15 => "15m",
            Self::Minute30 => "30m",
            Self::Hour1 => "1h",
            Self::Hour2 => "2h",
            Self::Hour4 => "4h",
            Self::Hour6 => "6h",
            Self::Hour12 => "12h",
            Self::Day1 => "1d",
            Self::Week1 => "1w",
            Self::Month1 => "1M",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tf| tf.as_str() == value)
    }

    /// Duration of one candle in seconds. A month counts as 30 days.
    pub fn seconds(&self) -> i64 {
        match self {
            Self::Minute1 => 60,
            Self::Minute3 => 180,
            Self::Minute5 => 300,
            Self::Minute15 => 900,
            Self::Minute30 => 1800,
            Self::Hour1 => 3600,
            Self::Hour2 => 7200,
            Self::Hour4 => 14400,
            Self::Hour6 => 21600,
            Self::Hour12 => 43200,
            Self::Day1 => 86400,
            Self::Week1 => 604800,
            Self::Month1 => 2592000,
        }
    }

    pub fn millis(&self) -> i64 {
        self.seconds() * 1000
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_parse_and_flip() {
        assert_eq!(Side::parse("BID"), Some(Side::Buy));
        assert_eq!(Side::parse("Ask"), Some(Side::Sell));
        assert_eq!(Side::parse("hold"), None);
        assert_eq!(Side::Buy.flip(), Side::Sell);
        assert_eq!(Side::Sell.flip().flip(), Side::Sell);
    }

    #[test]
    fn test_side_serde() {
        let buy: Side = serde_json::from_str("\"buy\"").unwrap();
        assert_eq!(buy, Side::Buy);
        assert_eq!(serde_json::to_string(&Side::Sell).unwrap(), "\"sell\"");
    }

    #[test]
    fn test_taker_or_maker_codes() {
        assert_eq!(TakerOrMaker::parse("T"), Some(TakerOrMaker::Taker));
        assert_eq!(TakerOrMaker::parse("maker"), Some(TakerOrMaker::Maker));
    }

    #[test]
    fn test_market_type_parse() {
        assert_eq!(MarketType::parse("SWAP"), Some(MarketType::Swap));
        assert_eq!(MarketType::parse("futures"), Some(MarketType::Future));
        assert!(MarketType::Swap.is_contract());
        assert!(!MarketType::Spot.is_contract());
    }

    #[test]
    fn test_timeframe_serde() {
        let tf: Timeframe = serde_json::from_str("\"1h\"").unwrap();
        assert_eq!(tf, Timeframe::Hour1);
        assert_eq!(tf.seconds(), 3600);
        assert_eq!(Timeframe::parse("1M"), Some(Timeframe::Month1));
        assert_eq!(Timeframe::parse("7m"), None);
    }
}
