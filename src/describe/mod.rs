//! Static per-adapter capability descriptor.
//!
//! A [`Descriptor`] is built once when an adapter is constructed and is
//! read-only afterwards: identity, capability flags, timeframe vocabulary,
//! route table, fee defaults, precision mode, exception tables, required
//! credentials, currency-code aliases and tunables.

pub mod capability;
pub mod exceptions;
pub mod options;
pub mod routes;

pub use capability::{Capabilities, Has};
pub use exceptions::ExceptionTable;
pub use options::Options;
pub use routes::{Api, RouteTable, Verb};

use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::shared::{MarketType, PrecisionMode, Timeframe};

/// Base URLs per API namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Urls {
    pub public: String,
    pub private: String,
}

impl Urls {
    /// Both namespaces on one root.
    pub fn single(root: &str) -> Self {
        Self {
            public: root.to_string(),
            private: root.to_string(),
        }
    }

    pub fn for_api(&self, api: Api) -> &str {
        match api {
            Api::Public => &self.public,
            Api::Private => &self.private,
        }
    }
}

/// Default maker/taker rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TradingFeeSchedule {
    pub maker: Decimal,
    pub taker: Decimal,
    pub tier_based: bool,
    pub percentage: bool,
}

impl TradingFeeSchedule {
    pub fn new(maker: Decimal, taker: Decimal) -> Self {
        Self {
            maker,
            taker,
            tier_based: false,
            percentage: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Fees {
    pub trading: TradingFeeSchedule,
    /// Overrides for derivative market types.
    pub per_type: BTreeMap<MarketType, TradingFeeSchedule>,
}

impl Fees {
    pub fn for_type(&self, market_type: MarketType) -> TradingFeeSchedule {
        self.per_type
            .get(&market_type)
            .copied()
            .unwrap_or(self.trading)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequiredCredentials {
    pub api_key: bool,
    pub secret: bool,
    pub password: bool,
}

impl RequiredCredentials {
    /// API key and secret.
    pub fn key_and_secret() -> Self {
        Self {
            api_key: true,
            secret: true,
            password: false,
        }
    }
}

/// Aliases every adapter applies after its own table.
const GLOBAL_CURRENCY_ALIASES: [(&str, &str); 2] = [("XBT", "BTC"), ("BCC", "BCH")];

#[derive(Debug, Clone)]
pub struct Descriptor {
    pub id: &'static str,
    pub name: &'static str,
    pub countries: Vec<&'static str>,
    pub version: &'static str,
    /// Milliseconds between unit-cost requests.
    pub rate_limit: u64,
    pub urls: Urls,
    pub has: Capabilities,
    pub timeframes: BTreeMap<Timeframe, &'static str>,
    pub routes: RouteTable,
    pub fees: Fees,
    pub precision_mode: PrecisionMode,
    pub exceptions: ExceptionTable,
    pub required_credentials: RequiredCredentials,
    /// Exchange currency id to unified code; checked before the global aliases.
    pub common_currencies: BTreeMap<&'static str, &'static str>,
    pub options: Options,
}

impl Descriptor {
    /// Unified currency code: uppercase, then adapter aliases, then global ones.
    pub fn common_currency_code(&self, id: &str) -> String {
        let upper = id.trim().to_uppercase();
        if let Some(alias) = self.common_currencies.get(upper.as_str()) {
            return alias.to_string();
        }
        GLOBAL_CURRENCY_ALIASES
            .iter()
            .find(|(from, _)| *from == upper)
            .map(|(_, to)| to.to_string())
            .unwrap_or(upper)
    }

    pub fn safe_currency_code(&self, id: Option<&str>) -> Option<String> {
        id.filter(|s| !s.is_empty())
            .map(|s| self.common_currency_code(s))
    }

    /// Exchange-native code for a unified timeframe.
    pub fn timeframe(&self, timeframe: Timeframe) -> Option<&'static str> {
        self.timeframes.get(&timeframe).copied()
    }

    pub fn has(&self, operation: &str) -> Has {
        self.has.get(operation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn descriptor() -> Descriptor {
        Descriptor {
            id: "test",
            name: "Test",
            countries: vec!["US"],
            version: "v1",
            rate_limit: 100,
            urls: Urls::single("https://example.invalid"),
            has: Capabilities::new(),
            timeframes: BTreeMap::from([(Timeframe::Hour1, "60")]),
            routes: RouteTable::new(),
            fees: Fees {
                trading: TradingFeeSchedule::new(dec("0.001"), dec("0.002")),
                per_type: BTreeMap::from([(
                    MarketType::Swap,
                    TradingFeeSchedule::new(dec("0.0002"), dec("0.0006")),
                )]),
            },
            precision_mode: PrecisionMode::TickSize,
            exceptions: ExceptionTable::new(),
            required_credentials: RequiredCredentials::key_and_secret(),
            common_currencies: BTreeMap::from([("PLA", "Plair"), ("XBT", "XBT")]),
            options: Options::new(),
        }
    }

    #[test]
    fn test_common_currency_code_alias_order() {
        let d = descriptor();
        assert_eq!(d.common_currency_code("btc"), "BTC");
        assert_eq!(d.common_currency_code("PLA"), "Plair");
        assert_eq!(d.common_currency_code("bcc"), "BCH");
        // adapter table shadows the global rename
        assert_eq!(d.common_currency_code("XBT"), "XBT");
        assert_eq!(d.safe_currency_code(Some("")), None);
    }

    #[test]
    fn test_fees_per_type_override() {
        let d = descriptor();
        assert_eq!(d.fees.for_type(MarketType::Swap).taker, dec("0.0006"));
        assert_eq!(d.fees.for_type(MarketType::Spot).taker, dec("0.002"));
        assert_eq!(d.timeframe(Timeframe::Hour1), Some("60"));
        assert_eq!(d.timeframe(Timeframe::Minute3), None);
    }
}
