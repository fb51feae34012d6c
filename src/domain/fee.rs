//! Fees charged on fills and transfers, and per-symbol trading fee rates.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A fee charged on one trade, order or transfer.
///
/// `cost` is always non-negative once [`Fee::normalized`] has run; exchanges
/// that report fees as negative balance deltas are folded into this form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fee {
    pub cost: Option<Decimal>,
    pub currency: Option<String>,
    pub rate: Option<Decimal>,
}

impl Fee {
    /// `None` when neither a cost nor a currency was reported.
    pub fn from_parts(
        cost: Option<Decimal>,
        currency: Option<String>,
        rate: Option<Decimal>,
    ) -> Option<Self> {
        if cost.is_none() && currency.is_none() {
            return None;
        }
        Some(Self { cost, currency, rate }.normalized())
    }

    pub fn normalized(mut self) -> Self {
        self.cost = self.cost.map(|c| c.abs());
        self.rate = self.rate.map(|r| r.abs());
        self
    }
}

/// Maker/taker rates for one market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingFee {
    pub symbol: String,
    pub maker: Option<Decimal>,
    pub taker: Option<Decimal>,
    pub percentage: Option<bool>,
    pub tier_based: Option<bool>,
    pub info: Value,
}
