//! Public and private fills.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::fee::Fee;
use crate::shared::{time, Side, TakerOrMaker};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub id: Option<String>,
    /// Originating order id.
    pub order: Option<String>,
    pub timestamp: Option<i64>,
    pub datetime: Option<String>,
    pub symbol: String,
    #[serde(rename = "type")]
    pub order_type: Option<String>,
    pub side: Option<Side>,
    pub taker_or_maker: Option<TakerOrMaker>,
    pub price: Option<Decimal>,
    pub amount: Option<Decimal>,
    pub cost: Option<Decimal>,
    pub fee: Option<Fee>,
    pub info: Value,
}

impl Trade {
    /// Derive `cost` and `datetime`, normalize the fee sign.
    pub fn complete(mut self) -> Self {
        if self.cost.is_none() {
            if let (Some(price), Some(amount)) = (self.price, self.amount) {
                self.cost = price.checked_mul(amount).map(|c| c.normalize());
            }
        }
        self.fee = self.fee.map(Fee::normalized);
        if self.datetime.is_none() {
            self.datetime = self.timestamp.and_then(time::iso8601);
        }
        self
    }

    /// Re-express a fill reported with the taker's side from the given
    /// participant's point of view.
    ///
    /// The maker sits on the opposite side of the taker, so the side flips;
    /// for the taker it passes through.
    pub fn from_perspective(mut self, role: TakerOrMaker) -> Self {
        if role == TakerOrMaker::Maker {
            self.side = self.side.map(Side::flip);
        }
        self.taker_or_maker = Some(role);
        self
    }
}

/// Side from an explicit field, else from an `is_buy`-style flag.
pub fn resolve_side(side: Option<&str>, is_buy: Option<bool>) -> Option<Side> {
    side.and_then(Side::parse).or(is_buy.map(Side::from_is_buy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_cost_from_price_and_amount() {
        let trade = Trade {
            price: Some(dec("2.5")),
            amount: Some(dec("4")),
            timestamp: Some(0),
            ..Default::default()
        }
        .complete();
        assert_eq!(trade.cost, Some(dec("10")));
        assert_eq!(trade.datetime.as_deref(), Some("1970-01-01T00:00:00.000Z"));
    }

    #[test]
    fn test_reported_cost_is_kept() {
        let trade = Trade {
            price: Some(dec("2.5")),
            amount: Some(dec("4")),
            cost: Some(dec("10.01")),
            ..Default::default()
        }
        .complete();
        assert_eq!(trade.cost, Some(dec("10.01")));
    }

    #[test]
    fn test_maker_perspective_flips_side() {
        let sell = Trade { side: Some(Side::Sell), ..Default::default() };
        assert_eq!(sell.clone().from_perspective(TakerOrMaker::Maker).side, Some(Side::Buy));
        assert_eq!(sell.from_perspective(TakerOrMaker::Taker).side, Some(Side::Sell));
        let buy = Trade { side: Some(Side::Buy), ..Default::default() };
        let as_maker = buy.from_perspective(TakerOrMaker::Maker);
        assert_eq!(as_maker.side, Some(Side::Sell));
        assert_eq!(as_maker.taker_or_maker, Some(TakerOrMaker::Maker));
    }

    #[test]
    fn test_resolve_side_prefers_explicit_field() {
        assert_eq!(resolve_side(Some("SELL"), Some(true)), Some(Side::Sell));
        assert_eq!(resolve_side(None, Some(true)), Some(Side::Buy));
        assert_eq!(resolve_side(Some("?"), Some(false)), Some(Side::Sell));
        assert_eq!(resolve_side(None, None), None);
    }
}
