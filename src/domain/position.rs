//! Derivative positions.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::shared::precise::{div_truncated, DEFAULT_DIV_SCALE};
use crate::shared::{time, MarginMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSide {
    Long,
    Short,
}

impl PositionSide {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "long" | "buy" => Some(PositionSide::Long),
            "short" | "sell" => Some(PositionSide::Short),
            _ => None,
        }
    }

    /// `> 0` long, `< 0` short, zero is flat.
    pub fn from_signed(contracts: Decimal) -> Option<Self> {
        if contracts.is_sign_positive() && !contracts.is_zero() {
            Some(PositionSide::Long)
        } else if contracts.is_sign_negative() && !contracts.is_zero() {
            Some(PositionSide::Short)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub id: Option<String>,
    pub symbol: String,
    pub side: Option<PositionSide>,
    /// Always non-negative; direction lives in `side`.
    pub contracts: Option<Decimal>,
    pub contract_size: Option<Decimal>,
    pub entry_price: Option<Decimal>,
    pub mark_price: Option<Decimal>,
    pub notional: Option<Decimal>,
    pub leverage: Option<Decimal>,
    pub collateral: Option<Decimal>,
    pub initial_margin: Option<Decimal>,
    pub initial_margin_percentage: Option<Decimal>,
    pub maintenance_margin: Option<Decimal>,
    pub maintenance_margin_percentage: Option<Decimal>,
    pub unrealized_pnl: Option<Decimal>,
    pub realized_pnl: Option<Decimal>,
    pub liquidation_price: Option<Decimal>,
    pub margin_mode: Option<MarginMode>,
    pub margin_ratio: Option<Decimal>,
    pub percentage: Option<Decimal>,
    pub hedged: Option<bool>,
    pub timestamp: Option<i64>,
    pub datetime: Option<String>,
    pub last_update_timestamp: Option<i64>,
    pub info: Value,
}

fn ratio(numerator: Decimal, denominator: Decimal) -> Option<Decimal> {
    div_truncated(numerator, denominator, DEFAULT_DIV_SCALE)
        .ok()
        .map(|d| d.normalize())
}

impl Position {
    /// Resolve the side and the margin figures.
    ///
    /// `signed_contracts` is the raw quantity from feeds that encode direction
    /// in its sign; an explicit `side` already set wins over it.
    pub fn complete(mut self, signed_contracts: Option<Decimal>) -> Self {
        if self.side.is_none() {
            self.side = signed_contracts.and_then(PositionSide::from_signed);
        }
        if self.contracts.is_none() {
            self.contracts = signed_contracts;
        }
        self.contracts = self.contracts.map(|c| c.abs());

        if self.notional.is_none() {
            if let (Some(contracts), Some(mark)) = (self.contracts, self.mark_price) {
                let size = self.contract_size.unwrap_or(Decimal::ONE);
                self.notional = contracts
                    .checked_mul(size)
                    .and_then(|c| c.checked_mul(mark))
                    .map(|n| n.normalize());
            }
        }
        self.notional = self.notional.map(|n| n.abs());

        if self.initial_margin_percentage.is_none() {
            if let Some(leverage) = self.leverage {
                self.initial_margin_percentage = ratio(Decimal::ONE, leverage);
            }
        }
        if self.initial_margin.is_none() {
            if let (Some(notional), Some(leverage)) = (self.notional, self.leverage) {
                self.initial_margin = ratio(notional, leverage);
            }
        }

        match self.margin_mode {
            Some(MarginMode::Cross) => {
                if self.collateral.is_none() {
                    if let Some(initial) = self.initial_margin {
                        let pnl = self.unrealized_pnl.unwrap_or(Decimal::ZERO);
                        self.collateral = initial.checked_add(pnl).map(|c| c.normalize());
                    }
                }
            }
            Some(MarginMode::Isolated) | None => {}
        }

        if self.margin_ratio.is_none() {
            if let (Some(maintenance), Some(collateral)) = (self.maintenance_margin, self.collateral) {
                self.margin_ratio = ratio(maintenance, collateral);
            }
        }
        if self.maintenance_margin_percentage.is_none() {
            if let (Some(maintenance), Some(notional)) = (self.maintenance_margin, self.notional) {
                self.maintenance_margin_percentage = ratio(maintenance, notional);
            }
        }
        if self.percentage.is_none() {
            if let (Some(pnl), Some(initial)) = (self.unrealized_pnl, self.initial_margin) {
                self.percentage = pnl
                    .checked_mul(Decimal::ONE_HUNDRED)
                    .and_then(|p| ratio(p, initial));
            }
        }
        if self.datetime.is_none() {
            self.datetime = self.timestamp.and_then(time::iso8601);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_side_from_signed_contracts() {
        let short = Position::default().complete(Some(dec("-3")));
        assert_eq!(short.side, Some(PositionSide::Short));
        assert_eq!(short.contracts, Some(dec("3")));
        let long = Position::default().complete(Some(dec("2")));
        assert_eq!(long.side, Some(PositionSide::Long));
        let flat = Position::default().complete(Some(Decimal::ZERO));
        assert_eq!(flat.side, None);
    }

    #[test]
    fn test_explicit_side_wins() {
        let position = Position {
            side: Some(PositionSide::Short),
            ..Default::default()
        }
        .complete(Some(dec("5")));
        assert_eq!(position.side, Some(PositionSide::Short));
    }

    #[test]
    fn test_cross_collateral_is_margin_plus_pnl() {
        let position = Position {
            margin_mode: Some(MarginMode::Cross),
            contracts: Some(dec("2")),
            contract_size: Some(dec("0.5")),
            mark_price: Some(dec("100")),
            leverage: Some(dec("10")),
            unrealized_pnl: Some(dec("-2")),
            maintenance_margin: Some(dec("4")),
            ..Default::default()
        }
        .complete(None);
        assert_eq!(position.notional, Some(dec("100")));
        assert_eq!(position.initial_margin, Some(dec("10")));
        assert_eq!(position.initial_margin_percentage, Some(dec("0.1")));
        assert_eq!(position.collateral, Some(dec("8")));
        assert_eq!(position.margin_ratio, Some(dec("0.5")));
        assert_eq!(position.percentage, Some(dec("-20")));
    }

    #[test]
    fn test_isolated_keeps_reported_collateral() {
        let position = Position {
            margin_mode: Some(MarginMode::Isolated),
            leverage: Some(dec("4")),
            collateral: Some(dec("30")),
            ..Default::default()
        }
        .complete(None);
        assert_eq!(position.collateral, Some(dec("30")));
        assert_eq!(position.initial_margin_percentage, Some(dec("0.25")));
    }

    #[test]
    fn test_zero_denominators_leave_fields_absent() {
        let position = Position {
            margin_mode: Some(MarginMode::Cross),
            notional: Some(Decimal::ZERO),
            leverage: Some(Decimal::ZERO),
            unrealized_pnl: Some(dec("1")),
            initial_margin: Some(Decimal::ZERO),
            maintenance_margin: Some(dec("1")),
            collateral: Some(Decimal::ZERO),
            ..Default::default()
        }
        .complete(None);
        assert_eq!(position.initial_margin_percentage, None);
        assert_eq!(position.margin_ratio, None);
        assert_eq!(position.percentage, None);
        assert_eq!(position.maintenance_margin_percentage, None);
    }
}
