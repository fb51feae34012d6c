//! 24h ticker statistics.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::shared::precise::{div_truncated, DEFAULT_DIV_SCALE};
use crate::shared::time;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticker {
    pub symbol: String,
    pub timestamp: Option<i64>,
    pub datetime: Option<String>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub bid: Option<Decimal>,
    pub bid_volume: Option<Decimal>,
    pub ask: Option<Decimal>,
    pub ask_volume: Option<Decimal>,
    pub vwap: Option<Decimal>,
    pub open: Option<Decimal>,
    pub close: Option<Decimal>,
    pub last: Option<Decimal>,
    pub previous_close: Option<Decimal>,
    pub change: Option<Decimal>,
    /// Percent change relative to `open` (`2.5` means +2.5 %).
    pub percentage: Option<Decimal>,
    pub average: Option<Decimal>,
    pub base_volume: Option<Decimal>,
    pub quote_volume: Option<Decimal>,
    pub info: Value,
}

fn ratio(numerator: Decimal, denominator: Decimal) -> Option<Decimal> {
    div_truncated(numerator, denominator, DEFAULT_DIV_SCALE)
        .ok()
        .map(|d| d.normalize())
}

impl Ticker {
    /// Derive the statistics that follow from the reported ones.
    pub fn complete(mut self) -> Self {
        self.close = self.close.or(self.last);
        self.last = self.last.or(self.close);

        if self.open.is_none() {
            if let (Some(last), Some(change)) = (self.last, self.change) {
                self.open = last.checked_sub(change);
            }
        }
        if self.change.is_none() {
            if let (Some(last), Some(open)) = (self.last, self.open) {
                self.change = last.checked_sub(open);
            }
        }
        if self.percentage.is_none() {
            if let (Some(change), Some(open)) = (self.change, self.open) {
                self.percentage = change
                    .checked_mul(Decimal::ONE_HUNDRED)
                    .and_then(|c| ratio(c, open));
            }
        }
        if self.average.is_none() {
            if let (Some(last), Some(open)) = (self.last, self.open) {
                self.average = last.checked_add(open).and_then(|s| ratio(s, Decimal::TWO));
            }
        }
        if self.vwap.is_none() {
            if let (Some(quote), Some(base)) = (self.quote_volume, self.base_volume) {
                self.vwap = ratio(quote, base);
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
    fn test_change_percentage_average_from_open() {
        let ticker = Ticker {
            symbol: "BTC/USDT".into(),
            last: Some(dec("110")),
            open: Some(dec("100")),
            ..Default::default()
        }
        .complete();
        assert_eq!(ticker.close, Some(dec("110")));
        assert_eq!(ticker.change, Some(dec("10")));
        assert_eq!(ticker.percentage, Some(dec("10")));
        assert_eq!(ticker.average, Some(dec("105")));
    }

    #[test]
    fn test_open_from_change() {
        let ticker = Ticker {
            close: Some(dec("90")),
            change: Some(dec("-10")),
            ..Default::default()
        }
        .complete();
        assert_eq!(ticker.last, Some(dec("90")));
        assert_eq!(ticker.open, Some(dec("100")));
        assert_eq!(ticker.percentage, Some(dec("-10")));
    }

    #[test]
    fn test_zero_open_leaves_percentage_absent() {
        let ticker = Ticker {
            last: Some(dec("1")),
            open: Some(Decimal::ZERO),
            ..Default::default()
        }
        .complete();
        assert_eq!(ticker.change, Some(dec("1")));
        assert_eq!(ticker.percentage, None);
    }

    #[test]
    fn test_vwap_from_volumes() {
        let ticker = Ticker {
            base_volume: Some(dec("4")),
            quote_volume: Some(dec("402")),
            ..Default::default()
        }
        .complete();
        assert_eq!(ticker.vwap, Some(dec("100.5")));
        let zero = Ticker {
            base_volume: Some(Decimal::ZERO),
            quote_volume: Some(dec("1")),
            ..Default::default()
        }
        .complete();
        assert_eq!(zero.vwap, None);
    }
}
