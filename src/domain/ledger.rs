//! Account ledger entries.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::fee::Fee;
use super::transaction::TransactionStatus;
use crate::shared::time;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerDirection {
    In,
    Out,
}

impl LedgerDirection {
    /// Direction of a signed balance delta. Zero counts as incoming.
    pub fn from_signed(amount: Decimal) -> Self {
        if amount.is_sign_negative() && !amount.is_zero() {
            LedgerDirection::Out
        } else {
            LedgerDirection::In
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub id: Option<String>,
    pub direction: Option<LedgerDirection>,
    pub account: Option<String>,
    pub reference_id: Option<String>,
    pub reference_account: Option<String>,
    #[serde(rename = "type")]
    pub entry_type: Option<String>,
    pub currency: Option<String>,
    /// Absolute size of the movement; the sign lives in `direction`.
    pub amount: Option<Decimal>,
    pub timestamp: Option<i64>,
    pub datetime: Option<String>,
    pub before: Option<Decimal>,
    pub after: Option<Decimal>,
    pub status: Option<TransactionStatus>,
    pub fee: Option<Fee>,
    pub info: Value,
}

impl LedgerEntry {
    /// Derive `before` from `after` (or the reverse) using the direction.
    pub fn complete(mut self) -> Self {
        self.amount = self.amount.map(|a| a.abs());
        if let (Some(amount), Some(direction)) = (self.amount, self.direction) {
            let delta = match direction {
                LedgerDirection::In => amount,
                LedgerDirection::Out => -amount,
            };
            match (self.before, self.after) {
                (None, Some(after)) => self.before = after.checked_sub(delta).map(|b| b.normalize()),
                (Some(before), None) => self.after = before.checked_add(delta).map(|a| a.normalize()),
                _ => {}
            }
        }
        self.fee = self.fee.map(Fee::normalized);
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
    fn test_before_from_after() {
        let incoming = LedgerEntry {
            direction: Some(LedgerDirection::In),
            amount: Some(dec("5")),
            after: Some(dec("15")),
            ..Default::default()
        }
        .complete();
        assert_eq!(incoming.before, Some(dec("10")));

        let outgoing = LedgerEntry {
            direction: Some(LedgerDirection::Out),
            amount: Some(dec("5")),
            after: Some(dec("15")),
            ..Default::default()
        }
        .complete();
        assert_eq!(outgoing.before, Some(dec("20")));
    }

    #[test]
    fn test_after_from_before_and_signed_amount() {
        let entry = LedgerEntry {
            direction: Some(LedgerDirection::from_signed(dec("-2.5"))),
            amount: Some(dec("-2.5")),
            before: Some(dec("10")),
            ..Default::default()
        }
        .complete();
        assert_eq!(entry.direction, Some(LedgerDirection::Out));
        assert_eq!(entry.amount, Some(dec("2.5")));
        assert_eq!(entry.after, Some(dec("7.5")));
    }
}
