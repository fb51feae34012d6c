//! Account balances.
//!
//! Exchanges report two of `free`, `used` and `total` and leave the third to
//! the client. Each adapter states which pair it trusts through
//! [`BalanceTrust`]; the third is derived so `total == free + used` holds
//! whenever all three are known. A member that cannot be derived stays
//! `None`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::shared::time;

/// The pair of reported fields a balance is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceTrust {
    FreeUsed,
    FreeTotal,
    UsedTotal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub free: Option<Decimal>,
    pub used: Option<Decimal>,
    pub total: Option<Decimal>,
}

impl Account {
    /// Build from the trusted pair. The third member is only derived when
    /// both members of the pair are present and the arithmetic does not
    /// overflow; otherwise it is `None`.
    pub fn derive(trust: BalanceTrust, first: Option<Decimal>, second: Option<Decimal>) -> Self {
        let (free, used, total) = match trust {
            BalanceTrust::FreeUsed => (first, second, checked_add(first, second)),
            BalanceTrust::FreeTotal => (first, checked_sub(second, first), second),
            BalanceTrust::UsedTotal => (checked_sub(second, first), first, second),
        };
        Self {
            free: free.map(|d| d.normalize()),
            used: used.map(|d| d.normalize()),
            total: total.map(|d| d.normalize()),
        }
    }

    /// Sum two accounts member by member. A member missing on either side is
    /// unknown in the sum.
    pub fn merge(&self, other: &Account) -> Account {
        Account {
            free: checked_add(self.free, other.free),
            used: checked_add(self.used, other.used),
            total: checked_add(self.total, other.total),
        }
    }
}

fn checked_add(a: Option<Decimal>, b: Option<Decimal>) -> Option<Decimal> {
    a?.checked_add(b?)
}

fn checked_sub(a: Option<Decimal>, b: Option<Decimal>) -> Option<Decimal> {
    a?.checked_sub(b?)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    pub timestamp: Option<i64>,
    pub datetime: Option<String>,
    /// Unified currency code to amounts.
    pub currencies: BTreeMap<String, Account>,
    pub info: Value,
}

impl Balance {
    pub fn new(info: Value, timestamp: Option<i64>) -> Self {
        Self {
            timestamp,
            datetime: timestamp.and_then(time::iso8601),
            currencies: BTreeMap::new(),
            info,
        }
    }

    /// Build a balance where every currency trusts the same pair.
    ///
    /// Entries for the same code are summed, which is what an exchange
    /// splitting one currency over several sub-accounts expects.
    pub fn from_accounts(
        entries: impl IntoIterator<Item = (String, Option<Decimal>, Option<Decimal>)>,
        trust: BalanceTrust,
        info: Value,
        timestamp: Option<i64>,
    ) -> Self {
        let mut balance = Self::new(info, timestamp);
        for (code, first, second) in entries {
            balance.insert(code, Account::derive(trust, first, second));
        }
        balance
    }

    pub fn insert(&mut self, code: String, account: Account) {
        let merged = match self.currencies.remove(&code) {
            Some(existing) => existing.merge(&account),
            None => account,
        };
        self.currencies.insert(code, merged);
    }

    pub fn get(&self, code: &str) -> Option<&Account> {
        self.currencies.get(code)
    }

    pub fn free(&self, code: &str) -> Option<Decimal> {
        self.get(code).and_then(|a| a.free)
    }

    pub fn used(&self, code: &str) -> Option<Decimal> {
        self.get(code).and_then(|a| a.used)
    }

    pub fn total(&self, code: &str) -> Option<Decimal> {
        self.get(code).and_then(|a| a.total)
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
    fn test_each_trust_pair_keeps_identity() {
        for trust in [BalanceTrust::FreeUsed, BalanceTrust::FreeTotal, BalanceTrust::UsedTotal] {
            let account = Account::derive(trust, Some(dec("1.25")), Some(dec("3.5")));
            let (free, used, total) = (account.free.unwrap(), account.used.unwrap(), account.total.unwrap());
            assert_eq!(total, free + used, "{:?}", trust);
        }
        let free_total = Account::derive(BalanceTrust::FreeTotal, Some(dec("1.25")), Some(dec("3.5")));
        assert_eq!(free_total.used, Some(dec("2.25")));
    }

    #[test]
    fn test_missing_member_is_not_derived() {
        let account = Account::derive(BalanceTrust::FreeTotal, Some(dec("5")), None);
        assert_eq!(account.free, Some(dec("5")));
        assert_eq!(account.used, None);
        assert_eq!(account.total, None);

        let account = Account::derive(BalanceTrust::FreeUsed, Some(dec("2")), None);
        assert_eq!(account.used, None);
        assert_eq!(account.total, None);

        let account = Account::derive(BalanceTrust::UsedTotal, None, Some(dec("3")));
        assert_eq!(account.free, None);
        assert_eq!(account.total, Some(dec("3")));
    }

    #[test]
    fn test_overflow_leaves_member_unknown() {
        let account = Account::derive(BalanceTrust::FreeUsed, Some(Decimal::MAX), Some(Decimal::MAX));
        assert_eq!(account.free, Some(Decimal::MAX));
        assert_eq!(account.total, None);

        let account = Account::derive(BalanceTrust::FreeTotal, Some(Decimal::MIN), Some(Decimal::MAX));
        assert_eq!(account.used, None);
    }

    #[test]
    fn test_same_code_is_summed() {
        let balance = Balance::from_accounts(
            vec![
                ("USDT".to_string(), Some(dec("1")), Some(dec("0.5"))),
                ("USDT".to_string(), Some(dec("2")), Some(dec("0"))),
                ("BTC".to_string(), Some(dec("0.1")), Some(dec("0.2"))),
                ("BTC".to_string(), Some(dec("0.3")), None),
            ],
            BalanceTrust::FreeUsed,
            Value::Null,
            None,
        );
        assert_eq!(balance.free("USDT"), Some(dec("3")));
        assert_eq!(balance.total("USDT"), Some(dec("3.5")));
        assert_eq!(balance.free("BTC"), Some(dec("0.4")));
        assert_eq!(balance.used("BTC"), None);
        assert_eq!(balance.total("BTC"), None);
        assert_eq!(balance.get("ETH"), None);
    }
}
