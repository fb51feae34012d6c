//! Currency and its per-network transfer details.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::market::MinMax;
use crate::shared::safe;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrencyLimits {
    pub amount: MinMax,
    pub deposit: MinMax,
    pub withdraw: MinMax,
}

/// One chain a currency can move on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Network {
    /// Exchange-native network id.
    pub id: String,
    /// Unified network code.
    pub network: String,
    pub active: Option<bool>,
    pub deposit: Option<bool>,
    pub withdraw: Option<bool>,
    pub fee: Option<Decimal>,
    pub precision: Option<Decimal>,
    pub limits: CurrencyLimits,
    pub info: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Currency {
    pub id: String,
    pub code: String,
    pub name: Option<String>,
    pub precision: Option<Decimal>,
    pub active: Option<bool>,
    pub deposit: Option<bool>,
    pub withdraw: Option<bool>,
    pub fee: Option<Decimal>,
    pub limits: CurrencyLimits,
    /// Unified network code to network details.
    pub networks: BTreeMap<String, Network>,
    pub info: Value,
}

impl Currency {
    /// Stand-in for a code referenced by a market but missing from the listing.
    pub fn placeholder(code: &str) -> Self {
        Self {
            id: code.to_string(),
            code: code.to_string(),
            info: Value::Null,
            ..Default::default()
        }
    }

    /// Fill currency-level flags and fee from the networks when unreported.
    ///
    /// A currency is active / depositable / withdrawable when any network is.
    /// With exactly one network its fee becomes the currency fee.
    pub fn complete(mut self) -> Self {
        if self.networks.is_empty() {
            return self;
        }
        let any = |pick: fn(&Network) -> Option<bool>| -> Option<bool> {
            let flags: Vec<bool> = self.networks.values().filter_map(pick).collect();
            (!flags.is_empty()).then(|| flags.iter().any(|f| *f))
        };
        let deposit = any(|n| n.deposit);
        let withdraw = any(|n| n.withdraw);
        let active = any(|n| n.active);
        self.deposit = self.deposit.or(deposit);
        self.withdraw = self.withdraw.or(withdraw);
        self.active = self.active.or(active);
        if self.fee.is_none() && self.networks.len() == 1 {
            self.fee = self.networks.values().next().and_then(|n| n.fee);
        }
        self
    }
}

// ─── Withdrawal fee shapes ───────────────────────────────────────────────────

/// A withdrawal fee field as reported: one flat amount for a single-network
/// currency, or an object keyed by network name.
#[derive(Debug, Clone, PartialEq)]
pub enum WithdrawFee {
    Flat(Decimal),
    PerNetwork(BTreeMap<String, Option<Decimal>>),
}

impl WithdrawFee {
    /// Detect the shape from the field itself.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Object(map) => {
                let fees = map
                    .iter()
                    .map(|(network, _)| (network.clone(), safe::safe_number(value, network.as_str())))
                    .collect();
                Some(WithdrawFee::PerNetwork(fees))
            }
            Value::Null => None,
            scalar => {
                let text = safe::value_to_string(scalar)?;
                crate::shared::precise::parse(&text).ok().map(WithdrawFee::Flat)
            }
        }
    }

    /// Fee on one network. A flat fee applies to any network.
    pub fn for_network(&self, network: &str) -> Option<Decimal> {
        match self {
            WithdrawFee::Flat(fee) => Some(*fee),
            WithdrawFee::PerNetwork(map) => map.get(network).copied().flatten(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_withdraw_fee_flat_shape() {
        let fee = WithdrawFee::from_value(&json!("0.0005")).unwrap();
        assert_eq!(fee, WithdrawFee::Flat(Decimal::new(5, 4)));
        assert_eq!(fee.for_network("anything"), Some(Decimal::new(5, 4)));
    }

    #[test]
    fn test_withdraw_fee_keyed_shape() {
        let fee = WithdrawFee::from_value(&json!({"TRX": "1", "ETH": 5})).unwrap();
        assert_eq!(fee.for_network("TRX"), Some(Decimal::ONE));
        assert_eq!(fee.for_network("ETH"), Some(Decimal::from(5)));
        assert_eq!(fee.for_network("BSC"), None);
        assert!(WithdrawFee::from_value(&Value::Null).is_none());
    }

    #[test]
    fn test_complete_rolls_up_network_flags() {
        let mut currency = Currency::placeholder("USDT");
        currency.networks.insert(
            "TRC20".into(),
            Network { deposit: Some(false), withdraw: Some(true), fee: Some(Decimal::ONE), ..Default::default() },
        );
        let currency = currency.complete();
        assert_eq!(currency.deposit, Some(false));
        assert_eq!(currency.withdraw, Some(true));
        assert_eq!(currency.fee, Some(Decimal::ONE));
        assert_eq!(currency.active, None);
    }
}
