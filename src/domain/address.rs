//! Deposit addresses and withdrawal requests.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DepositAddress {
    pub currency: String,
    pub network: Option<String>,
    pub address: String,
    /// Memo / payment id for chains that need one.
    pub tag: Option<String>,
    pub info: Value,
}

/// Parameters of an outgoing transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct WithdrawRequest {
    /// Unified currency code.
    pub code: String,
    pub amount: Decimal,
    pub address: String,
    pub tag: Option<String>,
    /// Unified network code.
    pub network: Option<String>,
    pub params: Map<String, Value>,
}

impl WithdrawRequest {
    pub fn new(code: &str, amount: Decimal, address: &str) -> Self {
        Self {
            code: code.to_string(),
            amount,
            address: address.to_string(),
            tag: None,
            network: None,
            params: Map::new(),
        }
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tag = Some(tag.to_string());
        self
    }

    pub fn with_network(mut self, network: &str) -> Self {
        self.network = Some(network.to_string());
        self
    }
}
