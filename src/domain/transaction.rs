//! Deposits and withdrawals.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::fee::Fee;
use crate::shared::time;

/// Unified transfer status; unmapped natives are kept in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransactionStatus {
    Pending,
    Ok,
    Failed,
    Canceled,
    Other(String),
}

impl TransactionStatus {
    /// Translate a native status through `table`; unmapped values pass through.
    pub fn from_table(native: &str, table: &[(&str, TransactionStatus)]) -> Self {
        table
            .iter()
            .find(|(key, _)| *key == native)
            .map(|(_, status)| status.clone())
            .unwrap_or_else(|| TransactionStatus::Other(native.to_string()))
    }

    pub fn as_str(&self) -> &str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Ok => "ok",
            TransactionStatus::Failed => "failed",
            TransactionStatus::Canceled => "canceled",
            TransactionStatus::Other(raw) => raw,
        }
    }
}

impl From<String> for TransactionStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "pending" => TransactionStatus::Pending,
            "ok" => TransactionStatus::Ok,
            "failed" => TransactionStatus::Failed,
            "canceled" => TransactionStatus::Canceled,
            _ => TransactionStatus::Other(value),
        }
    }
}

impl From<TransactionStatus> for String {
    fn from(status: TransactionStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Deposit,
    Withdrawal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Option<String>,
    pub txid: Option<String>,
    pub timestamp: Option<i64>,
    pub datetime: Option<String>,
    pub network: Option<String>,
    pub address: Option<String>,
    pub address_from: Option<String>,
    pub address_to: Option<String>,
    pub tag: Option<String>,
    pub tag_from: Option<String>,
    pub tag_to: Option<String>,
    #[serde(rename = "type")]
    pub transaction_type: Option<TransactionType>,
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    pub status: Option<TransactionStatus>,
    pub updated: Option<i64>,
    pub comment: Option<String>,
    pub internal: Option<bool>,
    pub fee: Option<Fee>,
    pub info: Value,
}

impl Transaction {
    pub fn complete(mut self) -> Self {
        self.fee = self.fee.map(Fee::normalized);
        if self.datetime.is_none() {
            self.datetime = self.timestamp.and_then(time::iso8601);
        }
        if self.address.is_none() {
            self.address = match self.transaction_type {
                Some(TransactionType::Withdrawal) => self.address_to.clone(),
                _ => self.address_to.clone().or_else(|| self.address_from.clone()),
            };
        }
        self
    }
}
