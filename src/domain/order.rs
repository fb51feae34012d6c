//! Orders: the canonical snapshot, its status vocabulary and the request
//! used to place one.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use super::fee::Fee;
use super::trade::Trade;
use crate::shared::precise::{div_truncated, DEFAULT_DIV_SCALE};
use crate::shared::{time, Side};

// ─── Status ──────────────────────────────────────────────────────────────────

/// Unified order status. Native statuses with no mapping are kept verbatim
/// in [`OrderStatus::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    Open,
    Closed,
    Canceled,
    Rejected,
    Expired,
    Other(String),
}

impl OrderStatus {
    /// Translate a native status through `table`; unmapped values pass through.
    pub fn from_table(native: &str, table: &[(&str, OrderStatus)]) -> Self {
        table
            .iter()
            .find(|(key, _)| *key == native)
            .map(|(_, status)| status.clone())
            .unwrap_or_else(|| OrderStatus::Other(native.to_string()))
    }

    pub fn as_str(&self) -> &str {
        match self {
            OrderStatus::Open => "open",
            OrderStatus::Closed => "closed",
            OrderStatus::Canceled => "canceled",
            OrderStatus::Rejected => "rejected",
            OrderStatus::Expired => "expired",
            OrderStatus::Other(raw) => raw,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Closed | OrderStatus::Canceled | OrderStatus::Rejected | OrderStatus::Expired
        )
    }
}

impl From<String> for OrderStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "open" => OrderStatus::Open,
            "closed" => OrderStatus::Closed,
            "canceled" => OrderStatus::Canceled,
            "rejected" => OrderStatus::Rejected,
            "expired" => OrderStatus::Expired,
            _ => OrderStatus::Other(value),
        }
    }
}

impl From<OrderStatus> for String {
    fn from(status: OrderStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Order ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub client_order_id: Option<String>,
    pub timestamp: Option<i64>,
    pub datetime: Option<String>,
    pub last_trade_timestamp: Option<i64>,
    pub last_update_timestamp: Option<i64>,
    pub status: Option<OrderStatus>,
    pub symbol: String,
    #[serde(rename = "type")]
    pub order_type: Option<String>,
    pub time_in_force: Option<String>,
    pub post_only: Option<bool>,
    pub side: Option<Side>,
    pub price: Option<Decimal>,
    pub trigger_price: Option<Decimal>,
    pub take_profit_price: Option<Decimal>,
    pub stop_loss_price: Option<Decimal>,
    pub amount: Option<Decimal>,
    pub filled: Option<Decimal>,
    pub remaining: Option<Decimal>,
    pub cost: Option<Decimal>,
    pub average: Option<Decimal>,
    pub fee: Option<Fee>,
    pub trades: Vec<Trade>,
    pub reduce_only: Option<bool>,
    pub leverage: Option<Decimal>,
    pub info: Value,
}

impl Order {
    /// Derive the quantities that follow from the reported ones.
    ///
    /// `remaining = amount - filled` and `filled = amount - remaining` only
    /// fill gaps; reported values are never overwritten. `average` needs a
    /// non-zero `filled`.
    pub fn complete(mut self) -> Self {
        if self.remaining.is_none() {
            if let (Some(amount), Some(filled)) = (self.amount, self.filled) {
                self.remaining = amount.checked_sub(filled).map(|r| r.normalize());
            }
        }
        if self.filled.is_none() {
            if let (Some(amount), Some(remaining)) = (self.amount, self.remaining) {
                self.filled = amount.checked_sub(remaining).map(|f| f.normalize());
            }
        }
        if self.average.is_none() {
            if let (Some(cost), Some(filled)) = (self.cost, self.filled) {
                self.average = div_truncated(cost, filled, DEFAULT_DIV_SCALE)
                    .ok()
                    .map(|a| a.normalize());
            }
        }
        if self.cost.is_none() {
            if let (Some(filled), Some(price)) = (self.filled, self.average.or(self.price)) {
                self.cost = filled.checked_mul(price).map(|c| c.normalize());
            }
        }
        self.fee = self.fee.map(Fee::normalized);
        if self.datetime.is_none() {
            self.datetime = self.timestamp.and_then(time::iso8601);
        }
        self
    }
}

// ─── Requests ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Market,
    Limit,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Market => "market",
            OrderType::Limit => "limit",
        }
    }
}

/// Parameters of a new order.
///
/// `params` carries exchange-specific extras (`marginMode`, `postOnly`,
/// `timeInForce`, `cost`, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub symbol: String,
    pub order_type: OrderType,
    pub side: Side,
    pub amount: Decimal,
    pub price: Option<Decimal>,
    pub client_order_id: Option<String>,
    pub params: Map<String, Value>,
}

impl OrderRequest {
    pub fn limit(symbol: &str, side: Side, amount: Decimal, price: Decimal) -> Self {
        Self {
            symbol: symbol.to_string(),
            order_type: OrderType::Limit,
            side,
            amount,
            price: Some(price),
            client_order_id: None,
            params: Map::new(),
        }
    }

    pub fn market(symbol: &str, side: Side, amount: Decimal) -> Self {
        Self {
            symbol: symbol.to_string(),
            order_type: OrderType::Market,
            side,
            amount,
            price: None,
            client_order_id: None,
            params: Map::new(),
        }
    }

    pub fn with_client_order_id(mut self, id: &str) -> Self {
        self.client_order_id = Some(id.to_string());
        self
    }

    pub fn with_param(mut self, key: &str, value: Value) -> Self {
        self.params.insert(key.to_string(), value);
        self
    }

    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.params.get(key)?.as_str()
    }

    pub fn param_bool(&self, key: &str) -> bool {
        self.params.get(key).and_then(Value::as_bool).unwrap_or(false)
    }
}

/// Which orders a listing call should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderFilter {
    Open,
    Closed,
    All,
}
